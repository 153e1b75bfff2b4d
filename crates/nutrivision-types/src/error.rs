//! Error types for nutrivision

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key is missing (set GEMINI_API_KEY or API_KEY)")]
    MissingApiKey,

    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

/// Failures of a single call to the inference service
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("No data returned from the inference service")]
    EmptyResponse,

    #[error("Malformed response from the inference service: {0}")]
    MalformedResponse(String),

    #[error("Inference request failed: {0}")]
    Transport(String),

    #[error("Inference service returned {status}: {message}")]
    Service { status: u16, message: String },
}

impl InvocationError {
    /// Quota exhaustion is reported by the service as HTTP 429
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, InvocationError::Service { status: 429, .. })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    #[error("Failed to acquire image: {0}")]
    Acquisition(String),

    #[error("Analysis task aborted: {0}")]
    Task(String),
}

impl Error {
    /// True when the error was raised before any request could be sent
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
