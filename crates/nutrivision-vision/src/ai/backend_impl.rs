//! Gemini `generateContent` backend over HTTPS
//!
//! Sends the image inline (base64) with the technique's system instruction and
//! asks for `application/json` output constrained by the response schema.

use super::{InferenceBackend, InferenceRequest};
use async_trait::async_trait;
use nutrivision_types::InvocationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on error body text carried into messages
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        data: &'a str,
    },
    Text(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a serde_json::Value,
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Inference backend talking to the Gemini REST API
pub struct GeminiBackend {
    http_client: reqwest::Client,
    api_base: String,
}

impl GeminiBackend {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, InvocationError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                InvocationError::Transport(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            api_base: api_base.into(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    async fn generate(
        &self,
        request: &InferenceRequest<'_>,
    ) -> Result<Option<String>, InvocationError> {
        let body = build_request_body(request);
        let url = self.endpoint(request.model);
        debug!(technique = %request.technique, %url, "posting generateContent");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", request.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvocationError::Transport(format!("request timed out: {}", e))
                } else {
                    InvocationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| InvocationError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(
                technique = %request.technique,
                status = status.as_u16(),
                "inference service rejected request"
            );
            return Err(InvocationError::Service {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            InvocationError::MalformedResponse(format!("unexpected response envelope: {}", e))
        })?;

        Ok(extract_text(parsed))
    }
}

fn build_request_body<'a>(request: &'a InferenceRequest<'a>) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part::Text(request.system_instruction)],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![
                Part::InlineData {
                    mime_type: request.image.mime_type(),
                    data: request.image.data(),
                },
                Part::Text(request.prompt),
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: request.response_schema,
            temperature: request.temperature,
        },
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !envelope.error.message.is_empty() {
            return envelope.error.message;
        }
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}
