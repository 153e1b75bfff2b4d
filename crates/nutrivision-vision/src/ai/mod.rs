//! Inference backend abstraction and prompt material

pub mod backend_impl;
pub mod prompts;

use async_trait::async_trait;
use nutrivision_types::{ImagePayload, InvocationError, Technique};

/// Everything one inference call needs
#[derive(Debug, Clone)]
pub struct InferenceRequest<'a> {
    pub technique: Technique,
    pub model: &'a str,
    pub api_key: &'a str,
    pub image: &'a ImagePayload,
    /// Fixed user-turn instruction
    pub prompt: &'a str,
    /// Technique-specific steering directive
    pub system_instruction: &'a str,
    pub response_schema: &'a serde_json::Value,
    pub temperature: f32,
}

/// A multimodal service that answers with structured JSON text.
///
/// `Ok(None)` means the service answered but produced no structured payload.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(
        &self,
        request: &InferenceRequest<'_>,
    ) -> Result<Option<String>, InvocationError>;
}
