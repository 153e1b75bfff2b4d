//! Vision module - technique-steered nutritional analysis of food images

pub mod ai;

pub use ai::backend_impl::{GeminiBackend, DEFAULT_API_BASE};
pub use ai::prompts::{response_schema, ANALYSIS_PROMPT};
pub use ai::{InferenceBackend, InferenceRequest};

use nutrivision_types::{
    AnalysisResult, ConfigError, ImagePayload, InvocationError, MacroNutrients, Result, Technique,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Low temperature for more consistent numbers
pub const DEFAULT_TEMPERATURE: f32 = 0.4;

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Analysis invoker: one technique, one image, one inference call
pub struct Analyzer {
    backend: Arc<dyn InferenceBackend>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: AnalyzerConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run one technique against an image.
    ///
    /// Fails with a configuration error before touching the backend when no
    /// API key is configured. Never retries.
    pub async fn invoke(
        &self,
        image: &ImagePayload,
        technique: Technique,
    ) -> Result<AnalysisResult> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey)?;

        let request = InferenceRequest {
            technique,
            model: &self.config.model,
            api_key,
            image,
            prompt: ANALYSIS_PROMPT,
            system_instruction: technique.instruction(),
            response_schema: response_schema(),
            temperature: self.config.temperature,
        };

        info!(%technique, model = %self.config.model, "dispatching analysis");
        let start = Instant::now();
        let outcome = self.backend.generate(&request).await;
        let processing_time_ms = (start.elapsed().as_secs_f64() * 1000.0).round() as u64;

        let result = outcome.and_then(|text| {
            let text = text.filter(|t| !t.trim().is_empty());
            let text = text.as_deref().ok_or(InvocationError::EmptyResponse)?;
            parse_response(text, processing_time_ms)
        });

        match &result {
            Ok(analysis) => info!(
                %technique,
                elapsed_ms = processing_time_ms,
                food = %analysis.food_name,
                "analysis complete"
            ),
            Err(e) if e.is_quota_exhausted() => {
                warn!(%technique, error = %e, "quota exhausted, not retrying")
            }
            Err(e) => {
                warn!(%technique, elapsed_ms = processing_time_ms, error = %e, "analysis failed")
            }
        }

        result.map_err(Into::into)
    }
}

/// Wire shape of the model's answer; every field is required
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    food_name: String,
    portion_estimate: String,
    macros: MacroNutrients,
    confidence_score: f64,
    reasoning: String,
}

/// Parse the structured payload into an [`AnalysisResult`].
///
/// Rejects invalid JSON, missing fields, wrong primitive types, and negative or
/// non-finite numbers. Nothing is repaired.
pub fn parse_response(
    text: &str,
    processing_time_ms: u64,
) -> std::result::Result<AnalysisResult, InvocationError> {
    let parsed: AnalysisResponse =
        serde_json::from_str(text).map_err(|e| InvocationError::MalformedResponse(e.to_string()))?;

    for (field, value) in parsed.macros.fields() {
        if !value.is_finite() || value < 0.0 {
            return Err(InvocationError::MalformedResponse(format!(
                "macros.{} must be a non-negative number, got {}",
                field, value
            )));
        }
    }
    if !parsed.confidence_score.is_finite() {
        return Err(InvocationError::MalformedResponse(
            "confidenceScore must be a finite number".to_string(),
        ));
    }

    Ok(AnalysisResult {
        food_name: parsed.food_name,
        portion_estimate: parsed.portion_estimate,
        macros: parsed.macros,
        confidence_score: parsed.confidence_score,
        reasoning: parsed.reasoning,
        processing_time_ms,
    })
}
