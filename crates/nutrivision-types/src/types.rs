//! Result types for nutritional estimation

use crate::technique::Technique;
use serde::{Deserialize, Serialize};

/// Macro nutrient estimate (calories in kcal, the rest in grams)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroNutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroNutrients {
    /// Name and value of each field, in display order
    pub fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
        ]
    }
}

/// Output of one successful invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub food_name: String,
    pub portion_estimate: String,
    pub macros: MacroNutrients,
    /// Model-reported confidence, expected 0-100 (not clamped)
    pub confidence_score: f64,
    pub reasoning: String,
    /// Round-trip latency measured locally
    pub processing_time_ms: u64,
}

/// Lifecycle of one technique's cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechniqueStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Per-technique cell of the aggregate state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueResult {
    pub technique: Technique,
    pub technique_name: String,
    pub technique_description: String,
    pub data: Option<AnalysisResult>,
    pub loading: bool,
    pub error: Option<String>,
}

impl TechniqueResult {
    pub fn idle(technique: Technique) -> Self {
        let config = technique.config();
        Self {
            technique,
            technique_name: config.name.to_string(),
            technique_description: config.description.to_string(),
            data: None,
            loading: false,
            error: None,
        }
    }

    pub fn loading(technique: Technique) -> Self {
        Self {
            loading: true,
            ..Self::idle(technique)
        }
    }

    pub fn succeeded(technique: Technique, data: AnalysisResult) -> Self {
        Self {
            data: Some(data),
            ..Self::idle(technique)
        }
    }

    pub fn failed(technique: Technique, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::idle(technique)
        }
    }

    pub fn status(&self) -> TechniqueStatus {
        if self.loading {
            TechniqueStatus::Loading
        } else if self.error.is_some() {
            TechniqueStatus::Error
        } else if self.data.is_some() {
            TechniqueStatus::Success
        } else {
            TechniqueStatus::Idle
        }
    }
}
