//! Side-by-side comparison of completed techniques

use super::orchestrator::AggregateState;
use nutrivision_types::{MacroNutrients, Technique};
use serde::Serialize;

/// One macro nutrient across techniques
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroComparisonRow {
    pub subject: &'static str,
    /// Scale maximum for charting
    pub full_mark: f64,
    pub values: Vec<TechniqueValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TechniqueValue {
    pub technique: Technique,
    pub value: f64,
}

impl MacroComparisonRow {
    pub fn value(&self, technique: Technique) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.technique == technique)
            .map(|v| v.value)
    }

    /// Max minus min across techniques (0 with fewer than two values)
    pub fn spread(&self) -> f64 {
        let min = self.values.iter().map(|v| v.value).fold(f64::INFINITY, f64::min);
        let max = self.values.iter().map(|v| v.value).fold(f64::NEG_INFINITY, f64::max);
        if self.values.len() < 2 {
            0.0
        } else {
            max - min
        }
    }
}

/// Latency and confidence of one completed technique
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRow {
    pub technique: Technique,
    pub name: &'static str,
    pub processing_time_ms: u64,
    pub confidence_score: f64,
}

fn calories(m: &MacroNutrients) -> f64 {
    m.calories
}

fn protein(m: &MacroNutrients) -> f64 {
    m.protein
}

fn carbs(m: &MacroNutrients) -> f64 {
    m.carbs
}

fn fat(m: &MacroNutrients) -> f64 {
    m.fat
}

/// (subject, full mark, accessor)
const MACRO_METRICS: [(&str, f64, fn(&MacroNutrients) -> f64); 4] = [
    ("Calories (kcal)", 1000.0, calories),
    ("Protein (g)", 100.0, protein),
    ("Carbs (g)", 100.0, carbs),
    ("Fat (g)", 100.0, fat),
];

/// Macro rows for every technique that has data; empty when none has
pub fn macro_comparison(state: &AggregateState) -> Vec<MacroComparisonRow> {
    if state.completed().next().is_none() {
        return Vec::new();
    }

    MACRO_METRICS
        .iter()
        .map(|&(subject, full_mark, pick)| MacroComparisonRow {
            subject,
            full_mark,
            values: state
                .completed()
                .map(|(technique, data)| TechniqueValue {
                    technique,
                    value: pick(&data.macros),
                })
                .collect(),
        })
        .collect()
}

pub fn performance_comparison(state: &AggregateState) -> Vec<PerformanceRow> {
    state
        .completed()
        .map(|(technique, data)| PerformanceRow {
            technique,
            name: technique.name(),
            processing_time_ms: data.processing_time_ms,
            confidence_score: data.confidence_score,
        })
        .collect()
}
