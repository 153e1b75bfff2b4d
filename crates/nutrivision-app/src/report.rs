//! JSON report of one analysis run

use crate::app::{
    macro_comparison, performance_comparison, AggregateState, MacroComparisonRow, PerformanceRow,
};
use chrono::{DateTime, Utc};
use nutrivision_types::TechniqueResult;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analyzed_at: DateTime<Utc>,
    pub source: String,
    pub model: String,
    pub results: Vec<TechniqueResult>,
    pub macro_comparison: Vec<MacroComparisonRow>,
    pub performance: Vec<PerformanceRow>,
}

impl AnalysisReport {
    /// Snapshot the state as it is now
    pub fn from_state(
        state: &AggregateState,
        source: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            analyzed_at: Utc::now(),
            source: source.into(),
            model: model.into(),
            results: state.results().to_vec(),
            macro_comparison: macro_comparison(state),
            performance: performance_comparison(state),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.data.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }
}
