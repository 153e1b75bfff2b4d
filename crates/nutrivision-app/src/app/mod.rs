//! Use cases: multi-technique orchestration and result comparison

pub mod comparison;
pub mod orchestrator;

pub use comparison::{macro_comparison, performance_comparison, MacroComparisonRow, PerformanceRow};
pub use orchestrator::{AggregateState, Orchestrator};
