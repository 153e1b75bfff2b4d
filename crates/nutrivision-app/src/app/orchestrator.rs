//! Orchestrator - fans one image out to every technique and owns the results
//!
//! The orchestrator is the only writer of [`AggregateState`]. Each technique
//! runs as its own task; completions come back over a channel and are applied
//! one at a time by [`Orchestrator::next_update`]. Every submission bumps a
//! generation counter, and completions carrying an older generation are
//! dropped, so a slow call for a replaced image can never overwrite the
//! results of the current one. In-flight calls are not cancelled.

use nutrivision_types::{
    AnalysisResult, Error, ImagePayload, Result, Technique, TechniqueResult,
};
use nutrivision_vision::Analyzer;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Per-technique results plus the image being analyzed
#[derive(Debug, Clone)]
pub struct AggregateState {
    results: Vec<TechniqueResult>,
    current_image: Option<Arc<ImagePayload>>,
    is_analyzing: bool,
}

impl AggregateState {
    /// All techniques idle, no image
    pub fn new() -> Self {
        Self {
            results: Technique::ALL.into_iter().map(TechniqueResult::idle).collect(),
            current_image: None,
            is_analyzing: false,
        }
    }

    /// One entry per technique, in catalog order
    pub fn results(&self) -> &[TechniqueResult] {
        &self.results
    }

    pub fn get(&self, technique: Technique) -> &TechniqueResult {
        &self.results[self.position(technique)]
    }

    pub fn current_image(&self) -> Option<&ImagePayload> {
        self.current_image.as_deref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.is_analyzing
    }

    /// Techniques that finished with data
    pub fn completed(&self) -> impl Iterator<Item = (Technique, &AnalysisResult)> {
        self.results
            .iter()
            .filter_map(|r| r.data.as_ref().map(|data| (r.technique, data)))
    }

    fn position(&self, technique: Technique) -> usize {
        // Entries are created from the catalog and never removed
        self.results
            .iter()
            .position(|r| r.technique == technique)
            .unwrap_or(technique as usize)
    }

    fn reset_idle(&mut self) {
        *self = Self::new();
    }

    fn begin(&mut self, image: Arc<ImagePayload>) {
        for cell in &mut self.results {
            *cell = TechniqueResult::loading(cell.technique);
        }
        self.current_image = Some(image);
        self.is_analyzing = true;
    }

    pub(crate) fn replace(&mut self, cell: TechniqueResult) {
        let index = self.position(cell.technique);
        self.results[index] = cell;
    }
}

impl Default for AggregateState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one spawned invocation
struct Completion {
    generation: u64,
    technique: Technique,
    outcome: Result<AnalysisResult>,
}

/// Runs every technique against the submitted image
pub struct Orchestrator {
    analyzer: Arc<Analyzer>,
    state: AggregateState,
    generation: u64,
    pending: HashSet<Technique>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Orchestrator {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            analyzer,
            state: AggregateState::new(),
            generation: 0,
            pending: HashSet::new(),
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    /// Number of submissions so far (including clears)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Select, replace or clear the image.
    ///
    /// `None` resets everything to idle. `Some` resets every technique to
    /// loading, then spawns one invocation per technique. The reset is
    /// visible as soon as this returns. Must be called within a Tokio runtime.
    pub fn submit_image(&mut self, image: Option<ImagePayload>) {
        self.generation += 1;
        self.pending.clear();

        let Some(image) = image else {
            debug!(generation = self.generation, "image cleared");
            self.state.reset_idle();
            return;
        };

        let image = Arc::new(image);
        self.state.begin(Arc::clone(&image));

        info!(
            generation = self.generation,
            mime_type = image.mime_type(),
            techniques = Technique::ALL.len(),
            "dispatching techniques"
        );

        for technique in Technique::ALL {
            self.pending.insert(technique);

            let analyzer = Arc::clone(&self.analyzer);
            let image = Arc::clone(&image);
            let tx = self.tx.clone();
            let generation = self.generation;

            tokio::spawn(async move {
                let invocation =
                    tokio::spawn(async move { analyzer.invoke(&image, technique).await });
                // A panicking invocation still resolves its technique
                let outcome = match invocation.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(%technique, error = %e, "analysis task aborted");
                        Err(Error::Task(e.to_string()))
                    }
                };
                // Send fails only once the orchestrator is gone
                let _ = tx.send(Completion {
                    generation,
                    technique,
                    outcome,
                });
            });
        }
    }

    /// Apply the next completion of the current generation.
    ///
    /// Returns the technique whose entry changed, or `None` when nothing is
    /// pending. Completions from superseded submissions are discarded.
    pub async fn next_update(&mut self) -> Option<Technique> {
        while !self.pending.is_empty() {
            let completion = self.rx.recv().await?;

            if completion.generation != self.generation {
                debug!(
                    technique = %completion.technique,
                    stale = completion.generation,
                    current = self.generation,
                    "discarding stale result"
                );
                continue;
            }
            if !self.pending.remove(&completion.technique) {
                continue;
            }

            let technique = completion.technique;
            let cell = match completion.outcome {
                Ok(data) => TechniqueResult::succeeded(technique, data),
                Err(e) => TechniqueResult::failed(technique, e.to_string()),
            };
            self.state.replace(cell);

            if self.pending.is_empty() {
                self.state.is_analyzing = false;
                info!(generation = self.generation, "all techniques resolved");
            }
            return Some(technique);
        }
        None
    }

    /// Wait until every technique of the current submission has resolved
    pub async fn run_to_completion(&mut self) {
        while self.next_update().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutrivision_types::MacroNutrients;

    fn sample(technique: Technique) -> AnalysisResult {
        AnalysisResult {
            food_name: format!("{} food", technique),
            portion_estimate: "1 plate".to_string(),
            macros: MacroNutrients::default(),
            confidence_score: 50.0,
            reasoning: String::new(),
            processing_time_ms: 1,
        }
    }

    #[test]
    fn test_new_state_is_idle_in_catalog_order() {
        let state = AggregateState::new();
        let order: Vec<_> = state.results().iter().map(|r| r.technique).collect();
        assert_eq!(order, Technique::ALL);
        assert!(!state.is_analyzing());
        assert!(state.current_image().is_none());
    }

    #[test]
    fn test_replace_is_keyed_by_technique() {
        let mut state = AggregateState::new();
        state.replace(TechniqueResult::succeeded(
            Technique::HealthOptimized,
            sample(Technique::HealthOptimized),
        ));
        state.replace(TechniqueResult::failed(Technique::RapidScan, "timeout"));

        assert_eq!(state.results().len(), Technique::ALL.len());
        assert_eq!(state.results()[2].technique, Technique::HealthOptimized);
        assert!(state.get(Technique::HealthOptimized).data.is_some());
        assert_eq!(state.get(Technique::RapidScan).error.as_deref(), Some("timeout"));
        assert_eq!(state.completed().count(), 1);
    }

    #[test]
    fn test_begin_resets_every_entry() {
        let mut state = AggregateState::new();
        state.replace(TechniqueResult::succeeded(
            Technique::DeepAnalysis,
            sample(Technique::DeepAnalysis),
        ));
        state.replace(TechniqueResult::failed(Technique::RapidScan, "boom"));

        let image = ImagePayload::from_bytes("image/png", b"png").unwrap();
        state.begin(Arc::new(image));

        assert!(state.is_analyzing());
        for cell in state.results() {
            assert!(cell.loading && cell.data.is_none() && cell.error.is_none());
        }
    }
}
