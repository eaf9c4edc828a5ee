//! Decompose and evaluate with every configured splitter.

use std::path::PathBuf;
use std::sync::Arc;

use ensemble_core::config::{EnsembleConfig, SplitterKind};
use ensemble_core::errors::DecompositionError;
use ensemble_core::events::{EventDispatcher, LoggingEventHandler};
use ensemble_core::traits::NodeRepository;
use ensemble_core::types::{EnsembleStack, VoxelMask};

use crate::decomposition::{DecompositionReport, Decomposer};
use crate::evaluation::{write_report, EvaluationRecord, Evaluator};
use crate::splitting::build_splitter;

/// Outcome for one splitter.
#[derive(Debug, Clone)]
pub struct SplitterRun {
    pub splitter: SplitterKind,
    pub decomposition: DecompositionReport,
    pub evaluation: Option<EvaluationRecord>,
    /// Set when a report was written.
    pub report_path: Option<PathBuf>,
}

/// Runs each configured splitter over the same stack and mask, sharing the
/// root node, then evaluates each namespace.
///
/// Events go to a [`LoggingEventHandler`] unless replaced with
/// [`DecompositionPipeline::with_events`].
pub struct DecompositionPipeline {
    config: EnsembleConfig,
    repository: Arc<dyn NodeRepository>,
    events: EventDispatcher,
}

impl DecompositionPipeline {
    pub fn new(config: EnsembleConfig, repository: Arc<dyn NodeRepository>) -> Self {
        Self {
            config,
            repository,
            events: EventDispatcher::new().with_handler(Arc::new(LoggingEventHandler)),
        }
    }

    /// Validate `config` and open its storage backend.
    pub fn from_config(config: EnsembleConfig) -> Result<Self, DecompositionError> {
        EnsembleConfig::validate(&config)?;
        let repository = ensemble_storage::open_repository(&config.storage)?;
        Ok(Self::new(config, repository))
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn NodeRepository> {
        &self.repository
    }

    pub fn run(
        &self,
        stack: &EnsembleStack,
        mask: &VoxelMask,
    ) -> Result<Vec<SplitterRun>, DecompositionError> {
        let decomposer = Decomposer::new(Arc::clone(&self.repository), &self.config.decomposition)
            .with_events(self.events.clone());
        let evaluator = Evaluator::new(
            Arc::clone(&self.repository),
            self.config.decomposition.effective_significance(),
        );
        let max_level = self.config.evaluation.effective_max_level();
        let write_reports = self.config.evaluation.effective_write_reports();
        let report_directory = self.config.report_directory();

        let mut runs = Vec::new();
        for kind in self.config.decomposition.effective_splitters() {
            let splitter = build_splitter(kind, &self.config);
            tracing::info!(splitter = %kind, backend = self.repository.backend_name(), "decomposing");
            let decomposition = decomposer.decompose(stack, mask, splitter.as_ref())?;

            let evaluation = evaluator
                .evaluate(kind.identifier(), max_level)?
                .map(|e| e.record);
            let report_path = match (&evaluation, write_reports) {
                (Some(record), true) => {
                    Some(write_report(&report_directory, kind.identifier(), record)?)
                }
                _ => None,
            };
            if let Some(record) = &evaluation {
                tracing::info!(
                    splitter = %kind,
                    total_explainability = record.total_explainability,
                    "evaluation complete"
                );
            }

            runs.push(SplitterRun {
                splitter: kind,
                decomposition,
                evaluation,
                report_path,
            });
        }
        Ok(runs)
    }
}
