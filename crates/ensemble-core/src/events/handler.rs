//! EnsembleEventHandler trait with no-op defaults.

use super::types::*;

/// Trait for observing a decomposition.
///
/// All methods have no-op default implementations, so handlers only need to
/// override the events they care about.
pub trait EnsembleEventHandler: Send + Sync {
    // ---- Nodes ----
    fn on_node_started(&self, _event: &NodeStartedEvent) {}
    fn on_node_computed(&self, _event: &NodeSummaryEvent) {}
    fn on_node_cached(&self, _event: &NodeSummaryEvent) {}
    fn on_leaf(&self, _event: &LeafEvent) {}

    // ---- Long-running work ----
    fn on_normality_progress(&self, _event: &NormalityProgressEvent) {}
    fn on_split_progress(&self, _event: &SplitProgressEvent) {}
    fn on_split_completed(&self, _event: &SplitCompletedEvent) {}

    // ---- Run ----
    fn on_decomposition_complete(&self, _event: &DecompositionCompleteEvent) {}
}
