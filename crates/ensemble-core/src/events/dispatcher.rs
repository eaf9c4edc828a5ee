//! EventDispatcher: synchronous event dispatch with zero overhead when empty.

use std::sync::Arc;

use super::handler::EnsembleEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
///
/// When no handlers are registered, `emit` iterates over an empty Vec.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EnsembleEventHandler>>,
}

impl EventDispatcher {
    /// Create a new empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn EnsembleEventHandler>) {
        self.handlers.push(handler);
    }

    /// Builder-style [`EventDispatcher::register`].
    pub fn with_handler(mut self, handler: Arc<dyn EnsembleEventHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// Handlers that panic are caught and do not prevent subsequent handlers
    /// from receiving the event.
    fn emit<F: Fn(&dyn EnsembleEventHandler)>(&self, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!("event handler panicked; continuing with remaining handlers");
            }
        }
    }

    // ---- Nodes ----
    pub fn emit_node_started(&self, event: &NodeStartedEvent) {
        self.emit(|h| h.on_node_started(event));
    }

    pub fn emit_node_computed(&self, event: &NodeSummaryEvent) {
        self.emit(|h| h.on_node_computed(event));
    }

    pub fn emit_node_cached(&self, event: &NodeSummaryEvent) {
        self.emit(|h| h.on_node_cached(event));
    }

    pub fn emit_leaf(&self, event: &LeafEvent) {
        self.emit(|h| h.on_leaf(event));
    }

    // ---- Long-running work ----
    pub fn emit_normality_progress(&self, event: &NormalityProgressEvent) {
        self.emit(|h| h.on_normality_progress(event));
    }

    pub fn emit_split_progress(&self, event: &SplitProgressEvent) {
        self.emit(|h| h.on_split_progress(event));
    }

    pub fn emit_split_completed(&self, event: &SplitCompletedEvent) {
        self.emit(|h| h.on_split_completed(event));
    }

    // ---- Run ----
    pub fn emit_decomposition_complete(&self, event: &DecompositionCompleteEvent) {
        self.emit(|h| h.on_decomposition_complete(event));
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
