//! Event payload types.

use serde::Serialize;

/// Why a decomposition node was not split further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafReason {
    /// Fewer members than the configured split floor.
    TooFewMembers,
    /// Every active voxel is already normal.
    FullyExplained,
    /// The configured maximum depth was reached.
    MaxDepth,
}

/// Payload for `on_node_started`.
#[derive(Debug, Clone)]
pub struct NodeStartedEvent {
    pub key: String,
    pub depth: usize,
    pub member_count: usize,
}

/// Payload for `on_normality_progress`.
#[derive(Debug, Clone)]
pub struct NormalityProgressEvent {
    pub processed: usize,
    pub total: usize,
}

/// Per-node counts, emitted once a node's state is available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummaryEvent {
    pub key: String,
    pub depth: usize,
    pub member_count: usize,
    pub total_member_count: usize,
    pub mask_voxel_count: usize,
    pub total_voxel_count: usize,
    pub normal_voxel_count: usize,
    pub remaining_voxel_count: usize,
    /// True when the state was loaded instead of computed.
    pub cached: bool,
}

/// Payload for `on_split_progress`.
#[derive(Debug, Clone)]
pub struct SplitProgressEvent {
    pub splitter: String,
    pub completed: usize,
    pub total: usize,
}

/// Payload for `on_split_completed`.
#[derive(Debug, Clone)]
pub struct SplitCompletedEvent {
    pub key: String,
    pub splitter: String,
    pub first_count: usize,
    pub second_count: usize,
    /// True when both children were already persisted and the splitter was skipped.
    pub reused: bool,
}

/// Payload for `on_leaf`.
#[derive(Debug, Clone)]
pub struct LeafEvent {
    pub key: String,
    pub reason: LeafReason,
}

/// Payload for `on_decomposition_complete`.
#[derive(Debug, Clone)]
pub struct DecompositionCompleteEvent {
    pub splitter: String,
    pub computed: usize,
    pub cached: usize,
    pub leaves: usize,
    pub duration_ms: u64,
}
