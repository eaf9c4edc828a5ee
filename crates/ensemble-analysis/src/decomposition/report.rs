//! Summary of one decomposition run.

use ensemble_core::events::types::LeafReason;
use serde::Serialize;

/// Counts for one visited node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub key: String,
    pub depth: usize,
    pub member_count: usize,
    pub mask_voxel_count: usize,
    pub normal_voxel_count: usize,
    pub remaining_voxel_count: usize,
    /// Loaded from the repository instead of computed.
    pub cached: bool,
    /// Set when the node was not split.
    pub leaf: Option<LeafReason>,
}

/// Pre-order node summaries plus run totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecompositionReport {
    pub splitter: String,
    pub total_member_count: usize,
    pub total_voxel_count: usize,
    pub nodes: Vec<NodeSummary>,
    /// Nodes whose p-values were computed in this run.
    pub computed: usize,
    /// Nodes loaded from the repository.
    pub cached: usize,
    /// Splitter invocations.
    pub splits_performed: usize,
    /// Internal nodes whose children were both already persisted.
    pub splits_reused: usize,
    pub duration_ms: u64,
}

impl DecompositionReport {
    pub fn leaves(&self) -> impl Iterator<Item = &NodeSummary> {
        self.nodes.iter().filter(|n| n.leaf.is_some())
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn node(&self, key: &str) -> Option<&NodeSummary> {
        self.nodes.iter().find(|n| n.key == key)
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// True when nothing was computed or split in this run.
    pub fn fully_cached(&self) -> bool {
        self.computed == 0 && self.splits_performed == 0
    }
}
