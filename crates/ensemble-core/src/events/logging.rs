//! Handler that forwards decomposition events to `tracing`.

use tracing::{debug, info};

use super::handler::EnsembleEventHandler;
use super::types::*;

/// Logs node summaries at `info` and progress at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventHandler;

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

impl LoggingEventHandler {
    fn log_summary(event: &NodeSummaryEvent) {
        info!(
            key = %event.key,
            cached = event.cached,
            members = event.member_count,
            members_pct = format_args!("{:.1}", percent(event.member_count, event.total_member_count)),
            voxels = event.mask_voxel_count,
            voxels_pct = format_args!("{:.1}", percent(event.mask_voxel_count, event.total_voxel_count)),
            normal = event.normal_voxel_count,
            normal_pct = format_args!("{:.1}", percent(event.normal_voxel_count, event.mask_voxel_count)),
            remaining = event.remaining_voxel_count,
            "node ready"
        );
    }
}

impl EnsembleEventHandler for LoggingEventHandler {
    fn on_node_started(&self, event: &NodeStartedEvent) {
        debug!(key = %event.key, depth = event.depth, members = event.member_count, "node started");
    }

    fn on_node_computed(&self, event: &NodeSummaryEvent) {
        Self::log_summary(event);
    }

    fn on_node_cached(&self, event: &NodeSummaryEvent) {
        Self::log_summary(event);
    }

    fn on_leaf(&self, event: &LeafEvent) {
        debug!(key = %event.key, reason = ?event.reason, "leaf");
    }

    fn on_normality_progress(&self, event: &NormalityProgressEvent) {
        debug!(processed = event.processed, total = event.total, "normality progress");
    }

    fn on_split_progress(&self, event: &SplitProgressEvent) {
        debug!(
            splitter = %event.splitter,
            completed = event.completed,
            total = event.total,
            "split progress"
        );
    }

    fn on_split_completed(&self, event: &SplitCompletedEvent) {
        info!(
            key = %event.key,
            splitter = %event.splitter,
            first = event.first_count,
            second = event.second_count,
            reused = event.reused,
            "split complete"
        );
    }

    fn on_decomposition_complete(&self, event: &DecompositionCompleteEvent) {
        info!(
            splitter = %event.splitter,
            computed = event.computed,
            cached = event.cached,
            leaves = event.leaves,
            duration_ms = event.duration_ms,
            "decomposition complete"
        );
    }
}
