//! Ensemble bipartition strategies.

use crate::errors::SplitError;
use crate::events::EventDispatcher;
use crate::types::{EnsembleView, VoxelMask};

/// Splits a node's members into two groups.
///
/// Implementations return one entry per member of `ensemble`: `false` for the
/// first group, `true` for the second. Both groups are expected to be
/// non-empty, but callers must tolerate a one-sided assignment.
pub trait EnsembleSplitter: Send + Sync {
    /// Stable identifier, also used as the storage namespace.
    fn identifier(&self) -> &str;

    /// Partition `ensemble` using only the voxels active in `mask`.
    fn split(
        &self,
        ensemble: &EnsembleView<'_>,
        mask: &VoxelMask,
        events: &EventDispatcher,
    ) -> Result<Vec<bool>, SplitError>;
}
