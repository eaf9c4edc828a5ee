//! Member split along the per-voxel value ranking.

use ensemble_core::config::EnsembleConfig;
use ensemble_core::constants::{DEFAULT_RANKING_MIN_SIDE_MEMBERS, RANKING_IDENTIFIER};
use ensemble_core::errors::SplitError;
use ensemble_core::events::types::SplitProgressEvent;
use ensemble_core::events::EventDispatcher;
use ensemble_core::traits::EnsembleSplitter;
use ensemble_core::types::{EnsembleView, VoxelMask};

use super::check_inputs;
use crate::normality::NormalityTester;

/// Sum over active voxels of each member's position in the ascending value
/// order at that voxel. Equal values keep member order.
pub fn rank_totals(ensemble: &EnsembleView<'_>, mask: &VoxelMask) -> Vec<u64> {
    let n = ensemble.member_count();
    let mut totals = vec![0u64; n];
    let mut order: Vec<usize> = Vec::with_capacity(n);
    for voxel in mask.active_voxels() {
        order.clear();
        order.extend(0..n);
        order.sort_by(|&a, &b| ensemble.value(a, voxel).total_cmp(&ensemble.value(b, voxel)));
        for (position, &member) in order.iter().enumerate() {
            totals[member] += position as u64;
        }
    }
    totals
}

/// Local member indices sorted by ascending total rank (stable).
pub fn rank_order(totals: &[u64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by_key(|&i| totals[i]);
    order
}

/// Best split point `i` of a sequence of `len` items into `[..i]` and `[i..]`
/// with at least `min_side` items on each side.
///
/// Returns the split with the highest score and that score; ties keep the
/// earliest split. `None` when no split satisfies `min_side`.
pub fn best_contiguous_split<E>(
    len: usize,
    min_side: usize,
    mut score: impl FnMut(usize) -> Result<u64, E>,
) -> Result<Option<(usize, u64)>, E> {
    if min_side == 0 || len < 2 * min_side {
        return Ok(None);
    }
    let mut best: Option<(usize, u64)> = None;
    for split in min_side..=len - min_side {
        let value = score(split)?;
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((split, value));
        }
    }
    Ok(best)
}

/// Orders members by total rank and cuts the order where the two sides
/// together have the most normal voxels.
///
/// A candidate cut at `i` scores `normal(first) * i + normal(second) * (n - i)`.
#[derive(Debug, Clone, Copy)]
pub struct RankSplitter {
    min_side_members: usize,
    tester: NormalityTester,
}

impl Default for RankSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_RANKING_MIN_SIDE_MEMBERS, NormalityTester::default())
    }
}

impl RankSplitter {
    pub fn new(min_side_members: usize, tester: NormalityTester) -> Self {
        Self {
            min_side_members,
            tester,
        }
    }

    pub fn from_config(config: &EnsembleConfig) -> Self {
        Self::new(
            config.ranking.effective_min_side_members(),
            NormalityTester::new(config.decomposition.effective_significance()),
        )
    }
}

impl EnsembleSplitter for RankSplitter {
    fn identifier(&self) -> &str {
        RANKING_IDENTIFIER
    }

    fn split(
        &self,
        ensemble: &EnsembleView<'_>,
        mask: &VoxelMask,
        events: &EventDispatcher,
    ) -> Result<Vec<bool>, SplitError> {
        let min_side = self.min_side_members.max(1);
        check_inputs(self.identifier(), ensemble, mask, 2 * min_side)?;

        let n = ensemble.member_count();
        let order = rank_order(&rank_totals(ensemble, mask));
        let global: Vec<usize> = order.iter().map(|&local| ensemble.members()[local]).collect();
        let stack = ensemble.stack();
        let candidates = n - 2 * min_side + 1;

        let best = best_contiguous_split(n, min_side, |split| -> Result<u64, SplitError> {
            let first = stack.view(&global[..split])?;
            let second = stack.view(&global[split..])?;
            let normal_first = self.tester.normal_count(&first, mask)?;
            let normal_second = self.tester.normal_count(&second, mask)?;
            events.emit_split_progress(&SplitProgressEvent {
                splitter: RANKING_IDENTIFIER.to_string(),
                completed: split - min_side + 1,
                total: candidates,
            });
            Ok((normal_first * split + normal_second * (n - split)) as u64)
        })?;

        let (cut, score) = best.ok_or_else(|| SplitError::TooFewMembers {
            splitter: RANKING_IDENTIFIER.to_string(),
            required: 2 * min_side,
            actual: n,
        })?;
        tracing::debug!(cut, score, members = n, "rank split chosen");

        let mut assignment = vec![false; n];
        for &local in &order[cut..] {
            assignment[local] = true;
        }
        Ok(assignment)
    }
}
