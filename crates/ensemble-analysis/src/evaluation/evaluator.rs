//! Bottom-up evaluation of a persisted sub-ensemble tree.

use std::collections::HashMap;
use std::sync::Arc;

use ensemble_core::constants::DEFAULT_SIGNIFICANCE;
use ensemble_core::errors::DecompositionError;
use ensemble_core::traits::NodeRepository;
use ensemble_core::types::{Branch, NodeKey, NodeState, VoxelMask};
use serde::Serialize;

use super::record::{ChildEvaluation, EvaluationRecord};

/// Cumulative normality mask and record of an evaluated node.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub cumulative_normality: VoxelMask,
    pub record: EvaluationRecord,
}

/// One point of the explainability curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub max_level: usize,
    /// Size of a full binary tree with `max_level + 1` levels.
    pub sub_ensemble_count: usize,
    pub total_explainability: f64,
}

struct Visit {
    key: NodeKey,
    level: usize,
    state: Option<NodeState>,
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Reads persisted node states and scores how much of the grid the tree
/// explains.
pub struct Evaluator {
    repository: Arc<dyn NodeRepository>,
    significance: f64,
}

impl Evaluator {
    pub fn new(repository: Arc<dyn NodeRepository>, significance: f64) -> Self {
        Self {
            repository,
            significance,
        }
    }

    pub fn with_default_significance(repository: Arc<dyn NodeRepository>) -> Self {
        Self::new(repository, DEFAULT_SIGNIFICANCE)
    }

    /// Evaluate the tree stored under `namespace`, descending into children
    /// only while `level < max_level`. Returns `None` when no root is stored.
    pub fn evaluate(
        &self,
        namespace: &str,
        max_level: usize,
    ) -> Result<Option<Evaluation>, DecompositionError> {
        let Some(root) = self.repository.load(&NodeKey::root())? else {
            return Ok(None);
        };
        let total_members = root.members.len();
        let total_voxels = root.mask.count();

        // Pre-order collection; missing children are kept as empty visits.
        let mut visits: Vec<Visit> = Vec::new();
        let mut stack = vec![Visit {
            key: NodeKey::root(),
            level: 0,
            state: Some(root),
        }];
        while let Some(visit) = stack.pop() {
            if visit.state.is_some() && visit.level < max_level {
                for branch in [Branch::Second, Branch::First] {
                    let key = visit.key.child(namespace, branch);
                    let state = self.repository.load(&key)?;
                    stack.push(Visit {
                        key,
                        level: visit.level + 1,
                        state,
                    });
                }
            }
            visits.push(visit);
        }

        // Children always follow their parent, so reverse order sees them first.
        let mut done: HashMap<NodeKey, Evaluation> = HashMap::new();
        for visit in visits.into_iter().rev() {
            let Some(state) = visit.state else {
                continue;
            };
            let first = done.remove(&visit.key.child(namespace, Branch::First));
            let second = done.remove(&visit.key.child(namespace, Branch::Second));
            let evaluation = self.evaluate_node(&state, first, second, total_members, total_voxels)?;
            done.insert(visit.key, evaluation);
        }

        Ok(done.remove(&NodeKey::root()))
    }

    fn evaluate_node(
        &self,
        state: &NodeState,
        first: Option<Evaluation>,
        second: Option<Evaluation>,
        total_members: usize,
        total_voxels: usize,
    ) -> Result<Evaluation, DecompositionError> {
        let shape = state.mask.shape();
        let normal = state.normal_mask(self.significance)?;

        let (first_mask, split_a) = match first {
            Some(e) => (e.cumulative_normality, ChildEvaluation::Evaluated(Box::new(e.record))),
            None => (VoxelMask::empty(shape), ChildEvaluation::unavailable()),
        };
        let (second_mask, split_b) = match second {
            Some(e) => (e.cumulative_normality, ChildEvaluation::Evaluated(Box::new(e.record))),
            None => (VoxelMask::empty(shape), ChildEvaluation::unavailable()),
        };
        let cumulative = normal.or(&first_mask.and(&second_mask)?)?;

        let member_count = state.members.len();
        let voxel_count = state.mask.count();
        let normal_count = normal.count();
        let fully_explained = cumulative.count();
        let member_percentage = ratio(member_count, total_members);
        let normal_voxel_total_percentage = ratio(normal_count, total_voxels);
        let explainability = normal_voxel_total_percentage * member_percentage;
        let total_explainability =
            explainability + split_a.total_explainability() + split_b.total_explainability();

        Ok(Evaluation {
            cumulative_normality: cumulative,
            record: EvaluationRecord {
                member_count,
                member_percentage,
                voxel_count,
                voxel_total_percentage: ratio(voxel_count, total_voxels),
                normal_voxel_count: normal_count,
                normal_voxel_mask_percentage: ratio(normal_count, voxel_count),
                normal_voxel_total_percentage,
                fully_explained_voxel_count: fully_explained,
                fully_explained_voxel_percentage: ratio(fully_explained, total_voxels),
                explainability,
                total_explainability,
                split_a,
                split_b,
            },
        })
    }

    /// Total explainability at each of `levels`.
    pub fn explainability_curve(
        &self,
        namespace: &str,
        levels: impl IntoIterator<Item = usize>,
    ) -> Result<Vec<CurvePoint>, DecompositionError> {
        let mut points = Vec::new();
        for max_level in levels {
            let total = self
                .evaluate(namespace, max_level)?
                .map_or(0.0, |e| e.record.total_explainability);
            let sub_ensemble_count = u32::try_from(max_level + 1)
                .ok()
                .and_then(|shift| 1usize.checked_shl(shift))
                .map_or(usize::MAX, |n| n - 1);
            points.push(CurvePoint {
                max_level,
                sub_ensemble_count,
                total_explainability: total,
            });
        }
        Ok(points)
    }
}
