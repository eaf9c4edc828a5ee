//! Nested per-node evaluation record.

use serde::{Deserialize, Serialize};

/// Evaluation of one node and, recursively, its children.
///
/// Percentages are fractions in `[0, 1]` relative to the root's member and
/// voxel totals; a zero denominator gives 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub member_count: usize,
    pub member_percentage: f64,
    pub voxel_count: usize,
    pub voxel_total_percentage: f64,
    pub normal_voxel_count: usize,
    pub normal_voxel_mask_percentage: f64,
    pub normal_voxel_total_percentage: f64,
    /// Voxels normal here or in both children (cumulatively).
    pub fully_explained_voxel_count: usize,
    pub fully_explained_voxel_percentage: f64,
    /// `normal_voxel_total_percentage * member_percentage`.
    pub explainability: f64,
    /// Own explainability plus both children's totals.
    pub total_explainability: f64,
    pub split_a: ChildEvaluation,
    pub split_b: ChildEvaluation,
}

/// A child slot: either an evaluated node or a neutral placeholder for a
/// missing or unvisited node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildEvaluation {
    Evaluated(Box<EvaluationRecord>),
    Unavailable { total_explainability: f64 },
}

impl ChildEvaluation {
    pub fn unavailable() -> Self {
        ChildEvaluation::Unavailable {
            total_explainability: 0.0,
        }
    }

    pub fn total_explainability(&self) -> f64 {
        match self {
            ChildEvaluation::Evaluated(record) => record.total_explainability,
            ChildEvaluation::Unavailable {
                total_explainability,
            } => *total_explainability,
        }
    }

    pub fn record(&self) -> Option<&EvaluationRecord> {
        match self {
            ChildEvaluation::Evaluated(record) => Some(record.as_ref()),
            ChildEvaluation::Unavailable { .. } => None,
        }
    }
}

impl EvaluationRecord {
    /// Number of evaluated nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(record) = stack.pop() {
            count += 1;
            stack.extend(record.split_a.record());
            stack.extend(record.split_b.record());
        }
        count
    }
}
