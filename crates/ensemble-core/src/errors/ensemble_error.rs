//! Ensemble data-model errors.

use super::error_code::{self, ErrorCode};

/// Errors raised while building or indexing ensemble stacks and masks.
#[derive(Debug, thiserror::Error)]
pub enum EnsembleError {
    #[error("ensemble has no members")]
    EmptyEnsemble,

    #[error("grid extents must be non-zero, got {dims:?}")]
    EmptyGrid { dims: [usize; 3] },

    #[error("member {member} has {actual} voxels, grid expects {expected}")]
    MemberLength {
        member: usize,
        expected: usize,
        actual: usize,
    },

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        actual: [usize; 3],
    },

    #[error("field has {actual} values, grid expects {expected}")]
    FieldLength { expected: usize, actual: usize },

    #[error("member index {index} out of range for ensemble of {member_count}")]
    MemberOutOfRange { index: usize, member_count: usize },
}

impl ErrorCode for EnsembleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ShapeMismatch { .. } | Self::FieldLength { .. } => error_code::SHAPE_MISMATCH,
            _ => error_code::ENSEMBLE_ERROR,
        }
    }
}
