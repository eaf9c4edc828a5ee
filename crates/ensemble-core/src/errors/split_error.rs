//! Ensemble splitter errors.

use super::error_code::{self, ErrorCode};
use super::EnsembleError;

/// Errors raised by ensemble splitters.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("{splitter} needs at least {required} members, got {actual}")]
    TooFewMembers {
        splitter: String,
        required: usize,
        actual: usize,
    },

    #[error("{splitter} received an empty voxel mask")]
    EmptyMask { splitter: String },

    #[error("{splitter} returned {actual} assignments for {expected} members")]
    AssignmentLength {
        splitter: String,
        expected: usize,
        actual: usize,
    },

    #[error("clustering failed: {reason}")]
    ClusteringFailed { reason: String },

    #[error("ensemble error while splitting: {0}")]
    Ensemble(#[from] EnsembleError),
}

impl ErrorCode for SplitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Ensemble(e) => e.error_code(),
            _ => error_code::SPLIT_ERROR,
        }
    }
}
