//! Decomposition errors.

use super::error_code::ErrorCode;
use super::{ConfigError, EnsembleError, SplitError, StorageError};

/// Errors that can occur while decomposing or evaluating an ensemble.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum DecompositionError {
    #[error("Ensemble error: {0}")]
    Ensemble(#[from] EnsembleError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ErrorCode for DecompositionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Ensemble(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Split(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}
