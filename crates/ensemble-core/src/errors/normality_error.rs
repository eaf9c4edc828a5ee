//! Normality test errors.

use super::error_code::{self, ErrorCode};

/// Errors from a single univariate normality test.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalityError {
    #[error("normality test needs at least {required} samples, got {actual}")]
    TooFewSamples { required: usize, actual: usize },

    #[error("test prepared for {expected} samples, got {actual}")]
    SampleSizeMismatch { expected: usize, actual: usize },

    #[error("sample contains non-finite values")]
    NonFiniteSample,
}

impl ErrorCode for NormalityError {
    fn error_code(&self) -> &'static str {
        error_code::NORMALITY_ERROR
    }
}
