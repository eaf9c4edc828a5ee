//! ErrorCode trait: stable machine-readable codes for every error enum.

/// Every error enum implements this to provide a structured code string
/// that report writers and callers can match on.
pub trait ErrorCode {
    /// Returns the error code string (e.g., "STORAGE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const ENSEMBLE_ERROR: &str = "ENSEMBLE_ERROR";
pub const SHAPE_MISMATCH: &str = "SHAPE_MISMATCH";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const CORRUPT_STATE: &str = "CORRUPT_STATE";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const SPLIT_ERROR: &str = "SPLIT_ERROR";
pub const NORMALITY_ERROR: &str = "NORMALITY_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
