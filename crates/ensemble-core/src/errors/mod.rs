//! Error handling for sub-ensemble decomposition.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod decomposition_error;
pub mod ensemble_error;
pub mod error_code;
pub mod normality_error;
pub mod split_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use decomposition_error::DecompositionError;
pub use ensemble_error::EnsembleError;
pub use error_code::ErrorCode;
pub use normality_error::NormalityError;
pub use split_error::SplitError;
pub use storage_error::StorageError;
