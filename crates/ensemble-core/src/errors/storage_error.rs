//! Node repository errors.

use super::error_code::{self, ErrorCode};

/// Errors raised by node repository backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("blob encoding error: {message}")]
    Encoding { message: String },

    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("corrupt state for node {key}: {message}")]
    CorruptState { key: String, message: String },

    #[error("repository lock poisoned")]
    LockPoisoned,
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::CorruptState { .. } | Self::Encoding { .. } => error_code::CORRUPT_STATE,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
