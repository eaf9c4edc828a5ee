//! Node repository configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DB_FILENAME, DEFAULT_STORAGE_DIRECTORY};

/// Where node state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Three flat array files per node.
    #[default]
    Files,
    /// One SQLite database with a row per node.
    Sqlite,
    /// Process-local map; nothing survives the run.
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageBackend::Files => "files",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Memory => "memory",
        })
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "files" => Ok(StorageBackend::Files),
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

/// Configuration for the node repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend. Default: files.
    pub backend: Option<StorageBackend>,
    /// Directory holding node files or the database. Default: `subensembles`.
    pub directory: Option<String>,
    /// SQLite file name inside `directory`. Default: `subensembles.db`.
    pub database_file: Option<String>,
}

impl StorageConfig {
    pub fn effective_backend(&self) -> StorageBackend {
        self.backend.unwrap_or_default()
    }

    pub fn effective_directory(&self) -> PathBuf {
        PathBuf::from(
            self.directory
                .as_deref()
                .unwrap_or(DEFAULT_STORAGE_DIRECTORY),
        )
    }

    /// Full path of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.effective_directory().join(
            self.database_file
                .as_deref()
                .unwrap_or(DEFAULT_DB_FILENAME),
        )
    }
}
