//! # ensemble-storage
//!
//! Persistence for decomposition node state behind the
//! [`NodeRepository`](ensemble_core::traits::NodeRepository) trait.
//! Every backend is write-once per node key: storing an existing key is a no-op.

pub mod blob;
pub mod files;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use ensemble_core::config::{StorageBackend, StorageConfig};
use ensemble_core::errors::StorageError;
use ensemble_core::traits::NodeRepository;

pub use files::FileNodeStore;
pub use memory::InMemoryNodeStore;
pub use sqlite::SqliteNodeStore;

/// Open the backend selected by `config`.
pub fn open_repository(config: &StorageConfig) -> Result<Arc<dyn NodeRepository>, StorageError> {
    let repository: Arc<dyn NodeRepository> = match config.effective_backend() {
        StorageBackend::Files => Arc::new(FileNodeStore::open(config.effective_directory())?),
        StorageBackend::Sqlite => {
            let directory = config.effective_directory();
            std::fs::create_dir_all(&directory).map_err(|e| StorageError::Io {
                path: directory.display().to_string(),
                message: e.to_string(),
            })?;
            Arc::new(SqliteNodeStore::open(&config.database_path())?)
        }
        StorageBackend::Memory => Arc::new(InMemoryNodeStore::new()),
    };
    tracing::debug!(backend = repository.backend_name(), "opened node repository");
    Ok(repository)
}
