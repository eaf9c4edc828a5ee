//! Flat array files on disk, one directory per node.
//!
//! A node `kmeans/A_B` under root `R` owns `R/kmeans/A_B/` holding
//! `indices.bin`, `mask.bin` and `pvalues.bin`. The shared root node lives in
//! `R/root/`. A node directory is staged under a temporary name next to its
//! target and renamed into place once all three files are synced, so a node
//! directory is either absent or complete.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ensemble_core::constants::ROOT_KEY;
use ensemble_core::errors::StorageError;
use ensemble_core::traits::{NodeRepository, StoreOutcome};
use ensemble_core::types::{MemberSet, NodeKey, NodeState};
use tempfile::TempDir;

use crate::blob;

const INDICES_FILE: &str = "indices.bin";
const MASK_FILE: &str = "mask.bin";
const P_VALUES_FILE: &str = "pvalues.bin";
const STAGING_PREFIX: &str = ".staging-";

/// Node repository writing one blob file per node artifact.
#[derive(Debug)]
pub struct FileNodeStore {
    root: PathBuf,
}

struct NodeFiles {
    /// Directory holding the node directory.
    parent: PathBuf,
    directory: PathBuf,
}

impl NodeFiles {
    fn indices(&self) -> PathBuf {
        self.directory.join(INDICES_FILE)
    }

    fn mask(&self) -> PathBuf {
        self.directory.join(MASK_FILE)
    }

    fn p_values(&self) -> PathBuf {
        self.directory.join(P_VALUES_FILE)
    }
}

fn io_error(path: &Path, err: io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

impl FileNodeStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn files_for(&self, key: &NodeKey) -> NodeFiles {
        let (parent, name) = match key.namespace() {
            None => (self.root.clone(), ROOT_KEY.to_string()),
            Some(ns) => (self.root.join(ns), key.path().label()),
        };
        NodeFiles {
            directory: parent.join(name),
            parent,
        }
    }

    fn read_artifact(key: &NodeKey, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::CorruptState {
                    key: key.to_string(),
                    message: format!("p-values present but {} is missing", path.display()),
                }
            } else {
                io_error(path, e)
            }
        })
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let mut file = File::create(path).map_err(|e| io_error(path, e))?;
        file.write_all(bytes).map_err(|e| io_error(path, e))?;
        file.sync_all().map_err(|e| io_error(path, e))
    }

    /// Write all three artifacts into a fresh staging directory under `parent`.
    fn stage(parent: &Path, state: &NodeState) -> Result<TempDir, StorageError> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| io_error(parent, e))?;
        Self::write_synced(
            &staging.path().join(INDICES_FILE),
            &blob::encode_indices(state.members.indices()),
        )?;
        Self::write_synced(&staging.path().join(MASK_FILE), &blob::encode_mask(&state.mask))?;
        Self::write_synced(
            &staging.path().join(P_VALUES_FILE),
            &blob::encode_field(&state.p_values),
        )?;
        Ok(staging)
    }
}

impl NodeRepository for FileNodeStore {
    fn contains(&self, key: &NodeKey) -> Result<bool, StorageError> {
        Ok(self.files_for(key).p_values().is_file())
    }

    fn load(&self, key: &NodeKey) -> Result<Option<NodeState>, StorageError> {
        let files = self.files_for(key);
        let p_values_path = files.p_values();
        let p_value_bytes = match fs::read(&p_values_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&p_values_path, e)),
        };
        let indices = blob::decode_indices(&Self::read_artifact(key, &files.indices())?)?;
        let mask = blob::decode_mask(&Self::read_artifact(key, &files.mask())?)?;
        let p_values = blob::decode_field(&p_value_bytes)?;
        let state = NodeState::new(MemberSet::new(indices), mask, p_values).map_err(|e| {
            StorageError::CorruptState {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Some(state))
    }

    fn store(&self, key: &NodeKey, state: &NodeState) -> Result<StoreOutcome, StorageError> {
        let files = self.files_for(key);
        if files.p_values().is_file() {
            return Ok(StoreOutcome::AlreadyPresent);
        }
        fs::create_dir_all(&files.parent).map_err(|e| io_error(&files.parent, e))?;

        let staging = Self::stage(&files.parent, state)?;
        // Renaming onto an existing node directory fails, so the first
        // complete rename wins and later writers leave it untouched.
        match fs::rename(staging.path(), &files.directory) {
            Ok(()) => {
                tracing::debug!(key = %key, "stored node files");
                Ok(StoreOutcome::Written)
            }
            Err(_) if files.p_values().is_file() => {
                tracing::debug!(key = %key, "node committed by another writer");
                Ok(StoreOutcome::AlreadyPresent)
            }
            Err(e) => Err(io_error(&files.directory, e)),
        }
    }

    fn backend_name(&self) -> &str {
        "files"
    }
}
