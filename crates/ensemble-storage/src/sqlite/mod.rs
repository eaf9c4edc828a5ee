//! SQLite-backed node repository: one row per node in `node_state`.

pub mod migrations;
pub mod pragmas;

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use ensemble_core::errors::StorageError;
use ensemble_core::traits::{NodeRepository, StoreOutcome};
use ensemble_core::types::{MemberSet, NodeKey, NodeState};
use rusqlite::{params, Connection, OptionalExtension};

use self::pragmas::apply_pragmas;
use crate::blob;

fn sqlite_error(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

/// Node repository over a single serialized SQLite connection.
pub struct SqliteNodeStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteNodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteNodeStore")
            .field("path", &self.path)
            .finish()
    }
}

impl SqliteNodeStore {
    /// Open a database at the given path, apply pragmas, run migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(sqlite_error)?;
        apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(sqlite_error)?;
        apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of persisted nodes.
    pub fn node_count(&self) -> Result<usize, StorageError> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM node_state", [], |row| row.get(0))
                .map_err(sqlite_error)?;
            Ok(count as usize)
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        f(&guard)
    }
}

impl NodeRepository for SqliteNodeStore {
    fn contains(&self, key: &NodeKey) -> Result<bool, StorageError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM node_state WHERE node_key = ?1)",
                params![key.to_string()],
                |row| row.get(0),
            )
            .map_err(sqlite_error)
        })
    }

    fn load(&self, key: &NodeKey) -> Result<Option<NodeState>, StorageError> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT indices, mask, p_values FROM node_state WHERE node_key = ?1",
                params![key.to_string()],
                |row| {
                    Ok((
                        row.get::<_, Vec<u8>>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(sqlite_error)
        })?;

        let Some((indices, mask, p_values)) = row else {
            return Ok(None);
        };
        let corrupt = |message: String| StorageError::CorruptState {
            key: key.to_string(),
            message,
        };
        let indices = blob::decode_indices(&indices).map_err(|e| corrupt(e.to_string()))?;
        let mask = blob::decode_mask(&mask).map_err(|e| corrupt(e.to_string()))?;
        let p_values = blob::decode_field(&p_values).map_err(|e| corrupt(e.to_string()))?;
        let state = NodeState::new(MemberSet::new(indices), mask, p_values)
            .map_err(|e| corrupt(e.to_string()))?;
        Ok(Some(state))
    }

    fn store(&self, key: &NodeKey, state: &NodeState) -> Result<StoreOutcome, StorageError> {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let indices = blob::encode_indices(state.members.indices());
        let mask = blob::encode_mask(&state.mask);
        let p_values = blob::encode_field(&state.p_values);

        let changed = self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO node_state
                 (node_key, depth, member_count, indices, mask, p_values, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    key.to_string(),
                    key.depth() as i64,
                    state.members.len() as i64,
                    indices,
                    mask,
                    p_values,
                    created_at,
                ],
            )
            .map_err(sqlite_error)
        })?;

        if changed == 0 {
            Ok(StoreOutcome::AlreadyPresent)
        } else {
            tracing::debug!(key = %key, "stored node row");
            Ok(StoreOutcome::Written)
        }
    }

    fn backend_name(&self) -> &str {
        "sqlite"
    }
}
