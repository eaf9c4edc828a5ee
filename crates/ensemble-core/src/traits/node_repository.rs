//! Write-once persistence of decomposition node state.

use crate::errors::StorageError;
use crate::types::{NodeKey, NodeState};

/// Result of a [`NodeRepository::store`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The state was written.
    Written,
    /// State for this key already existed and was left untouched.
    AlreadyPresent,
}

/// Keyed store of node states with skip-if-exists semantics.
///
/// A key is written at most once. `store` on an existing key must not modify
/// the stored state and reports `AlreadyPresent`; this is what makes resumed
/// and concurrent decompositions safe.
pub trait NodeRepository: Send + Sync {
    /// Whether complete state exists for `key`.
    fn contains(&self, key: &NodeKey) -> Result<bool, StorageError>;

    /// Load the state for `key`, or `None` when nothing was persisted.
    fn load(&self, key: &NodeKey) -> Result<Option<NodeState>, StorageError>;

    /// Persist `state` under `key` unless the key already exists.
    fn store(&self, key: &NodeKey, state: &NodeState) -> Result<StoreOutcome, StorageError>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &str;
}
