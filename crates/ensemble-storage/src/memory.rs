//! In-process node repository for tests and throwaway runs.

use std::collections::HashMap;
use std::sync::Mutex;

use ensemble_core::errors::StorageError;
use ensemble_core::traits::{NodeRepository, StoreOutcome};
use ensemble_core::types::{NodeKey, NodeState};

#[derive(Debug, Default)]
pub struct InMemoryNodeStore {
    nodes: Mutex<HashMap<NodeKey, NodeState>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.lock().map(|nodes| nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys, rendered and sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .nodes
            .lock()
            .map(|nodes| nodes.keys().map(ToString::to_string).collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl NodeRepository for InMemoryNodeStore {
    fn contains(&self, key: &NodeKey) -> Result<bool, StorageError> {
        let nodes = self.nodes.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(nodes.contains_key(key))
    }

    fn load(&self, key: &NodeKey) -> Result<Option<NodeState>, StorageError> {
        let nodes = self.nodes.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(nodes.get(key).cloned())
    }

    fn store(&self, key: &NodeKey, state: &NodeState) -> Result<StoreOutcome, StorageError> {
        let mut nodes = self.nodes.lock().map_err(|_| StorageError::LockPoisoned)?;
        if nodes.contains_key(key) {
            return Ok(StoreOutcome::AlreadyPresent);
        }
        nodes.insert(key.clone(), state.clone());
        Ok(StoreOutcome::Written)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_core::types::{GridShape, MemberSet, NormalityField, VoxelMask};

    fn state(members: Vec<usize>) -> NodeState {
        let shape = GridShape::new([2, 1, 1]).unwrap();
        NodeState::new(
            MemberSet::new(members),
            VoxelMask::full(shape),
            NormalityField::filled(shape, 0.5),
        )
        .unwrap()
    }

    #[test]
    fn second_store_keeps_first_state() {
        let store = InMemoryNodeStore::new();
        let key = NodeKey::root();
        assert_eq!(store.store(&key, &state(vec![0, 1])).unwrap(), StoreOutcome::Written);
        assert_eq!(store.store(&key, &state(vec![9])).unwrap(), StoreOutcome::AlreadyPresent);
        assert_eq!(store.load(&key).unwrap().unwrap().members.indices(), &[0, 1]);
        assert_eq!(store.len(), 1);
    }
}
