//! In-memory storage adapters.
//!
//! Implement the `Storer` and `ChainStorer` ports for tests and for nodes
//! running without a persistent backend. Production wires the node's
//! epoch-partitioned persisters instead.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::domain::{StorageUnit, StoreError};
use crate::ports::outbound::{ChainStorer, Storer};

type Partition = HashMap<Vec<u8>, Vec<u8>>;

/// Epoch-partitioned in-memory storer.
///
/// `put` writes to an unpartitioned space; `put_in_epoch` writes to the
/// partition of that epoch. `get` looks in the unpartitioned space first,
/// then in every epoch partition from newest to oldest.
#[derive(Default)]
pub struct InMemoryStorer {
    unpartitioned: RwLock<Partition>,
    epochs: RwLock<BTreeMap<u32, Partition>>,
}

impl InMemoryStorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys across all partitions.
    pub fn len(&self) -> usize {
        let epochs: usize = self.epochs.read().values().map(HashMap::len).sum();
        self.unpartitioned.read().len() + epochs
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Epochs that hold at least one key.
    pub fn epochs(&self) -> Vec<u32> {
        self.epochs.read().keys().copied().collect()
    }
}

impl Storer for InMemoryStorer {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.unpartitioned
            .write()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put_in_epoch(&self, key: &[u8], value: &[u8], epoch: u32) -> Result<(), StoreError> {
        self.epochs
            .write()
            .entry(epoch)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        if let Some(value) = self.unpartitioned.read().get(key) {
            return Ok(value.clone());
        }

        self.epochs
            .read()
            .values()
            .rev()
            .find_map(|partition| partition.get(key).cloned())
            .ok_or_else(|| StoreError::key_not_found(key))
    }

    fn get_from_epoch(&self, key: &[u8], epoch: u32) -> Result<Vec<u8>, StoreError> {
        self.epochs
            .read()
            .get(&epoch)
            .and_then(|partition| partition.get(key).cloned())
            .ok_or_else(|| StoreError::key_not_found(key))
    }
}

/// Chain storer backed by a map of units to storers.
#[derive(Default)]
pub struct InMemoryChainStorer {
    storers: RwLock<HashMap<StorageUnit, Arc<dyn Storer>>>,
}

impl InMemoryChainStorer {
    /// Empty chain storer: every lookup fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain storer holding a fresh [`InMemoryStorer`] for every unit.
    pub fn with_all_units() -> Self {
        let chain = Self::new();
        for unit in StorageUnit::ALL {
            chain.add_storer(unit, Arc::new(InMemoryStorer::new()));
        }
        chain
    }

    pub fn add_storer(&self, unit: StorageUnit, storer: Arc<dyn Storer>) {
        self.storers.write().insert(unit, storer);
    }
}

impl ChainStorer for InMemoryChainStorer {
    fn get_storer(&self, unit: StorageUnit) -> Result<Arc<dyn Storer>, StoreError> {
        self.storers
            .read()
            .get(&unit)
            .cloned()
            .ok_or(StoreError::MissingUnit(unit))
    }
}
