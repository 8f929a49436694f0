//! # Miniblock Metadata Store and Tx -> Miniblock Index
//!
//! Metadata records are written into the partition of the epoch they
//! carry. Reads go through the epoch index to find that partition.

use std::sync::Arc;

use crate::domain::{HistoryError, MiniblockMetadata, StoreError};
use crate::ports::outbound::{Marshaller, Storer};
use crate::service::epoch_index::EpochByHashIndex;

/// Epoch-partitioned `miniblock hash -> MiniblockMetadata`.
pub struct MiniblockMetadataStore {
    storer: Arc<dyn Storer>,
    epoch_index: EpochByHashIndex,
    marshaller: Arc<dyn Marshaller>,
}

impl MiniblockMetadataStore {
    pub fn new(
        storer: Arc<dyn Storer>,
        epoch_index: EpochByHashIndex,
        marshaller: Arc<dyn Marshaller>,
    ) -> Self {
        Self {
            storer,
            epoch_index,
            marshaller,
        }
    }

    pub fn epoch_index(&self) -> &EpochByHashIndex {
        &self.epoch_index
    }

    /// Write (or overwrite) the record in the partition of `metadata.epoch`.
    pub fn put(&self, miniblock_hash: &[u8], metadata: &MiniblockMetadata) -> Result<(), HistoryError> {
        let bytes = self.marshaller.marshal_metadata(metadata)?;
        self.storer
            .put_in_epoch(miniblock_hash, &bytes, metadata.epoch)
            .map_err(|source| HistoryError::CannotSaveMiniblockMetadata {
                hash: hex::encode(miniblock_hash),
                source,
            })
    }

    pub fn get_by_miniblock_hash(&self, miniblock_hash: &[u8]) -> Result<MiniblockMetadata, HistoryError> {
        let epoch = self.epoch_index.get_epoch_by_hash(miniblock_hash)?;
        let bytes = self
            .storer
            .get_from_epoch(miniblock_hash, epoch)
            .map_err(|e| HistoryError::from_store_read("miniblock metadata", miniblock_hash, e))?;
        self.marshaller.unmarshal_metadata(&bytes)
    }
}

/// `tx hash -> miniblock hash`; values are the raw miniblock hash bytes.
pub struct MiniblockHashByTxHashIndex {
    storer: Arc<dyn Storer>,
}

impl MiniblockHashByTxHashIndex {
    pub fn new(storer: Arc<dyn Storer>) -> Self {
        Self { storer }
    }

    pub fn put(&self, tx_hash: &[u8], miniblock_hash: &[u8]) -> Result<(), StoreError> {
        self.storer.put(tx_hash, miniblock_hash)
    }

    pub fn get(&self, tx_hash: &[u8]) -> Result<Vec<u8>, HistoryError> {
        self.storer
            .get(tx_hash)
            .map_err(|e| HistoryError::from_store_read("miniblock hash by tx hash", tx_hash, e))
    }
}
