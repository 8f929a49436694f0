//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the History Lookup subsystem requires from the host node:
//! the three logical storers, a codec, a hash function and the block tracker
//! that raises notarization events.

use std::sync::Arc;

use crate::domain::{
    EpochByHash, HeaderHandle, HistoryError, Miniblock, MiniblockMetadata, ShardId, StorageUnit,
    StoreError,
};

/// Key-value storer, optionally partitioned by epoch.
///
/// Production: the node's epoch-partitioned persister.
/// Testing: [`InMemoryStorer`](crate::adapters::InMemoryStorer).
pub trait Storer: Send + Sync {
    /// Put into the current (unpartitioned) space.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Put into the partition of `epoch`.
    fn put_in_epoch(&self, key: &[u8], value: &[u8], epoch: u32) -> Result<(), StoreError>;

    /// Get from the current space.
    ///
    /// Returns [`StoreError::KeyNotFound`] if the key is absent.
    fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError>;

    /// Get from the partition of `epoch` only.
    fn get_from_epoch(&self, key: &[u8], epoch: u32) -> Result<Vec<u8>, StoreError>;
}

/// Access to the node's storers by unit.
pub trait ChainStorer: Send + Sync {
    fn get_storer(&self, unit: StorageUnit) -> Result<Arc<dyn Storer>, StoreError>;
}

/// Codec for every value this subsystem hashes or persists.
///
/// The miniblock encoding MUST be canonical: the miniblock hash is computed
/// over it.
pub trait Marshaller: Send + Sync {
    fn marshal_miniblock(&self, miniblock: &Miniblock) -> Result<Vec<u8>, HistoryError>;

    fn marshal_metadata(&self, metadata: &MiniblockMetadata) -> Result<Vec<u8>, HistoryError>;

    fn unmarshal_metadata(&self, data: &[u8]) -> Result<MiniblockMetadata, HistoryError>;

    fn marshal_epoch(&self, value: &EpochByHash) -> Result<Vec<u8>, HistoryError>;

    fn unmarshal_epoch(&self, data: &[u8]) -> Result<EpochByHash, HistoryError>;
}

/// Hash function of the surrounding system.
pub trait Hasher: Send + Sync {
    fn compute(&self, data: &[u8]) -> Vec<u8>;
}

/// Callback invoked by the block tracker with `(shard_id, headers, header_hashes)`.
pub type NotarizedHeadersHandler = Arc<dyn Fn(ShardId, &[HeaderHandle], &[Vec<u8>]) + Send + Sync>;

/// Component that tracks notarized headers and notifies subscribers.
pub trait BlockTracker: Send + Sync {
    /// Headers of other shards notarized by the metachain.
    fn register_cross_notarized_headers_handler(&self, handler: NotarizedHeadersHandler);

    /// Headers of this node's own shard notarized by the metachain.
    fn register_self_notarized_headers_handler(&self, handler: NotarizedHeadersHandler);
}
