//! # History Repository Service
//!
//! Implements [`HistoryRepository`] on top of the three indices and the
//! notarization reconciler.
//!
//! ## Recording a block
//!
//! 1. Index `header hash -> epoch` (failure aborts the block)
//! 2. For every non-peer miniblock:
//!    - hash it, index `miniblock hash -> epoch`
//!    - persist its metadata in the epoch partition
//!    - index `tx hash -> miniblock hash` for each transaction
//! 3. Run one reconciliation pass
//!
//! A failing miniblock is logged and skipped; the rest of the block is still
//! indexed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{
    BodyHandle, HeaderHandle, HistoryError, HistoryStats, Miniblock, MiniblockMetadata,
    MiniblockType, NotarizationTarget, NotarizedNotification, ShardId, METACHAIN_SHARD_ID,
};
use crate::ports::inbound::HistoryRepository;
use crate::ports::outbound::{BlockTracker, Hasher, Marshaller, Storer};
use crate::service::epoch_index::EpochByHashIndex;
use crate::service::metadata_store::{MiniblockHashByTxHashIndex, MiniblockMetadataStore};
use crate::service::reconciler::NotarizationReconciler;

/// Everything needed to build a [`HistoryRepositoryService`].
pub struct HistoryRepositoryArguments {
    pub self_shard_id: ShardId,
    pub miniblocks_metadata_storer: Arc<dyn Storer>,
    pub miniblock_hash_by_tx_hash_storer: Arc<dyn Storer>,
    pub epoch_by_hash_storer: Arc<dyn Storer>,
    pub marshaller: Arc<dyn Marshaller>,
    pub hasher: Arc<dyn Hasher>,
}

#[derive(Default)]
struct RecordCounters {
    blocks_recorded: AtomicU64,
    miniblocks_recorded: AtomicU64,
    peer_miniblocks_skipped: AtomicU64,
    miniblocks_failed: AtomicU64,
    tx_index_failures: AtomicU64,
}

pub struct HistoryRepositoryService {
    self_shard_id: ShardId,
    metadata: Arc<MiniblockMetadataStore>,
    tx_index: MiniblockHashByTxHashIndex,
    marshaller: Arc<dyn Marshaller>,
    hasher: Arc<dyn Hasher>,
    reconciler: Arc<NotarizationReconciler>,
    counters: RecordCounters,
}

impl HistoryRepositoryService {
    pub fn new(args: HistoryRepositoryArguments) -> Self {
        let epoch_index = EpochByHashIndex::new(args.epoch_by_hash_storer, args.marshaller.clone());
        let metadata = Arc::new(MiniblockMetadataStore::new(
            args.miniblocks_metadata_storer,
            epoch_index,
            args.marshaller.clone(),
        ));
        let reconciler = Arc::new(NotarizationReconciler::new(args.self_shard_id, metadata.clone()));

        Self {
            self_shard_id: args.self_shard_id,
            metadata,
            tx_index: MiniblockHashByTxHashIndex::new(args.miniblock_hash_by_tx_hash_storer),
            marshaller: args.marshaller,
            hasher: args.hasher,
            reconciler,
            counters: RecordCounters::default(),
        }
    }

    pub fn reconciler(&self) -> &Arc<NotarizationReconciler> {
        &self.reconciler
    }

    /// Content hash of a miniblock: `hasher(marshal(miniblock))`.
    pub fn compute_miniblock_hash(&self, miniblock: &Miniblock) -> Result<Vec<u8>, HistoryError> {
        let bytes = self.marshaller.marshal_miniblock(miniblock)?;
        Ok(self.hasher.compute(&bytes))
    }

    fn record_miniblock(
        &self,
        header_hash: &[u8],
        header: &HeaderHandle,
        miniblock: &Miniblock,
        epoch: u32,
    ) -> Result<(), HistoryError> {
        let miniblock_hash = self.compute_miniblock_hash(miniblock)?;

        self.metadata
            .epoch_index()
            .save_epoch_by_hash(&miniblock_hash, epoch)
            .map_err(|e| HistoryError::CannotSaveEpochByHash {
                kind: "miniblock",
                hash: hex::encode(&miniblock_hash),
                source: Box::new(e),
            })?;

        let metadata = MiniblockMetadata {
            miniblock_type: miniblock.miniblock_type.as_i32(),
            epoch,
            header_hash: header_hash.to_vec(),
            miniblock_hash: miniblock_hash.clone(),
            round: header.round(),
            header_nonce: header.nonce(),
            source_shard_id: miniblock.sender_shard_id,
            destination_shard_id: miniblock.receiver_shard_id,
            ..Default::default()
        };

        // The block tracker never reports metachain blocks to the metachain
        // itself, so a miniblock towards meta is settled here, by the block
        // that carries it.
        if self.self_shard_id == METACHAIN_SHARD_ID
            && miniblock.receiver_shard_id == METACHAIN_SHARD_ID
        {
            self.reconciler.enqueue(
                NotarizationTarget::Both,
                miniblock_hash.clone(),
                NotarizedNotification {
                    meta_nonce: header.nonce(),
                    meta_hash: header_hash.to_vec(),
                },
            );
        }

        self.metadata.put(&miniblock_hash, &metadata)?;

        for tx_hash in &miniblock.tx_hashes {
            if let Err(err) = self.tx_index.put(tx_hash, &miniblock_hash) {
                self.counters.tx_index_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "[qc-03] Cannot index tx {} -> miniblock {}: {}",
                    hex::encode(tx_hash),
                    hex::encode(&miniblock_hash),
                    err
                );
            }
        }

        Ok(())
    }
}

impl HistoryRepository for HistoryRepositoryService {
    fn record_block(
        &self,
        header_hash: &[u8],
        header: &HeaderHandle,
        body: &BodyHandle,
    ) -> Result<(), HistoryError> {
        let body = body.as_block_body().ok_or(HistoryError::CannotCastToBlockBody)?;
        let epoch = header.epoch();

        self.metadata
            .epoch_index()
            .save_epoch_by_hash(header_hash, epoch)
            .map_err(|e| HistoryError::CannotSaveEpochByHash {
                kind: "block header",
                hash: hex::encode(header_hash),
                source: Box::new(e),
            })?;

        debug!(
            "[qc-03] Recording block {} nonce={} epoch={} miniblocks={}",
            hex::encode(header_hash),
            header.nonce(),
            epoch,
            body.miniblocks.len()
        );

        for miniblock in &body.miniblocks {
            if miniblock.miniblock_type == MiniblockType::Peer {
                self.counters.peer_miniblocks_skipped.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            match self.record_miniblock(header_hash, header, miniblock, epoch) {
                Ok(()) => {
                    self.counters.miniblocks_recorded.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    self.counters.miniblocks_failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "[qc-03] Skipping miniblock [{} -> {}] of block {}: {}",
                        miniblock.sender_shard_id,
                        miniblock.receiver_shard_id,
                        hex::encode(header_hash),
                        err
                    );
                }
            }
        }

        self.reconciler.consume_pending_notifications();
        self.counters.blocks_recorded.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    fn get_miniblock_metadata_by_tx_hash(
        &self,
        tx_hash: &[u8],
    ) -> Result<MiniblockMetadata, HistoryError> {
        let miniblock_hash = self.tx_index.get(tx_hash)?;
        self.metadata.get_by_miniblock_hash(&miniblock_hash)
    }

    fn get_miniblock_metadata_by_miniblock_hash(
        &self,
        miniblock_hash: &[u8],
    ) -> Result<MiniblockMetadata, HistoryError> {
        self.metadata.get_by_miniblock_hash(miniblock_hash)
    }

    fn get_epoch_by_hash(&self, hash: &[u8]) -> Result<u32, HistoryError> {
        self.metadata.epoch_index().get_epoch_by_hash(hash)
    }

    fn register_to_block_tracker(&self, tracker: &dyn BlockTracker) {
        tracker.register_cross_notarized_headers_handler(self.reconciler.handler());
        tracker.register_self_notarized_headers_handler(self.reconciler.handler());
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn stats(&self) -> HistoryStats {
        let pending = self.reconciler.pending_counts();
        HistoryStats {
            blocks_recorded: self.counters.blocks_recorded.load(Ordering::Relaxed),
            miniblocks_recorded: self.counters.miniblocks_recorded.load(Ordering::Relaxed),
            peer_miniblocks_skipped: self.counters.peer_miniblocks_skipped.load(Ordering::Relaxed),
            miniblocks_failed: self.counters.miniblocks_failed.load(Ordering::Relaxed),
            tx_index_failures: self.counters.tx_index_failures.load(Ordering::Relaxed),
            notifications_applied: self.reconciler.notifications_applied(),
            pending_source: pending.source,
            pending_destination: pending.destination,
            pending_both: pending.both,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{BincodeMarshaller, InMemoryStorer, Sha3Hasher};
    use crate::domain::{Body, MetaBlock, ShardHeader, StoreError};
    use crate::ports::outbound::NotarizedHeadersHandler;
    use parking_lot::Mutex;

    struct Fixture {
        repo: HistoryRepositoryService,
        tx_storer: Arc<InMemoryStorer>,
        epoch_storer: Arc<InMemoryStorer>,
    }

    fn make_repo(self_shard: ShardId) -> Fixture {
        let tx_storer = Arc::new(InMemoryStorer::new());
        let epoch_storer = Arc::new(InMemoryStorer::new());
        let repo = HistoryRepositoryService::new(HistoryRepositoryArguments {
            self_shard_id: self_shard,
            miniblocks_metadata_storer: Arc::new(InMemoryStorer::new()),
            miniblock_hash_by_tx_hash_storer: tx_storer.clone(),
            epoch_by_hash_storer: epoch_storer.clone(),
            marshaller: Arc::new(BincodeMarshaller),
            hasher: Arc::new(Sha3Hasher),
        });
        Fixture {
            repo,
            tx_storer,
            epoch_storer,
        }
    }

    fn miniblock(kind: MiniblockType, sender: ShardId, receiver: ShardId, txs: &[&[u8]]) -> Miniblock {
        Miniblock {
            tx_hashes: txs.iter().map(|tx| tx.to_vec()).collect(),
            sender_shard_id: sender,
            receiver_shard_id: receiver,
            miniblock_type: kind,
        }
    }

    fn shard_block(nonce: u64, epoch: u32) -> HeaderHandle {
        HeaderHandle::Shard(ShardHeader {
            nonce,
            round: nonce * 2,
            epoch,
            shard_id: 0,
            miniblock_headers: vec![],
        })
    }

    #[test]
    fn test_record_block_indexes_header_miniblocks_and_txs() {
        let fx = make_repo(0);
        let mb = miniblock(MiniblockType::Tx, 0, 1, &[b"tx-1", b"tx-2"]);
        let mb_hash = fx.repo.compute_miniblock_hash(&mb).unwrap();
        let body = BodyHandle::from(Body { miniblocks: vec![mb] });

        fx.repo.record_block(b"header", &shard_block(5, 2), &body).unwrap();

        assert_eq!(fx.repo.get_epoch_by_hash(b"header").unwrap(), 2);
        assert_eq!(fx.repo.get_epoch_by_hash(&mb_hash).unwrap(), 2);

        let metadata = fx.repo.get_miniblock_metadata_by_tx_hash(b"tx-2").unwrap();
        assert_eq!(metadata.miniblock_hash, mb_hash);
        assert_eq!(metadata.header_hash, b"header".to_vec());
        assert_eq!(metadata.header_nonce, 5);
        assert_eq!(metadata.round, 10);
        assert_eq!(metadata.epoch, 2);
        assert_eq!(metadata.source_shard_id, 0);
        assert_eq!(metadata.destination_shard_id, 1);
        assert_eq!(metadata.miniblock_type, MiniblockType::Tx.as_i32());
        assert!(!metadata.is_notarized_at_source());
        assert!(!metadata.is_notarized_at_destination());

        let stats = fx.repo.stats();
        assert_eq!(stats.blocks_recorded, 1);
        assert_eq!(stats.miniblocks_recorded, 1);
    }

    #[test]
    fn test_opaque_body_is_rejected() {
        let fx = make_repo(0);
        let err = fx
            .repo
            .record_block(b"header", &shard_block(1, 1), &BodyHandle::Opaque(vec![1, 2, 3]))
            .unwrap_err();

        assert!(matches!(err, HistoryError::CannotCastToBlockBody));
        assert!(fx.epoch_storer.is_empty());
    }

    #[test]
    fn test_peer_miniblocks_are_skipped() {
        let fx = make_repo(0);
        let body = BodyHandle::from(Body {
            miniblocks: vec![miniblock(MiniblockType::Peer, 0, 0, &[b"peer-tx"])],
        });

        fx.repo.record_block(b"header", &shard_block(1, 1), &body).unwrap();

        // Only the header itself is indexed.
        assert_eq!(fx.epoch_storer.len(), 1);
        assert!(fx.tx_storer.is_empty());
        assert!(fx.repo.get_miniblock_metadata_by_tx_hash(b"peer-tx").unwrap_err().is_not_found());
        assert_eq!(fx.repo.stats().peer_miniblocks_skipped, 1);
    }

    #[test]
    fn test_empty_body_still_indexes_header() {
        let fx = make_repo(0);
        fx.repo
            .record_block(b"header", &shard_block(3, 4), &BodyHandle::from(Body::default()))
            .unwrap();

        assert_eq!(fx.repo.get_epoch_by_hash(b"header").unwrap(), 4);
    }

    #[test]
    fn test_metachain_self_notarizes_miniblocks_towards_meta() {
        let fx = make_repo(METACHAIN_SHARD_ID);
        let mb = miniblock(MiniblockType::Tx, METACHAIN_SHARD_ID, METACHAIN_SHARD_ID, &[b"tx"]);
        let header = HeaderHandle::Meta(MetaBlock {
            nonce: 42,
            round: 43,
            epoch: 1,
            shard_info: vec![],
        });

        fx.repo
            .record_block(b"meta-42", &header, &BodyHandle::from(Body { miniblocks: vec![mb] }))
            .unwrap();

        let metadata = fx.repo.get_miniblock_metadata_by_tx_hash(b"tx").unwrap();
        assert_eq!(metadata.notarized_at_source_in_meta_nonce, 42);
        assert_eq!(metadata.notarized_at_source_in_meta_hash, b"meta-42".to_vec());
        assert_eq!(metadata.notarized_at_destination_in_meta_nonce, 42);
        assert_eq!(metadata.notarized_at_destination_in_meta_hash, b"meta-42".to_vec());
        assert_eq!(fx.repo.stats().pending_total(), 0);
    }

    #[test]
    fn test_shard_node_does_not_self_notarize() {
        let fx = make_repo(0);
        let mb = miniblock(MiniblockType::Tx, 0, METACHAIN_SHARD_ID, &[b"tx"]);

        fx.repo
            .record_block(b"header", &shard_block(1, 1), &BodyHandle::from(Body { miniblocks: vec![mb] }))
            .unwrap();

        let metadata = fx.repo.get_miniblock_metadata_by_tx_hash(b"tx").unwrap();
        assert!(!metadata.is_notarized_at_source());
        assert!(!metadata.is_notarized_at_destination());
    }

    struct FailingStorer;

    impl Storer for FailingStorer {
        fn put(&self, _: &[u8], _: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Io("disk full".into()))
        }
        fn put_in_epoch(&self, _: &[u8], _: &[u8], _: u32) -> Result<(), StoreError> {
            Err(StoreError::Io("disk full".into()))
        }
        fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::key_not_found(key))
        }
        fn get_from_epoch(&self, key: &[u8], _: u32) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::key_not_found(key))
        }
    }

    #[test]
    fn test_header_epoch_failure_aborts_block() {
        let repo = HistoryRepositoryService::new(HistoryRepositoryArguments {
            self_shard_id: 0,
            miniblocks_metadata_storer: Arc::new(InMemoryStorer::new()),
            miniblock_hash_by_tx_hash_storer: Arc::new(InMemoryStorer::new()),
            epoch_by_hash_storer: Arc::new(FailingStorer),
            marshaller: Arc::new(BincodeMarshaller),
            hasher: Arc::new(Sha3Hasher),
        });
        let body = BodyHandle::from(Body {
            miniblocks: vec![miniblock(MiniblockType::Tx, 0, 1, &[b"tx"])],
        });

        let err = repo.record_block(b"header", &shard_block(1, 1), &body).unwrap_err();

        assert!(matches!(
            err,
            HistoryError::CannotSaveEpochByHash { kind: "block header", .. }
        ));
        assert_eq!(repo.stats().blocks_recorded, 0);
    }

    #[test]
    fn test_tx_index_failure_keeps_miniblock_metadata() {
        let repo = HistoryRepositoryService::new(HistoryRepositoryArguments {
            self_shard_id: 0,
            miniblocks_metadata_storer: Arc::new(InMemoryStorer::new()),
            miniblock_hash_by_tx_hash_storer: Arc::new(FailingStorer),
            epoch_by_hash_storer: Arc::new(InMemoryStorer::new()),
            marshaller: Arc::new(BincodeMarshaller),
            hasher: Arc::new(Sha3Hasher),
        });
        let mb = miniblock(MiniblockType::Tx, 0, 1, &[b"tx-1", b"tx-2"]);
        let mb_hash = repo.compute_miniblock_hash(&mb).unwrap();

        repo.record_block(b"header", &shard_block(1, 1), &BodyHandle::from(Body { miniblocks: vec![mb] }))
            .unwrap();

        assert!(repo.get_miniblock_metadata_by_miniblock_hash(&mb_hash).is_ok());
        assert!(repo.get_miniblock_metadata_by_tx_hash(b"tx-1").unwrap_err().is_not_found());
        let stats = repo.stats();
        assert_eq!(stats.tx_index_failures, 2);
        assert_eq!(stats.miniblocks_recorded, 1);
    }

    #[test]
    fn test_metadata_failure_skips_miniblock_only() {
        let repo = HistoryRepositoryService::new(HistoryRepositoryArguments {
            self_shard_id: 0,
            miniblocks_metadata_storer: Arc::new(FailingStorer),
            miniblock_hash_by_tx_hash_storer: Arc::new(InMemoryStorer::new()),
            epoch_by_hash_storer: Arc::new(InMemoryStorer::new()),
            marshaller: Arc::new(BincodeMarshaller),
            hasher: Arc::new(Sha3Hasher),
        });
        let body = BodyHandle::from(Body {
            miniblocks: vec![
                miniblock(MiniblockType::Tx, 0, 1, &[b"tx-1"]),
                miniblock(MiniblockType::SmartContractResult, 0, 0, &[b"tx-2"]),
            ],
        });

        repo.record_block(b"header", &shard_block(1, 1), &body).unwrap();

        let stats = repo.stats();
        assert_eq!(stats.blocks_recorded, 1);
        assert_eq!(stats.miniblocks_failed, 2);
        // Tx index is only written after the metadata.
        assert!(repo.get_miniblock_metadata_by_tx_hash(b"tx-1").unwrap_err().is_not_found());
    }

    #[derive(Default)]
    struct RecordingTracker {
        cross: Mutex<Vec<NotarizedHeadersHandler>>,
        own: Mutex<Vec<NotarizedHeadersHandler>>,
    }

    impl BlockTracker for RecordingTracker {
        fn register_cross_notarized_headers_handler(&self, handler: NotarizedHeadersHandler) {
            self.cross.lock().push(handler);
        }
        fn register_self_notarized_headers_handler(&self, handler: NotarizedHeadersHandler) {
            self.own.lock().push(handler);
        }
    }

    #[test]
    fn test_register_to_block_tracker_subscribes_both_events() {
        let fx = make_repo(0);
        let tracker = RecordingTracker::default();

        fx.repo.register_to_block_tracker(&tracker);

        assert_eq!(tracker.cross.lock().len(), 1);
        assert_eq!(tracker.own.lock().len(), 1);
        assert!(fx.repo.is_enabled());
    }
}
