//! # Notarization Reconciler
//!
//! Joins two independent streams into one record:
//!
//! ```text
//! commit path ──record_block──→ [metadata store] ←──patch── reconciler
//!                                                              ↑
//! block tracker ──notarized headers──→ classify ──→ [pending: source | destination | both]
//! ```
//!
//! A notarization may arrive before the miniblock it refers to has been
//! recorded. It then waits in a pending set and is applied on a later pass,
//! after the recorder has persisted the metadata. Both orders converge to the
//! same final record.
//!
//! ## Locking
//!
//! Each pending set has its own lock for inserts. A separate drain lock
//! serialises reconciliation passes so two passes never patch the same
//! record concurrently.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

use crate::domain::{
    HeaderHandle, MiniblockHeader, NotarizationTarget, NotarizedNotification, ShardId,
    METACHAIN_SHARD_ID,
};
use crate::ports::outbound::NotarizedHeadersHandler;
use crate::service::metadata_store::MiniblockMetadataStore;
use crate::service::pending::PendingNotifications;

/// Sizes of the three pending sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCounts {
    pub source: usize,
    pub destination: usize,
    pub both: usize,
}

pub struct NotarizationReconciler {
    self_shard_id: ShardId,
    metadata: Arc<MiniblockMetadataStore>,
    pending_at_source: PendingNotifications,
    pending_at_destination: PendingNotifications,
    pending_at_both: PendingNotifications,
    consume_lock: Mutex<()>,
    notifications_applied: AtomicU64,
}

impl NotarizationReconciler {
    pub fn new(self_shard_id: ShardId, metadata: Arc<MiniblockMetadataStore>) -> Self {
        Self {
            self_shard_id,
            metadata,
            pending_at_source: PendingNotifications::new(NotarizationTarget::Source),
            pending_at_destination: PendingNotifications::new(NotarizationTarget::Destination),
            pending_at_both: PendingNotifications::new(NotarizationTarget::Both),
            consume_lock: Mutex::new(()),
            notifications_applied: AtomicU64::new(0),
        }
    }

    /// Handler to register with a block tracker.
    pub fn handler(self: &Arc<Self>) -> NotarizedHeadersHandler {
        let reconciler = Arc::clone(self);
        Arc::new(
            move |shard_id: ShardId, headers: &[HeaderHandle], hashes: &[Vec<u8>]| {
                reconciler.on_notarized_blocks(shard_id, headers, hashes)
            },
        )
    }

    /// Entry point for notarized headers reported by the block tracker.
    ///
    /// Only batches reported for the metachain carry notarization facts;
    /// everything else is ignored.
    pub fn on_notarized_blocks(&self, shard_id: ShardId, headers: &[HeaderHandle], header_hashes: &[Vec<u8>]) {
        trace!(
            "[qc-03] on_notarized_blocks shard={} headers={}",
            shard_id,
            headers.len()
        );

        if shard_id != METACHAIN_SHARD_ID {
            return;
        }

        if headers.len() != header_hashes.len() {
            error!(
                "[qc-03] Notarized batch has {} headers but {} hashes, extra entries ignored",
                headers.len(),
                header_hashes.len()
            );
        }

        let mut enqueued = 0usize;
        for (header, header_hash) in headers.iter().zip(header_hashes) {
            match header {
                HeaderHandle::Meta(meta) => {
                    for shard_data in &meta.shard_info {
                        for miniblock_header in &shard_data.shard_miniblock_headers {
                            if self.on_notarized_miniblock(meta.nonce, header_hash, shard_data.shard_id, miniblock_header) {
                                enqueued += 1;
                            }
                        }
                    }
                }
                HeaderHandle::Shard(shard_header) => {
                    for miniblock_header in &shard_header.miniblock_headers {
                        if self.on_notarized_miniblock(shard_header.nonce, header_hash, shard_header.shard_id, miniblock_header) {
                            enqueued += 1;
                        }
                    }
                }
            }
        }

        if enqueued > 0 {
            self.consume_pending_notifications();
        }
    }

    fn on_notarized_miniblock(
        &self,
        meta_nonce: u64,
        meta_hash: &[u8],
        containing_shard: ShardId,
        miniblock_header: &MiniblockHeader,
    ) -> bool {
        let Some(target) =
            NotarizationTarget::classify(miniblock_header, containing_shard, self.self_shard_id)
        else {
            return false;
        };

        trace!(
            "[qc-03] Notarized miniblock {} [{} -> {}] in meta nonce {} (containing shard {}, target {})",
            hex::encode(&miniblock_header.hash),
            miniblock_header.sender_shard_id,
            miniblock_header.receiver_shard_id,
            meta_nonce,
            containing_shard,
            target.as_str()
        );

        self.enqueue(
            target,
            miniblock_header.hash.clone(),
            NotarizedNotification {
                meta_nonce,
                meta_hash: meta_hash.to_vec(),
            },
        );
        true
    }

    /// Park a notification until the matching metadata is persisted.
    pub fn enqueue(&self, target: NotarizationTarget, miniblock_hash: Vec<u8>, notification: NotarizedNotification) {
        self.pending_set(target).set(miniblock_hash, notification);
    }

    /// Apply every pending notification whose metadata is already persisted.
    ///
    /// Entries whose metadata is missing stay pending for the next pass.
    pub fn consume_pending_notifications(&self) {
        let _guard = self.consume_lock.lock();

        let before = self.pending_counts();
        debug!(
            "[qc-03] Reconciliation begin: source={} destination={} both={}",
            before.source, before.destination, before.both
        );

        self.consume_set(&self.pending_at_source);
        self.consume_set(&self.pending_at_destination);
        self.consume_set(&self.pending_at_both);

        let after = self.pending_counts();
        debug!(
            "[qc-03] Reconciliation end: source={} destination={} both={}",
            after.source, after.destination, after.both
        );
    }

    fn consume_set(&self, pending: &PendingNotifications) {
        for miniblock_hash in pending.keys() {
            let Some(notification) = pending.get(&miniblock_hash) else {
                continue;
            };

            let mut metadata = match self.metadata.get_by_miniblock_hash(&miniblock_hash) {
                Ok(metadata) => metadata,
                Err(err) => {
                    // Usually not recorded yet; retried on the next pass.
                    if !err.is_not_found() {
                        debug!(
                            "[qc-03] Cannot load metadata for pending miniblock {}: {}",
                            hex::encode(&miniblock_hash),
                            err
                        );
                    }
                    continue;
                }
            };

            pending.target().apply(&mut metadata, &notification);

            if let Err(err) = self.metadata.put(&miniblock_hash, &metadata) {
                error!(
                    "[qc-03] Cannot persist notarized metadata for miniblock {}: {}",
                    hex::encode(&miniblock_hash),
                    err
                );
                continue;
            }

            pending.remove_if_unchanged(&miniblock_hash, &notification);
            self.notifications_applied.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn pending_set(&self, target: NotarizationTarget) -> &PendingNotifications {
        match target {
            NotarizationTarget::Source => &self.pending_at_source,
            NotarizationTarget::Destination => &self.pending_at_destination,
            NotarizationTarget::Both => &self.pending_at_both,
        }
    }

    pub fn pending_counts(&self) -> PendingCounts {
        PendingCounts {
            source: self.pending_at_source.len(),
            destination: self.pending_at_destination.len(),
            both: self.pending_at_both.len(),
        }
    }

    pub fn notifications_applied(&self) -> u64 {
        self.notifications_applied.load(Ordering::Relaxed)
    }
}
