//! # Domain Entities
//!
//! The persisted miniblock metadata record and the notarization rules that
//! patch it.
//!
//! ## Notarization directions
//!
//! | Miniblock | Event needed | Fields set |
//! |-----------|--------------|------------|
//! | intra-shard | one | source + destination |
//! | to metachain | one | source + destination |
//! | cross-shard, notarized in sender's block | source | source only |
//! | cross-shard, notarized in receiver's block | destination | destination only |

use serde::{Deserialize, Serialize};

use super::block::{MiniblockHeader, ShardId, METACHAIN_SHARD_ID};

/// Everything the node knows about where a miniblock lives and whether the
/// metachain has notarized it.
///
/// Created once when the containing block is recorded, then only patched
/// with notarization fields. Empty hashes and zero nonces mean "not yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniblockMetadata {
    /// [`MiniblockType`](super::MiniblockType) tag.
    pub miniblock_type: i32,
    pub epoch: u32,
    pub header_hash: Vec<u8>,
    pub miniblock_hash: Vec<u8>,
    pub round: u64,
    pub header_nonce: u64,
    pub source_shard_id: ShardId,
    pub destination_shard_id: ShardId,
    pub notarized_at_source_in_meta_nonce: u64,
    pub notarized_at_source_in_meta_hash: Vec<u8>,
    pub notarized_at_destination_in_meta_nonce: u64,
    pub notarized_at_destination_in_meta_hash: Vec<u8>,
}

impl MiniblockMetadata {
    pub fn is_notarized_at_source(&self) -> bool {
        !self.notarized_at_source_in_meta_hash.is_empty()
    }

    pub fn is_notarized_at_destination(&self) -> bool {
        !self.notarized_at_destination_in_meta_hash.is_empty()
    }
}

/// Persisted value of the epoch-by-hash index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochByHash {
    pub epoch: u32,
}

/// A metachain block that notarized a miniblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotarizedNotification {
    pub meta_nonce: u64,
    pub meta_hash: Vec<u8>,
}

/// Which side of a miniblock a notarization event confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotarizationTarget {
    Source,
    Destination,
    /// Intra-shard or to-metachain miniblocks: one event settles both sides.
    Both,
}

impl NotarizationTarget {
    /// Decides which pending set a notarized miniblock belongs to.
    ///
    /// `containing_shard` is the shard of the block that listed the
    /// miniblock. Returns `None` when neither end of the miniblock is
    /// `self_shard`: this node stores nothing for it.
    pub fn classify(
        header: &MiniblockHeader,
        containing_shard: ShardId,
        self_shard: ShardId,
    ) -> Option<Self> {
        let sender = header.sender_shard_id;
        let receiver = header.receiver_shard_id;

        if sender != self_shard && receiver != self_shard {
            return None;
        }

        let is_intra = sender == receiver;
        let is_to_meta = receiver == METACHAIN_SHARD_ID;
        let notarized_at_source = sender == containing_shard;

        let target = if is_intra || is_to_meta {
            Self::Both
        } else if notarized_at_source {
            Self::Source
        } else {
            Self::Destination
        };
        Some(target)
    }

    /// Writes the notification into the matching notarization fields.
    ///
    /// Idempotent: applying the same notification again yields the same record.
    pub fn apply(&self, metadata: &mut MiniblockMetadata, notification: &NotarizedNotification) {
        if matches!(self, Self::Source | Self::Both) {
            metadata.notarized_at_source_in_meta_nonce = notification.meta_nonce;
            metadata.notarized_at_source_in_meta_hash = notification.meta_hash.clone();
        }
        if matches!(self, Self::Destination | Self::Both) {
            metadata.notarized_at_destination_in_meta_nonce = notification.meta_nonce;
            metadata.notarized_at_destination_in_meta_hash = notification.meta_hash.clone();
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
            Self::Both => "both",
        }
    }
}

/// Counters about recording and reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Blocks passed to `record_block` that were indexed.
    pub blocks_recorded: u64,
    /// Miniblocks whose metadata was persisted.
    pub miniblocks_recorded: u64,
    /// Peer miniblocks skipped.
    pub peer_miniblocks_skipped: u64,
    /// Miniblocks skipped because indexing them failed.
    pub miniblocks_failed: u64,
    /// Tx -> miniblock entries that could not be written.
    pub tx_index_failures: u64,
    /// Notifications applied to persisted metadata.
    pub notifications_applied: u64,
    pub pending_source: usize,
    pub pending_destination: usize,
    pub pending_both: usize,
}

impl HistoryStats {
    pub fn pending_total(&self) -> usize {
        self.pending_source + self.pending_destination + self.pending_both
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::block::MiniblockType;

    fn mb_header(sender: ShardId, receiver: ShardId) -> MiniblockHeader {
        MiniblockHeader {
            hash: vec![0xAA; 32],
            sender_shard_id: sender,
            receiver_shard_id: receiver,
            tx_count: 1,
            miniblock_type: MiniblockType::Tx,
        }
    }

    fn notification(nonce: u64, hash: u8) -> NotarizedNotification {
        NotarizedNotification {
            meta_nonce: nonce,
            meta_hash: vec![hash; 32],
        }
    }

    // ========== Classification ==========

    #[test]
    fn test_classify_intra_shard_is_both() {
        let target = NotarizationTarget::classify(&mb_header(0, 0), 0, 0);
        assert_eq!(target, Some(NotarizationTarget::Both));
    }

    #[test]
    fn test_classify_to_meta_is_both() {
        let target = NotarizationTarget::classify(&mb_header(0, METACHAIN_SHARD_ID), 0, 0);
        assert_eq!(target, Some(NotarizationTarget::Both));
    }

    #[test]
    fn test_classify_cross_shard_in_sender_block_is_source() {
        let target = NotarizationTarget::classify(&mb_header(0, 1), 0, 0);
        assert_eq!(target, Some(NotarizationTarget::Source));
    }

    #[test]
    fn test_classify_cross_shard_in_receiver_block_is_destination() {
        let target = NotarizationTarget::classify(&mb_header(0, 1), 1, 1);
        assert_eq!(target, Some(NotarizationTarget::Destination));
    }

    #[test]
    fn test_classify_ignores_miniblocks_of_other_shards() {
        assert_eq!(NotarizationTarget::classify(&mb_header(1, 2), 1, 0), None);
        assert_eq!(NotarizationTarget::classify(&mb_header(2, 2), 2, 0), None);
    }

    #[test]
    fn test_classify_from_meta_to_self_in_meta_block() {
        // Sent by the metachain to shard 0, listed in a metachain block.
        let header = mb_header(METACHAIN_SHARD_ID, 0);
        let target = NotarizationTarget::classify(&header, METACHAIN_SHARD_ID, 0);
        assert_eq!(target, Some(NotarizationTarget::Source));
    }

    // ========== Patching ==========

    #[test]
    fn test_apply_source_leaves_destination_unset() {
        let mut metadata = MiniblockMetadata::default();
        NotarizationTarget::Source.apply(&mut metadata, &notification(7, 0x07));

        assert_eq!(metadata.notarized_at_source_in_meta_nonce, 7);
        assert_eq!(metadata.notarized_at_source_in_meta_hash, vec![0x07; 32]);
        assert!(!metadata.is_notarized_at_destination());
    }

    #[test]
    fn test_apply_destination_leaves_source_unset() {
        let mut metadata = MiniblockMetadata::default();
        NotarizationTarget::Destination.apply(&mut metadata, &notification(9, 0x09));

        assert!(!metadata.is_notarized_at_source());
        assert_eq!(metadata.notarized_at_destination_in_meta_nonce, 9);
    }

    #[test]
    fn test_apply_both_sets_both_sides() {
        let mut metadata = MiniblockMetadata::default();
        NotarizationTarget::Both.apply(&mut metadata, &notification(3, 0x03));

        assert!(metadata.is_notarized_at_source());
        assert!(metadata.is_notarized_at_destination());
        assert_eq!(
            metadata.notarized_at_source_in_meta_hash,
            metadata.notarized_at_destination_in_meta_hash
        );
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut once = MiniblockMetadata::default();
        NotarizationTarget::Both.apply(&mut once, &notification(3, 0x03));

        let mut twice = once.clone();
        NotarizationTarget::Both.apply(&mut twice, &notification(3, 0x03));

        assert_eq!(once, twice);
    }
}
