//! Repository used when historical lookup is turned off.

use crate::domain::{BodyHandle, HeaderHandle, HistoryError, HistoryStats, MiniblockMetadata};
use crate::ports::inbound::HistoryRepository;
use crate::ports::outbound::BlockTracker;

/// Records nothing and answers every query with "not found".
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledHistoryRepository;

impl DisabledHistoryRepository {
    pub fn new() -> Self {
        Self
    }
}

impl HistoryRepository for DisabledHistoryRepository {
    fn record_block(&self, _: &[u8], _: &HeaderHandle, _: &BodyHandle) -> Result<(), HistoryError> {
        Ok(())
    }

    fn get_miniblock_metadata_by_tx_hash(&self, tx_hash: &[u8]) -> Result<MiniblockMetadata, HistoryError> {
        Err(HistoryError::NotFound {
            kind: "miniblock hash by tx hash",
            hash: hex::encode(tx_hash),
        })
    }

    fn get_miniblock_metadata_by_miniblock_hash(
        &self,
        miniblock_hash: &[u8],
    ) -> Result<MiniblockMetadata, HistoryError> {
        Err(HistoryError::NotFound {
            kind: "miniblock metadata",
            hash: hex::encode(miniblock_hash),
        })
    }

    fn get_epoch_by_hash(&self, hash: &[u8]) -> Result<u32, HistoryError> {
        Err(HistoryError::NotFound {
            kind: "epoch by hash",
            hash: hex::encode(hash),
        })
    }

    fn register_to_block_tracker(&self, _: &dyn BlockTracker) {}

    fn is_enabled(&self) -> bool {
        false
    }

    fn stats(&self) -> HistoryStats {
        HistoryStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Body, ShardHeader};

    #[test]
    fn test_disabled_records_nothing() {
        let repo = DisabledHistoryRepository::new();
        let header = HeaderHandle::Shard(ShardHeader::default());

        assert!(repo.record_block(b"h", &header, &BodyHandle::from(Body::default())).is_ok());
        // Even bodies the regular repository rejects are accepted.
        assert!(repo.record_block(b"h", &header, &BodyHandle::Opaque(vec![])).is_ok());

        assert!(!repo.is_enabled());
        assert!(repo.get_epoch_by_hash(b"h").unwrap_err().is_not_found());
        assert!(repo.get_miniblock_metadata_by_tx_hash(b"tx").unwrap_err().is_not_found());
        assert!(repo.get_miniblock_metadata_by_miniblock_hash(b"mb").unwrap_err().is_not_found());
        assert_eq!(repo.stats(), HistoryStats::default());
    }
}
