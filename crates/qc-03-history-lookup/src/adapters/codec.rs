//! Codec and hashing adapters.

use sha3::{Digest, Sha3_256};

use crate::domain::{EpochByHash, HistoryError, Miniblock, MiniblockMetadata};
use crate::ports::outbound::{Hasher, Marshaller};

/// Default marshaller using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeMarshaller;

impl BincodeMarshaller {
    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, HistoryError> {
        bincode::serialize(value).map_err(|e| HistoryError::Serialization(e.to_string()))
    }

    fn decode<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T, HistoryError> {
        bincode::deserialize(data).map_err(|e| HistoryError::Serialization(e.to_string()))
    }
}

impl Marshaller for BincodeMarshaller {
    fn marshal_miniblock(&self, miniblock: &Miniblock) -> Result<Vec<u8>, HistoryError> {
        Self::encode(miniblock)
    }

    fn marshal_metadata(&self, metadata: &MiniblockMetadata) -> Result<Vec<u8>, HistoryError> {
        Self::encode(metadata)
    }

    fn unmarshal_metadata(&self, data: &[u8]) -> Result<MiniblockMetadata, HistoryError> {
        Self::decode(data)
    }

    fn marshal_epoch(&self, value: &EpochByHash) -> Result<Vec<u8>, HistoryError> {
        Self::encode(value)
    }

    fn unmarshal_epoch(&self, data: &[u8]) -> Result<EpochByHash, HistoryError> {
        Self::decode(data)
    }
}

/// SHA3-256 hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha3Hasher;

impl Hasher for Sha3Hasher {
    fn compute(&self, data: &[u8]) -> Vec<u8> {
        Sha3_256::digest(data).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MiniblockType;

    #[test]
    fn test_sha3_hasher_is_deterministic() {
        let hasher = Sha3Hasher;
        assert_eq!(hasher.compute(b"abc"), hasher.compute(b"abc"));
        assert_ne!(hasher.compute(b"abc"), hasher.compute(b"abd"));
        assert_eq!(hasher.compute(b"abc").len(), 32);
    }

    #[test]
    fn test_unmarshal_garbage_metadata_fails() {
        let result = BincodeMarshaller.unmarshal_metadata(&[0xFF]);
        assert!(matches!(result, Err(HistoryError::Serialization(_))));
    }

    #[test]
    fn test_miniblock_encoding_depends_on_content() {
        let mut miniblock = Miniblock {
            tx_hashes: vec![vec![1; 32]],
            sender_shard_id: 0,
            receiver_shard_id: 1,
            miniblock_type: MiniblockType::Tx,
        };
        let first = BincodeMarshaller.marshal_miniblock(&miniblock).unwrap();
        miniblock.receiver_shard_id = 2;
        let second = BincodeMarshaller.marshal_miniblock(&miniblock).unwrap();

        assert_ne!(first, second);
    }
}
