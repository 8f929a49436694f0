//! # Value Objects
//!
//! Configuration and storage unit identifiers for the History Lookup subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::block::ShardId;

/// Configuration for the history lookup index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLookupConfig {
    /// Whether historical indexing is enabled (default: false).
    ///
    /// Nodes that opt out get a disabled repository that records nothing.
    pub enabled: bool,
    /// Shard this node belongs to (default: 0).
    pub self_shard_id: ShardId,
}

impl Default for HistoryLookupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            self_shard_id: 0,
        }
    }
}

impl HistoryLookupConfig {
    /// Enabled configuration for shard 0.
    pub fn for_testing() -> Self {
        Self {
            enabled: true,
            self_shard_id: 0,
        }
    }
}

/// Logical storers the repository is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageUnit {
    /// Epoch-partitioned `miniblock hash -> MiniblockMetadata`.
    MiniblocksMetadata,
    /// `tx hash -> miniblock hash`.
    MiniblockHashByTxHash,
    /// `hash -> epoch`.
    EpochByHash,
}

impl StorageUnit {
    pub const ALL: [StorageUnit; 3] = [
        StorageUnit::MiniblocksMetadata,
        StorageUnit::MiniblockHashByTxHash,
        StorageUnit::EpochByHash,
    ];
}

impl fmt::Display for StorageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MiniblocksMetadata => "MiniblocksMetadataUnit",
            Self::MiniblockHashByTxHash => "MiniblockHashByTxHashUnit",
            Self::EpochByHash => "EpochByHashUnit",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_config_default_is_disabled() {
        let config = HistoryLookupConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.self_shard_id, 0);
    }

    #[test]
    fn test_history_config_for_testing_is_enabled() {
        assert!(HistoryLookupConfig::for_testing().enabled);
    }

    #[test]
    fn test_history_config_deserializes_from_json() {
        let config: HistoryLookupConfig =
            serde_json::from_str(r#"{"enabled":true,"self_shard_id":2}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.self_shard_id, 2);
    }

    #[test]
    fn test_storage_unit_display() {
        assert_eq!(StorageUnit::EpochByHash.to_string(), "EpochByHashUnit");
    }
}
