//! # API Gateway Handler
//!
//! JSON query adapter over a [`HistoryRepository`] for the node's API
//! gateway and admin panel.
//!
//! ## Supported Methods
//!
//! | Method | Params | Result |
//! |--------|--------|--------|
//! | `ping` | none | health check |
//! | `get_metrics` | none | [`HistoryMetrics`] |
//! | `get_epoch_by_hash` | `hash` | `{ found, epoch }` |
//! | `get_miniblock_metadata` | `tx_hash` or `miniblock_hash` | [`MiniblockMetadataResponse`] |

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::{HistoryError, MiniblockMetadata, MiniblockType};
use crate::ports::HistoryRepository;

/// Error from API query handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiQueryError {
    pub code: i32,
    pub message: String,
}

impl ApiQueryError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
        }
    }

    pub fn invalid_params(msg: &str) -> Self {
        Self {
            code: -32602,
            message: msg.to_string(),
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            code: -32603,
            message: msg.to_string(),
        }
    }
}

impl std::fmt::Display for ApiQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiQueryError {}

/// Metrics for the admin panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMetrics {
    pub enabled: bool,
    pub blocks_recorded: u64,
    pub miniblocks_recorded: u64,
    pub peer_miniblocks_skipped: u64,
    pub miniblocks_failed: u64,
    pub tx_index_failures: u64,
    pub notifications_applied: u64,
    pub pending_source: usize,
    pub pending_destination: usize,
    pub pending_both: usize,
    pub pending_total: usize,
}

/// Metadata of a miniblock, hashes hex-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiniblockMetadataResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniblock_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniblock_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_shard_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_shard_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notarized_at_source_in_meta_nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notarized_at_source_in_meta_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notarized_at_destination_in_meta_nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notarized_at_destination_in_meta_hash: Option<String>,
}

impl MiniblockMetadataResponse {
    fn not_found() -> Self {
        Self {
            found: false,
            miniblock_type: None,
            epoch: None,
            header_hash: None,
            miniblock_hash: None,
            round: None,
            header_nonce: None,
            source_shard_id: None,
            destination_shard_id: None,
            notarized_at_source_in_meta_nonce: None,
            notarized_at_source_in_meta_hash: None,
            notarized_at_destination_in_meta_nonce: None,
            notarized_at_destination_in_meta_hash: None,
        }
    }
}

impl From<MiniblockMetadata> for MiniblockMetadataResponse {
    fn from(m: MiniblockMetadata) -> Self {
        let type_name = MiniblockType::from_i32(m.miniblock_type)
            .map(|t| format!("{:?}", t))
            .unwrap_or_else(|| m.miniblock_type.to_string());
        let optional_hash = |h: &[u8]| (!h.is_empty()).then(|| hex::encode(h));

        Self {
            found: true,
            miniblock_type: Some(type_name),
            epoch: Some(m.epoch),
            header_hash: Some(hex::encode(&m.header_hash)),
            miniblock_hash: Some(hex::encode(&m.miniblock_hash)),
            round: Some(m.round),
            header_nonce: Some(m.header_nonce),
            source_shard_id: Some(m.source_shard_id),
            destination_shard_id: Some(m.destination_shard_id),
            notarized_at_source_in_meta_nonce: Some(m.notarized_at_source_in_meta_nonce),
            notarized_at_source_in_meta_hash: optional_hash(&m.notarized_at_source_in_meta_hash),
            notarized_at_destination_in_meta_nonce: Some(m.notarized_at_destination_in_meta_nonce),
            notarized_at_destination_in_meta_hash: optional_hash(
                &m.notarized_at_destination_in_meta_hash,
            ),
        }
    }
}

/// API Gateway handler for History Lookup.
pub struct ApiGatewayHandler {
    repository: Arc<dyn HistoryRepository>,
}

impl ApiGatewayHandler {
    pub fn new(repository: Arc<dyn HistoryRepository>) -> Self {
        Self { repository }
    }

    /// Handle get_metrics request (debug panel).
    pub fn handle_get_metrics(&self) -> serde_json::Value {
        let stats = self.repository.stats();
        let metrics = HistoryMetrics {
            enabled: self.repository.is_enabled(),
            blocks_recorded: stats.blocks_recorded,
            miniblocks_recorded: stats.miniblocks_recorded,
            peer_miniblocks_skipped: stats.peer_miniblocks_skipped,
            miniblocks_failed: stats.miniblocks_failed,
            tx_index_failures: stats.tx_index_failures,
            notifications_applied: stats.notifications_applied,
            pending_total: stats.pending_total(),
            pending_source: stats.pending_source,
            pending_destination: stats.pending_destination,
            pending_both: stats.pending_both,
        };

        serde_json::to_value(metrics).unwrap_or_default()
    }

    /// Handle ping request (health check).
    pub fn handle_ping(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "ok",
            "subsystem": "qc-03-history-lookup",
            "enabled": self.repository.is_enabled()
        })
    }

    pub fn handle_get_epoch_by_hash(&self, hash: &[u8]) -> Result<serde_json::Value, ApiQueryError> {
        match self.repository.get_epoch_by_hash(hash) {
            Ok(epoch) => Ok(serde_json::json!({ "found": true, "epoch": epoch })),
            Err(err) if err.is_not_found() => Ok(serde_json::json!({ "found": false })),
            Err(err) => Err(internal_error(err)),
        }
    }

    pub fn handle_get_miniblock_metadata(
        &self,
        lookup: MetadataLookup,
    ) -> Result<serde_json::Value, ApiQueryError> {
        let result = match &lookup {
            MetadataLookup::ByTxHash(hash) => self.repository.get_miniblock_metadata_by_tx_hash(hash),
            MetadataLookup::ByMiniblockHash(hash) => {
                self.repository.get_miniblock_metadata_by_miniblock_hash(hash)
            }
        };

        let response = match result {
            Ok(metadata) => MiniblockMetadataResponse::from(metadata),
            Err(err) if err.is_not_found() => MiniblockMetadataResponse::not_found(),
            Err(err) => return Err(internal_error(err)),
        };
        Ok(serde_json::to_value(response).unwrap_or_default())
    }
}

/// How a metadata query identifies its miniblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataLookup {
    ByTxHash(Vec<u8>),
    ByMiniblockHash(Vec<u8>),
}

fn internal_error(err: HistoryError) -> ApiQueryError {
    ApiQueryError::internal(&err.to_string())
}

/// Handle an API query from the gateway.
pub fn handle_api_query(
    handler: &ApiGatewayHandler,
    method: &str,
    params: &serde_json::Value,
) -> Result<serde_json::Value, ApiQueryError> {
    match method {
        "ping" => Ok(handler.handle_ping()),
        "get_metrics" => Ok(handler.handle_get_metrics()),
        "get_epoch_by_hash" => {
            let hash = parse_hash_param(params, "hash")?;
            handler.handle_get_epoch_by_hash(&hash)
        }
        "get_miniblock_metadata" => {
            let lookup = if params.get("tx_hash").is_some() {
                MetadataLookup::ByTxHash(parse_hash_param(params, "tx_hash")?)
            } else if params.get("miniblock_hash").is_some() {
                MetadataLookup::ByMiniblockHash(parse_hash_param(params, "miniblock_hash")?)
            } else {
                return Err(ApiQueryError::invalid_params(
                    "Missing tx_hash or miniblock_hash parameter",
                ));
            };
            handler.handle_get_miniblock_metadata(lookup)
        }
        _ => Err(ApiQueryError::method_not_found(method)),
    }
}

/// Parse a hex hash parameter from JSON params. Any non-empty length is accepted.
fn parse_hash_param(params: &serde_json::Value, name: &str) -> Result<Vec<u8>, ApiQueryError> {
    let hex_str = params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiQueryError::invalid_params(&format!("Missing {} parameter", name)))?;

    let bytes = hex::decode(hex_str.trim_start_matches("0x"))
        .map_err(|_| ApiQueryError::invalid_params("Invalid hex format"))?;

    if bytes.is_empty() {
        return Err(ApiQueryError::invalid_params("Hash must not be empty"));
    }
    Ok(bytes)
}
