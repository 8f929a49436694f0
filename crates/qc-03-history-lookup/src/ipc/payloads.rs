//! # IPC Payloads
//!
//! Events delivered to the History Lookup subsystem over a channel.

use crate::domain::{BodyHandle, HeaderHandle, ShardId};

// ============================================================
// INCOMING EVENTS
// ============================================================

/// Published by the commit path once a block is committed.
#[derive(Debug, Clone)]
pub struct BlockCommittedPayload {
    pub header_hash: Vec<u8>,
    pub header: HeaderHandle,
    pub body: BodyHandle,
}

/// Which block tracker subscription a batch of headers belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotarizationKind {
    /// Headers of other shards notarized by the metachain.
    CrossShard,
    /// Headers of this node's own shard notarized by the metachain.
    SelfShard,
}

/// Published by the block tracker for every batch of notarized headers.
///
/// `headers[i]` is identified by `header_hashes[i]`.
#[derive(Debug, Clone)]
pub struct NotarizedHeadersPayload {
    pub kind: NotarizationKind,
    pub shard_id: ShardId,
    pub headers: Vec<HeaderHandle>,
    pub header_hashes: Vec<Vec<u8>>,
}

/// Every event the subsystem consumes.
#[derive(Debug, Clone)]
pub enum HistoryEvent {
    BlockCommitted(BlockCommittedPayload),
    NotarizedHeaders(NotarizedHeadersPayload),
}

impl From<BlockCommittedPayload> for HistoryEvent {
    fn from(payload: BlockCommittedPayload) -> Self {
        Self::BlockCommitted(payload)
    }
}

impl From<NotarizedHeadersPayload> for HistoryEvent {
    fn from(payload: NotarizedHeadersPayload) -> Self {
        Self::NotarizedHeaders(payload)
    }
}
