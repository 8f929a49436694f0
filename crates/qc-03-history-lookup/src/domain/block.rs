//! # Block Types
//!
//! The block, header and miniblock shapes this subsystem consumes. They are
//! produced by the commit path and the block tracker; this crate only reads
//! them.
//!
//! Headers and bodies are closed enums so that every classification step
//! matches exhaustively instead of probing concrete types at runtime.

use serde::{Deserialize, Serialize};

/// Shard identifier.
pub type ShardId = u32;

/// Shard identifier reserved for the metachain.
pub const METACHAIN_SHARD_ID: ShardId = u32::MAX;

/// Kind of a miniblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiniblockType {
    Tx,
    State,
    /// Validator/peer changes. Never recorded by the history index.
    Peer,
    SmartContractResult,
    Invalid,
    Receipt,
    Rewards,
}

impl MiniblockType {
    /// Numeric tag persisted in [`MiniblockMetadata`](super::MiniblockMetadata).
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Tx => 0,
            Self::State => 30,
            Self::Peer => 60,
            Self::SmartContractResult => 90,
            Self::Invalid => 120,
            Self::Receipt => 150,
            Self::Rewards => 255,
        }
    }

    /// Inverse of [`MiniblockType::as_i32`].
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Tx),
            30 => Some(Self::State),
            60 => Some(Self::Peer),
            90 => Some(Self::SmartContractResult),
            120 => Some(Self::Invalid),
            150 => Some(Self::Receipt),
            255 => Some(Self::Rewards),
            _ => None,
        }
    }
}

/// A batch of transaction hashes of one kind, routed from one shard to another.
///
/// The miniblock hash is content-addressed: it is the hash of the marshalled
/// miniblock, computed by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Miniblock {
    pub tx_hashes: Vec<Vec<u8>>,
    pub sender_shard_id: ShardId,
    pub receiver_shard_id: ShardId,
    pub miniblock_type: MiniblockType,
}

/// Ordinary block body: the list of miniblocks of a committed block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub miniblocks: Vec<Miniblock>,
}

/// Block body as handed over by the commit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyHandle {
    /// Decoded body made of miniblocks.
    Block(Body),
    /// Body that was not decoded into miniblocks (raw payload).
    Opaque(Vec<u8>),
}

impl BodyHandle {
    /// Returns the ordinary body, if this is one.
    pub fn as_block_body(&self) -> Option<&Body> {
        match self {
            Self::Block(body) => Some(body),
            Self::Opaque(_) => None,
        }
    }
}

impl From<Body> for BodyHandle {
    fn from(body: Body) -> Self {
        Self::Block(body)
    }
}

/// Reference to a miniblock inside a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniblockHeader {
    pub hash: Vec<u8>,
    pub sender_shard_id: ShardId,
    pub receiver_shard_id: ShardId,
    pub tx_count: u32,
    pub miniblock_type: MiniblockType,
}

/// Header of a block produced by a regular shard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardHeader {
    pub nonce: u64,
    pub round: u64,
    pub epoch: u32,
    pub shard_id: ShardId,
    pub miniblock_headers: Vec<MiniblockHeader>,
}

/// Per-shard section of a metachain block: the shard block it notarizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardData {
    pub shard_id: ShardId,
    pub header_hash: Vec<u8>,
    pub shard_miniblock_headers: Vec<MiniblockHeader>,
}

/// Header of a metachain block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaBlock {
    pub nonce: u64,
    pub round: u64,
    pub epoch: u32,
    pub shard_info: Vec<ShardData>,
}

/// Any block header this subsystem may be handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderHandle {
    Shard(ShardHeader),
    Meta(MetaBlock),
}

impl HeaderHandle {
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Shard(header) => header.nonce,
            Self::Meta(meta) => meta.nonce,
        }
    }

    pub fn round(&self) -> u64 {
        match self {
            Self::Shard(header) => header.round,
            Self::Meta(meta) => meta.round,
        }
    }

    pub fn epoch(&self) -> u32 {
        match self {
            Self::Shard(header) => header.epoch,
            Self::Meta(meta) => meta.epoch,
        }
    }

    /// Shard that produced the block.
    pub fn shard_id(&self) -> ShardId {
        match self {
            Self::Shard(header) => header.shard_id,
            Self::Meta(_) => METACHAIN_SHARD_ID,
        }
    }
}

impl From<ShardHeader> for HeaderHandle {
    fn from(header: ShardHeader) -> Self {
        Self::Shard(header)
    }
}

impl From<MetaBlock> for HeaderHandle {
    fn from(meta: MetaBlock) -> Self {
        Self::Meta(meta)
    }
}
