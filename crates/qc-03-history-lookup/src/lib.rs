//! # History Lookup Subsystem (qc-03)
//!
//! Historical index of a sharded chain node. For every committed block it
//! records where each miniblock and transaction lives, and it reconciles
//! that record with the metachain notarizations reported later by the block
//! tracker.
//!
//! ## Indices
//!
//! | Index | Key | Value | Partitioned |
//! |-------|-----|-------|-------------|
//! | epoch by hash | header / miniblock hash | `EpochByHash` | no |
//! | miniblock metadata | miniblock hash | `MiniblockMetadata` | by epoch |
//! | miniblock by tx | tx hash | miniblock hash | no |
//!
//! ## Data Flow
//!
//! ```text
//! Commit path ──record_block──→ [History Repository] ──→ epoch / metadata / tx indices
//!                                        ↑                         ↑
//! Block tracker ──notarized headers──→ [Reconciler] ──pending──────┘
//! ```
//!
//! Notarization events and block records may arrive in either order. Events
//! whose metadata is not persisted yet stay pending and are applied on a
//! later reconciliation pass.
//!
//! ## Notarization Rules
//!
//! | Miniblock | Events needed |
//! |-----------|---------------|
//! | intra-shard | one, sets both sides |
//! | towards metachain | one, sets both sides |
//! | cross-shard | one at source, one at destination |
//!
//! On the metachain itself, miniblocks towards meta are notarized by the
//! very block that records them.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): block shapes, metadata record, errors
//! - **Ports Layer** (`ports/`): repository API, storer/codec/tracker SPI
//! - **Service Layer** (`service/`): indices, reconciler, repository, factory
//! - **IPC Layer** (`ipc/`): channel-fed event handler
//! - **Adapters Layer** (`adapters/`): in-memory storers, codec, API gateway handler

pub mod adapters;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

// Re-export main types for convenience
pub use domain::{
    Body, BodyHandle, EpochByHash, HeaderHandle, HistoryError, HistoryLookupConfig, HistoryStats,
    MetaBlock, Miniblock, MiniblockHeader, MiniblockMetadata, MiniblockType, NotarizationTarget,
    NotarizedNotification, ShardData, ShardHeader, ShardId, StorageUnit, StoreError,
    METACHAIN_SHARD_ID,
};

pub use ports::{
    BlockTracker, ChainStorer, Hasher, HistoryRepository, Marshaller, NotarizedHeadersHandler,
    Storer,
};

pub use service::{
    DisabledHistoryRepository, HistoryRepositoryArguments, HistoryRepositoryFactory,
    HistoryRepositoryFactoryArgs, HistoryRepositoryService, NotarizationReconciler,
};

pub use adapters::{BincodeMarshaller, InMemoryChainStorer, InMemoryStorer, Sha3Hasher};

pub use ipc::{
    history_channel, BlockCommittedPayload, ChannelBlockTracker, HandlerError, HistoryEvent,
    HistoryEventHandler, NotarizationKind, NotarizedHeadersPayload,
};
