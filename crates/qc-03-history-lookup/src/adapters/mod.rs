//! # Adapters Layer
//!
//! Secondary adapters for the History Lookup subsystem: in-memory storers,
//! the bincode/SHA3 codec and the API gateway query handler.

pub mod api_handler;
pub mod codec;
pub mod storage;

pub use api_handler::{
    handle_api_query, ApiGatewayHandler, ApiQueryError, HistoryMetrics, MetadataLookup,
    MiniblockMetadataResponse,
};
pub use codec::{BincodeMarshaller, Sha3Hasher};
pub use storage::{InMemoryChainStorer, InMemoryStorer};
