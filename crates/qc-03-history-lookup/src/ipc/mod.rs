//! # IPC Layer
//!
//! Channel boundary of the History Lookup subsystem: committed blocks from
//! the commit path and notarized header batches from the block tracker.

pub mod handler;
pub mod payloads;

pub use handler::*;
pub use payloads::*;
