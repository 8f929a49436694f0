//! # Inbound Ports (Driving Ports)
//!
//! Public API exposed by the History Lookup subsystem to the commit path,
//! the block tracker wiring and the node's read paths.

use crate::domain::{BodyHandle, HeaderHandle, HistoryError, HistoryStats, MiniblockMetadata};
use crate::ports::outbound::BlockTracker;

/// Primary API for the History Lookup subsystem.
///
/// Two implementations exist: the regular repository and a disabled one for
/// nodes that opt out of historical indexing.
pub trait HistoryRepository: Send + Sync {
    /// Index a committed block.
    ///
    /// ## Returns
    ///
    /// - `Ok(())`: block indexed; individual miniblocks may still have been
    ///   skipped (logged)
    /// - `Err(CannotCastToBlockBody)`: body is not an ordinary block body
    /// - `Err(CannotSaveEpochByHash)`: the header hash could not be indexed
    fn record_block(
        &self,
        header_hash: &[u8],
        header: &HeaderHandle,
        body: &BodyHandle,
    ) -> Result<(), HistoryError>;

    /// Resolve `tx hash -> miniblock hash -> epoch -> metadata`.
    fn get_miniblock_metadata_by_tx_hash(
        &self,
        tx_hash: &[u8],
    ) -> Result<MiniblockMetadata, HistoryError>;

    /// Resolve `miniblock hash -> epoch -> metadata`.
    fn get_miniblock_metadata_by_miniblock_hash(
        &self,
        miniblock_hash: &[u8],
    ) -> Result<MiniblockMetadata, HistoryError>;

    /// Epoch in which a block header or miniblock was produced.
    ///
    /// Does NOT work for transaction hashes; use
    /// [`get_miniblock_metadata_by_tx_hash`](Self::get_miniblock_metadata_by_tx_hash).
    fn get_epoch_by_hash(&self, hash: &[u8]) -> Result<u32, HistoryError>;

    /// Subscribe to cross- and self-notarized header events.
    fn register_to_block_tracker(&self, tracker: &dyn BlockTracker);

    /// Whether this repository actually records anything.
    fn is_enabled(&self) -> bool;

    /// Recording counters and pending-set sizes.
    fn stats(&self) -> HistoryStats;
}
