//! # Epoch-by-Hash Index
//!
//! Maps a block header hash or miniblock hash to the epoch it was produced
//! in. Every epoch-partitioned read starts here: a hash alone does not say
//! which partition to look in.
//!
//! Transaction hashes are NOT indexed here; they go through the
//! tx -> miniblock index.

use std::sync::Arc;

use crate::domain::{EpochByHash, HistoryError};
use crate::ports::outbound::{Marshaller, Storer};

pub struct EpochByHashIndex {
    storer: Arc<dyn Storer>,
    marshaller: Arc<dyn Marshaller>,
}

impl EpochByHashIndex {
    pub fn new(storer: Arc<dyn Storer>, marshaller: Arc<dyn Marshaller>) -> Self {
        Self { storer, marshaller }
    }

    /// Write `hash -> epoch`. Rewriting the same pair is harmless.
    pub fn save_epoch_by_hash(&self, hash: &[u8], epoch: u32) -> Result<(), HistoryError> {
        let bytes = self.marshaller.marshal_epoch(&EpochByHash { epoch })?;
        self.storer.put(hash, &bytes)?;
        Ok(())
    }

    /// Epoch of `hash`, or [`HistoryError::NotFound`] if it was never indexed.
    pub fn get_epoch_by_hash(&self, hash: &[u8]) -> Result<u32, HistoryError> {
        let bytes = self
            .storer
            .get(hash)
            .map_err(|e| HistoryError::from_store_read("epoch by hash", hash, e))?;
        let record = self.marshaller.unmarshal_epoch(&bytes)?;
        Ok(record.epoch)
    }
}
