//! # History Repository Factory
//!
//! Builds the repository a node runs with: the regular one when historical
//! lookup is enabled, the disabled one otherwise.

use std::sync::Arc;
use tracing::info;

use crate::domain::{HistoryError, HistoryLookupConfig, StorageUnit};
use crate::ports::inbound::HistoryRepository;
use crate::ports::outbound::{ChainStorer, Hasher, Marshaller, Storer};
use crate::service::disabled::DisabledHistoryRepository;
use crate::service::repository::{HistoryRepositoryArguments, HistoryRepositoryService};

pub struct HistoryRepositoryFactoryArgs {
    pub config: HistoryLookupConfig,
    pub store: Arc<dyn ChainStorer>,
    pub marshaller: Arc<dyn Marshaller>,
    pub hasher: Arc<dyn Hasher>,
}

pub struct HistoryRepositoryFactory {
    args: HistoryRepositoryFactoryArgs,
}

impl HistoryRepositoryFactory {
    pub fn new(args: HistoryRepositoryFactoryArgs) -> Self {
        Self { args }
    }

    /// Create the repository.
    ///
    /// Fails with [`HistoryError::MissingStorer`] when the chain storer lacks
    /// one of the units the regular repository needs. A disabled config never
    /// touches the chain storer.
    pub fn create(&self) -> Result<Arc<dyn HistoryRepository>, HistoryError> {
        if !self.args.config.enabled {
            info!("[qc-03] Historical lookup disabled");
            return Ok(Arc::new(DisabledHistoryRepository::new()));
        }

        let repo = HistoryRepositoryService::new(HistoryRepositoryArguments {
            self_shard_id: self.args.config.self_shard_id,
            miniblocks_metadata_storer: self.storer(StorageUnit::MiniblocksMetadata)?,
            miniblock_hash_by_tx_hash_storer: self.storer(StorageUnit::MiniblockHashByTxHash)?,
            epoch_by_hash_storer: self.storer(StorageUnit::EpochByHash)?,
            marshaller: self.args.marshaller.clone(),
            hasher: self.args.hasher.clone(),
        });

        info!(
            "[qc-03] Historical lookup enabled for shard {}",
            self.args.config.self_shard_id
        );
        Ok(Arc::new(repo))
    }

    fn storer(&self, unit: StorageUnit) -> Result<Arc<dyn Storer>, HistoryError> {
        self.args
            .store
            .get_storer(unit)
            .map_err(|source| HistoryError::MissingStorer { unit, source })
    }
}
