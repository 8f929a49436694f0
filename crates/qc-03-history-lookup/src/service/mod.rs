//! # Service Layer
//!
//! The indices, the notarization reconciler and the repository built on top
//! of them.

pub mod disabled;
pub mod epoch_index;
pub mod factory;
pub mod metadata_store;
pub mod pending;
pub mod reconciler;
pub mod repository;

pub use disabled::DisabledHistoryRepository;
pub use epoch_index::EpochByHashIndex;
pub use factory::{HistoryRepositoryFactory, HistoryRepositoryFactoryArgs};
pub use metadata_store::{MiniblockHashByTxHashIndex, MiniblockMetadataStore};
pub use pending::PendingNotifications;
pub use reconciler::{NotarizationReconciler, PendingCounts};
pub use repository::{HistoryRepositoryArguments, HistoryRepositoryService};
