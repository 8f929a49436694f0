//! # Domain Errors
//!
//! Error types for the History Lookup subsystem.
//!
//! Not-found conditions are kept apart from storage failures: the reconciler
//! treats the former as transient and retries later, the query façade hands
//! both to the caller as distinct variants.

use thiserror::Error;

use super::value_objects::StorageUnit;

/// Errors raised by a [`Storer`](crate::ports::Storer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Key is absent from the store (or from the requested epoch).
    #[error("key not found: {key}")]
    KeyNotFound {
        /// Hex-encoded key.
        key: String,
    },

    /// Underlying storage engine failure.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// The chain storer has no storer for this unit.
    #[error("missing storage unit {0}")]
    MissingUnit(StorageUnit),
}

impl StoreError {
    /// Builds a [`StoreError::KeyNotFound`] for a raw key.
    pub fn key_not_found(key: &[u8]) -> Self {
        Self::KeyNotFound {
            key: hex::encode(key),
        }
    }
}

/// Errors that can occur while recording or querying history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Block body is not an ordinary miniblock body.
    #[error("cannot cast to block body")]
    CannotCastToBlockBody,

    /// Writing `hash -> epoch` failed.
    #[error("cannot save epoch num for [{kind}] hash [{hash}]: {source}")]
    CannotSaveEpochByHash {
        /// What the hash identifies ("block header", "miniblock").
        kind: &'static str,
        /// Hex-encoded hash.
        hash: String,
        #[source]
        source: Box<HistoryError>,
    },

    /// Writing the metadata record of a miniblock failed.
    #[error("cannot save miniblock metadata [{hash}]: {source}")]
    CannotSaveMiniblockMetadata {
        /// Hex-encoded miniblock hash.
        hash: String,
        #[source]
        source: StoreError,
    },

    /// Requested entry does not exist (yet).
    #[error("{kind} not found: {hash}")]
    NotFound {
        /// Which index was queried.
        kind: &'static str,
        /// Hex-encoded key.
        hash: String,
    },

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(StoreError),

    /// Marshalling or unmarshalling failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A storer required by the repository is not available.
    #[error("cannot create history repository, missing storer {unit}: {source}")]
    MissingStorer {
        unit: StorageUnit,
        #[source]
        source: StoreError,
    },
}

impl HistoryError {
    /// Maps a store error raised while reading `key` from the `kind` index.
    ///
    /// A missing key becomes [`HistoryError::NotFound`], anything else is a
    /// storage failure.
    pub fn from_store_read(kind: &'static str, key: &[u8], err: StoreError) -> Self {
        match err {
            StoreError::KeyNotFound { .. } => Self::NotFound {
                kind,
                hash: hex::encode(key),
            },
            other => Self::Storage(other),
        }
    }

    /// True for the expected, transient "not indexed yet" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for HistoryError {
    fn from(err: StoreError) -> Self {
        HistoryError::Storage(err)
    }
}
