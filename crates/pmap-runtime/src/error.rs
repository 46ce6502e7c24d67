//! Error types for the runtime crate.

use pmap_core::DecodeError;
use pmap_messenger::MessengerError;
use thiserror::Error;

use crate::storage::ObjectLocator;

/// Errors reading from object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object {0} not found")]
    NotFound(ObjectLocator),

    #[error("object {locator} exceeds the {limit} byte limit")]
    TooLarge { locator: ObjectLocator, limit: u64 },

    #[error("invalid object locator {0}")]
    InvalidLocator(ObjectLocator),

    #[error("failed to read object {locator}: {source}")]
    Io {
        locator: ObjectLocator,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metadata for object {locator}: {source}")]
    Metadata {
        locator: ObjectLocator,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors handling one notification.
#[derive(Debug, Error)]
pub enum HandleError {
    /// The object could not be read. Nothing was sent.
    #[error("failed to fetch object: {0}")]
    Fetch(#[from] StorageError),

    /// The object is not a valid record. Nothing was sent.
    #[error("failed to decode object {locator}: {source}")]
    Decode {
        locator: ObjectLocator,
        #[source]
        source: DecodeError,
    },

    /// A processor rejected the record. The record was sent to the failure
    /// messenger.
    #[error("failed to process object {locator} in {processor}: {source:#}")]
    Processing {
        locator: ObjectLocator,
        processor: String,
        #[source]
        source: anyhow::Error,
    },

    /// The outcome event could not be built.
    #[error("failed to build outcome event: {0}")]
    Event(#[from] serde_json::Error),

    /// The outcome event could not be delivered.
    #[error("failed to send outcome event: {0}")]
    Send(#[from] MessengerError),
}
