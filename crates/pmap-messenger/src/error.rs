//! Error types for the messenger crate.

use thiserror::Error;

/// Errors that can occur while delivering an outcome event.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// The messenger configuration is unusable.
    #[error("invalid messenger configuration: {0}")]
    Configuration(String),

    /// Serialization error.
    #[error("failed to serialize outcome event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("failed to deliver outcome event: {0}")]
    Io(#[from] std::io::Error),
}
