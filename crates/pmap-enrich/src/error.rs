//! Error types for the enrichment crate.

use thiserror::Error;

/// Errors that stop enrichment of a record.
///
/// None of these are retried; the notification is redelivered instead.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// A scope keyword in the resource name is not followed by an ID.
    #[error("invalid resource name {name:?}: {keyword:?} is not followed by an ID")]
    InvalidResourceName { name: String, keyword: String },

    /// The resource search did not return exactly one match.
    #[error("{count} matched resources found, expected 1 (name {name:?}, scope {scope:?})")]
    MatchCount {
        count: usize,
        name: String,
        scope: String,
    },

    /// The resource search failed.
    #[error("failed to search resources in {scope}: {source:#}")]
    ResourceSearch {
        scope: String,
        #[source]
        source: anyhow::Error,
    },

    /// The IAM policy search failed.
    #[error("failed to search IAM policies in {scope}: {source:#}")]
    IamPolicySearch {
        scope: String,
        #[source]
        source: anyhow::Error,
    },

    /// The inventory returned a page token it had already returned for the
    /// same search.
    #[error("inventory repeated page token {token:?} while searching {search} in {scope}")]
    RepeatedPageToken {
        search: &'static str,
        scope: String,
        token: String,
    },

    /// The bundle could not be converted into an annotation value.
    #[error("failed to encode enrichment bundle: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised by the snapshot-backed inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid inventory snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("unsupported query {0:?}, expected field=\"value\"")]
    UnsupportedQuery(String),

    #[error("invalid page token {0:?}")]
    InvalidPageToken(String),
}
