//! Error types for the push endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pmap_runtime::HandleError;
use thiserror::Error;

/// Errors answering one push request.
#[derive(Debug, Error)]
pub enum PushError {
    /// The body is not a push envelope.
    #[error("invalid push envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),

    /// `message.data` is not valid base64.
    #[error("invalid message data: {0}")]
    InvalidData(#[from] base64::DecodeError),

    #[error("bucket ID not found")]
    MissingBucketId,

    #[error("object ID not found")]
    MissingObjectId,

    /// The notification was accepted but could not be handled.
    #[error(transparent)]
    Handle(#[from] HandleError),
}

impl PushError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PushError::InvalidEnvelope(_)
            | PushError::InvalidData(_)
            | PushError::MissingBucketId
            | PushError::MissingObjectId => StatusCode::BAD_REQUEST,
            PushError::Handle(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PushError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
