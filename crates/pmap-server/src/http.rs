//! Push endpoint routes.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pmap_core::Record;
use pmap_runtime::{EventHandler, ObjectLocator};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::PushError;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 256_000;

const BUCKET_ID_ATTRIBUTE: &str = "bucketId";
const OBJECT_ID_ATTRIBUTE: &str = "objectId";

/// Push envelope delivered by the notification service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// Base64 encoded notification body. Not needed to locate the object.
    #[serde(default)]
    pub data: Option<String>,

    #[serde(default)]
    pub attributes: HashMap<String, String>,

    #[serde(default)]
    pub message_id: String,
}

impl PushMessage {
    /// The object this notification refers to.
    pub fn locator(&self) -> Result<ObjectLocator, PushError> {
        let attribute = |key: &str| self.attributes.get(key).filter(|v| !v.is_empty());
        let bucket = attribute(BUCKET_ID_ATTRIBUTE).ok_or(PushError::MissingBucketId)?;
        let object = attribute(OBJECT_ID_ATTRIBUTE).ok_or(PushError::MissingObjectId)?;
        Ok(ObjectLocator::new(bucket.as_str(), object.as_str()))
    }

    /// Decoded `data`, empty when absent.
    pub fn decoded_data(&self) -> Result<Vec<u8>, PushError> {
        match self.data.as_deref() {
            None | Some("") => Ok(Vec::new()),
            Some(data) => Ok(STANDARD.decode(data)?),
        }
    }
}

/// Create the HTTP router for a handler of records of type `T`.
pub fn create_router<T: Record>(handler: Arc<EventHandler<T>>) -> Router {
    Router::new()
        .route("/", post(handle_push::<T>))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

/// Handle POST requests to / (one storage notification).
async fn handle_push<T: Record>(
    State(handler): State<Arc<EventHandler<T>>>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), PushError> {
    let envelope: PushEnvelope = serde_json::from_slice(&body)?;
    let data = envelope.message.decoded_data()?;
    let locator = envelope.message.locator()?;

    let span = tracing::info_span!(
        "push",
        request_id = %Uuid::new_v4(),
        message_id = %envelope.message.message_id,
        bucket = %locator.bucket,
        object = %locator.object,
    );

    async {
        tracing::debug!(
            subscription = %envelope.subscription,
            data_bytes = data.len(),
            "Received notification"
        );
        match handler.handle(&locator).await {
            Ok(()) => Ok((StatusCode::CREATED, "OK")),
            Err(e) => {
                tracing::error!(error = %e, "Failed to handle notification");
                Err(PushError::from(e))
            }
        }
    }
    .instrument(span)
    .await
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "service": "pmap-server" }))
}
