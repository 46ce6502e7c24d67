//! Record types and the generic decode contract.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Annotation key owned by the enrichment processor.
///
/// Records must not carry this key when they are submitted.
pub const RESERVED_ANNOTATION_KEY: &str = "assetInfo";

/// Error decoding raw object bytes into a record.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a well-formed document or do not match the schema.
    #[error("failed to decode {kind}: {source}")]
    Schema {
        kind: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    /// The bytes are not valid UTF-8.
    #[error("failed to decode {kind}: content is not valid UTF-8")]
    Encoding { kind: &'static str },
}

/// A record type the event handler can decode and route.
///
/// Implementors get a zero value from [`Default`] and are populated from a
/// self-describing document (YAML, which also accepts JSON).
pub trait Record: Default + DeserializeOwned + Serialize + Send + Sync + 'static {
    /// Value of the outcome event `type` field.
    const KIND: &'static str;

    /// Decode a record from raw object bytes.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::Encoding { kind: Self::KIND })?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| DecodeError::Schema {
            kind: Self::KIND,
            source,
        })
    }
}

/// Maps a cloud resource to the people responsible for it, with free-form
/// data-classification annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceMapping {
    #[serde(default)]
    pub resource: Resource,

    #[serde(default)]
    pub contacts: Contacts,

    /// Free-form annotations. The enrichment processor writes under
    /// [`RESERVED_ANNOTATION_KEY`].
    #[serde(default)]
    pub annotations: serde_json::Map<String, serde_json::Value>,
}

impl Record for ResourceMapping {
    const KIND: &'static str = "ResourceMapping";
}

/// The resource a mapping describes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resource {
    /// Provider tag, e.g. "gcp".
    #[serde(default)]
    pub provider: String,

    /// Full resource name, e.g. "//storage.googleapis.com/my-bucket".
    #[serde(default)]
    pub name: String,

    /// Optional narrowing of the resource, e.g. "?location=us&zone=a".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contacts {
    #[serde(default)]
    pub emails: Vec<String>,
}
