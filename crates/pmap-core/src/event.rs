//! Outcome events.
//!
//! An [`OutcomeEvent`] wraps a processed record together with the provenance
//! of the file it came from. One event is created per successfully decoded
//! record and delivered to exactly one messenger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::Record;

/// Object metadata keys the provenance is read from.
pub mod metadata_keys {
    pub const REPO: &str = "git-repo";
    pub const COMMIT: &str = "git-commit";
    pub const WORKFLOW: &str = "git-workflow";
    pub const WORKFLOW_SHA: &str = "git-workflow-sha";
    pub const WORKFLOW_TRIGGERED_TIMESTAMP: &str = "git-workflow-triggered-timestamp";
    pub const WORKFLOW_RUN_ID: &str = "git-workflow-run-id";
    pub const WORKFLOW_RUN_ATTEMPT: &str = "git-workflow-run-attempt";
}

/// Where a record came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub repo_name: String,
    pub file_path: String,
    pub commit: String,
    pub workflow: String,
    pub workflow_sha: String,
    pub workflow_triggered_timestamp: String,
    pub workflow_run_id: String,
    pub workflow_run_attempt: String,
}

impl Provenance {
    /// Build provenance from the metadata attached to a stored object.
    ///
    /// Missing keys become empty strings.
    pub fn from_object_metadata(file_path: impl Into<String>, metadata: &HashMap<String, String>) -> Self {
        let get = |key: &str| metadata.get(key).cloned().unwrap_or_default();
        Self {
            repo_name: get(metadata_keys::REPO),
            file_path: file_path.into(),
            commit: get(metadata_keys::COMMIT),
            workflow: get(metadata_keys::WORKFLOW),
            workflow_sha: get(metadata_keys::WORKFLOW_SHA),
            workflow_triggered_timestamp: get(metadata_keys::WORKFLOW_TRIGGERED_TIMESTAMP),
            workflow_run_id: get(metadata_keys::WORKFLOW_RUN_ID),
            workflow_run_attempt: get(metadata_keys::WORKFLOW_RUN_ATTEMPT),
        }
    }
}

/// The message delivered to a messenger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    /// The record, serialized as JSON.
    pub payload: serde_json::Value,

    /// Record kind, e.g. "ResourceMapping".
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    pub provenance: Provenance,
}

impl OutcomeEvent {
    /// Wrap a record into an event stamped with the current time.
    pub fn new<T: Record>(record: &T, provenance: Provenance) -> Result<Self, serde_json::Error> {
        Ok(Self {
            payload: serde_json::to_value(record)?,
            event_type: T::KIND.to_string(),
            timestamp: Utc::now(),
            provenance,
        })
    }

    /// Serialize the event to the bytes placed on the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Resource, ResourceMapping};

    fn sample_metadata() -> HashMap<String, String> {
        HashMap::from([
            (metadata_keys::REPO.to_string(), "acme/privacy".to_string()),
            (metadata_keys::COMMIT.to_string(), "abc123".to_string()),
            (metadata_keys::WORKFLOW_RUN_ID.to_string(), "42".to_string()),
        ])
    }

    #[test]
    fn test_provenance_from_metadata() {
        let provenance = Provenance::from_object_metadata("mapping/abc.yaml", &sample_metadata());
        assert_eq!(provenance.repo_name, "acme/privacy");
        assert_eq!(provenance.file_path, "mapping/abc.yaml");
        assert_eq!(provenance.commit, "abc123");
        assert_eq!(provenance.workflow_run_id, "42");
        assert_eq!(provenance.workflow, "");
        assert_eq!(provenance.workflow_run_attempt, "");
    }

    #[test]
    fn test_event_wire_format() {
        let record = ResourceMapping {
            resource: Resource {
                provider: "gcp".to_string(),
                name: "//storage.googleapis.com/bucket1".to_string(),
                subscope: None,
            },
            ..Default::default()
        };
        let provenance = Provenance::from_object_metadata("mapping/abc.yaml", &sample_metadata());
        let event = OutcomeEvent::new(&record, provenance).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(value["type"], "ResourceMapping");
        assert_eq!(value["payload"]["resource"]["name"], "//storage.googleapis.com/bucket1");
        assert_eq!(value["provenance"]["repoName"], "acme/privacy");
        assert_eq!(value["provenance"]["filePath"], "mapping/abc.yaml");
        assert!(value["timestamp"].is_string());
    }
}
