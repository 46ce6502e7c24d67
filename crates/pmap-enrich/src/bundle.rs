//! Enrichment bundle construction and merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::inventory::{IamPolicySearchResult, Policy, ResourceSearchResult};

/// Metadata derived from the inventory for one resource.
///
/// Only non-empty fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentBundle {
    /// Organization, then folders, then project.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_keys: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub iam_policies: Vec<Policy>,
}

impl EnrichmentBundle {
    /// Derive a bundle from the matched resource and its IAM policies.
    pub fn from_search(resource: &ResourceSearchResult, policies: Vec<IamPolicySearchResult>) -> Self {
        let ancestors = std::iter::once(&resource.organization)
            .chain(resource.folders.iter())
            .chain(std::iter::once(&resource.project))
            .filter(|a| !a.is_empty())
            .cloned()
            .collect();

        Self {
            ancestors,
            location: resource.location.clone(),
            labels: resource.labels.clone(),
            create_time: resource.create_time,
            tag_keys: resource.tag_keys.clone(),
            tag_values: resource.tag_values.clone(),
            iam_policies: policies.into_iter().map(|p| p.policy).collect(),
        }
    }

    /// Write the bundle under `key`, replacing whatever was there.
    pub fn merge_into(
        &self,
        annotations: &mut serde_json::Map<String, serde_json::Value>,
        key: &str,
    ) -> Result<(), serde_json::Error> {
        annotations.insert(key.to_string(), serde_json::to_value(self)?);
        Ok(())
    }
}
