//! Resource inventory search.
//!
//! [`Inventory`] is the boundary to the external asset inventory. Both
//! searches are paged; callers follow `next_page_token` until it is empty.
//! [`StaticInventory`] answers from a JSON snapshot and is used for local
//! runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::InventoryError;

/// A paged search within a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// e.g. "projects/my-project", "folders/123", "organizations/456".
    pub scope: String,
    /// e.g. `name="//storage.googleapis.com/bucket1"`.
    pub query: String,
    pub page_size: u32,
    pub page_token: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub results: Vec<T>,
    /// Empty or absent on the last page.
    pub next_page_token: Option<String>,
}

/// A resource known to the inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceSearchResult {
    pub name: String,
    pub asset_type: String,
    /// e.g. "projects/123".
    pub project: String,
    /// e.g. ["folders/1", "folders/2"].
    pub folders: Vec<String>,
    /// e.g. "organizations/456".
    pub organization: String,
    pub location: String,
    pub labels: BTreeMap<String, String>,
    pub create_time: Option<DateTime<Utc>>,
    pub tag_keys: Vec<String>,
    pub tag_values: Vec<String>,
}

/// An IAM policy attached to a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IamPolicySearchResult {
    pub resource: String,
    pub project: String,
    pub folders: Vec<String>,
    pub organization: String,
    pub policy: Policy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Binding {
    pub role: String,
    pub members: Vec<String>,
}

/// Resource inventory search client.
///
/// Implementations are shared between requests and must tolerate concurrent
/// use.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Search resources matching `request.query` within `request.scope`.
    async fn search_resources(&self, request: &SearchRequest) -> anyhow::Result<Page<ResourceSearchResult>>;

    /// Search IAM policies matching `request.query` within `request.scope`.
    async fn search_iam_policies(&self, request: &SearchRequest) -> anyhow::Result<Page<IamPolicySearchResult>>;
}

/// Inventory snapshot file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub resources: Vec<ResourceSearchResult>,
    pub iam_policies: Vec<IamPolicySearchResult>,
}

/// An [`Inventory`] backed by an in-memory snapshot.
///
/// Supports exact-match queries of the form `field="value"` on `name` (for
/// resources) and `resource` (for IAM policies). Page tokens are offsets.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    snapshot: Snapshot,
}

impl StaticInventory {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let content = fs::read_to_string(path.as_ref())?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            resources = snapshot.resources.len(),
            iam_policies = snapshot.iam_policies.len(),
            "Loaded inventory snapshot"
        );
        Ok(Self::new(snapshot))
    }
}

#[async_trait]
impl Inventory for StaticInventory {
    async fn search_resources(&self, request: &SearchRequest) -> anyhow::Result<Page<ResourceSearchResult>> {
        let name = parse_exact_query(&request.query, "name")?;
        let matches: Vec<_> = self
            .snapshot
            .resources
            .iter()
            .filter(|r| r.name == name)
            .filter(|r| in_scope(&request.scope, &r.project, &r.folders, &r.organization))
            .cloned()
            .collect();
        Ok(paginate(matches, request)?)
    }

    async fn search_iam_policies(&self, request: &SearchRequest) -> anyhow::Result<Page<IamPolicySearchResult>> {
        let resource = parse_exact_query(&request.query, "resource")?;
        let matches: Vec<_> = self
            .snapshot
            .iam_policies
            .iter()
            .filter(|p| p.resource == resource)
            .filter(|p| in_scope(&request.scope, &p.project, &p.folders, &p.organization))
            .cloned()
            .collect();
        Ok(paginate(matches, request)?)
    }
}

/// Parse `field="value"` and return `value`.
fn parse_exact_query<'a>(query: &'a str, field: &str) -> Result<&'a str, InventoryError> {
    query
        .strip_prefix(field)
        .and_then(|rest| rest.strip_prefix('='))
        .and_then(|rest| rest.strip_prefix('"'))
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| InventoryError::UnsupportedQuery(query.to_string()))
}

fn in_scope(scope: &str, project: &str, folders: &[String], organization: &str) -> bool {
    match scope.split_once('/') {
        Some(("projects", _)) => project == scope,
        Some(("folders", _)) => folders.iter().any(|f| f == scope),
        Some(("organizations", _)) => organization == scope,
        _ => false,
    }
}

fn paginate<T>(items: Vec<T>, request: &SearchRequest) -> Result<Page<T>, InventoryError> {
    let offset = match request.page_token.as_deref() {
        None | Some("") => 0,
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| InventoryError::InvalidPageToken(token.to_string()))?,
    };
    let page_size = request.page_size.max(1) as usize;
    let end = offset.saturating_add(page_size).min(items.len());
    let next_page_token = (end < items.len()).then(|| end.to_string());
    let results = items.into_iter().skip(offset).take(end.saturating_sub(offset)).collect();
    Ok(Page {
        results,
        next_page_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn resource(name: &str, project: &str) -> ResourceSearchResult {
        ResourceSearchResult {
            name: name.to_string(),
            project: project.to_string(),
            folders: vec!["folders/10".to_string()],
            organization: "organizations/1".to_string(),
            ..Default::default()
        }
    }

    fn request(scope: &str, query: &str, page_size: u32, page_token: Option<&str>) -> SearchRequest {
        SearchRequest {
            scope: scope.to_string(),
            query: query.to_string(),
            page_size,
            page_token: page_token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_search_filters_by_name_and_scope() {
        let inventory = StaticInventory::new(Snapshot {
            resources: vec![
                resource("//a/x", "projects/p1"),
                resource("//a/x", "projects/p2"),
                resource("//a/y", "projects/p1"),
            ],
            iam_policies: vec![],
        });

        let page = inventory
            .search_resources(&request("projects/p1", r#"name="//a/x""#, 10, None))
            .await
            .unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].project, "projects/p1");
        assert_eq!(page.next_page_token, None);

        let page = inventory
            .search_resources(&request("organizations/1", r#"name="//a/x""#, 10, None))
            .await
            .unwrap();
        assert_eq!(page.results.len(), 2);

        let page = inventory
            .search_resources(&request("folders/10", r#"name="//a/y""#, 10, None))
            .await
            .unwrap();
        assert_eq!(page.results.len(), 1);
    }

    #[tokio::test]
    async fn test_search_pages() {
        let inventory = StaticInventory::new(Snapshot {
            resources: vec![],
            iam_policies: (0..5)
                .map(|i| IamPolicySearchResult {
                    resource: "//a/x".to_string(),
                    organization: "organizations/1".to_string(),
                    policy: Policy {
                        bindings: vec![Binding {
                            role: format!("roles/r{i}"),
                            members: vec![],
                        }],
                    },
                    ..Default::default()
                })
                .collect(),
        });

        let query = r#"resource="//a/x""#;
        let first = inventory
            .search_iam_policies(&request("organizations/1", query, 2, None))
            .await
            .unwrap();
        assert_eq!(first.results.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));

        let last = inventory
            .search_iam_policies(&request("organizations/1", query, 2, Some("4")))
            .await
            .unwrap();
        assert_eq!(last.results.len(), 1);
        assert_eq!(last.results[0].policy.bindings[0].role, "roles/r4");
        assert_eq!(last.next_page_token, None);
    }

    #[tokio::test]
    async fn test_unsupported_query() {
        let inventory = StaticInventory::default();
        let err = inventory
            .search_resources(&request("projects/p", "name:x", 10, None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported query"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"resources": [{{"name": "//a/x", "project": "projects/p", "labels": {{"env": "prod"}}}}]}}"#
        )
        .unwrap();

        let inventory = StaticInventory::from_file(file.path()).unwrap();
        assert_eq!(inventory.snapshot.resources.len(), 1);
        assert_eq!(inventory.snapshot.resources[0].labels["env"], "prod");
        assert!(inventory.snapshot.iam_policies.is_empty());
    }
}
