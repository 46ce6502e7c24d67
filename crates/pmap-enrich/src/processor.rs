//! The resource enrichment processor.

use async_trait::async_trait;
use pmap_core::{Processor, RESERVED_ANNOTATION_KEY, ResourceMapping};
use std::collections::HashSet;
use std::sync::Arc;

use crate::bundle::EnrichmentBundle;
use crate::error::EnrichError;
use crate::inventory::{IamPolicySearchResult, Inventory, ResourceSearchResult, SearchRequest};
use crate::scope::resolve_scope;

/// The only provider the inventory can answer for.
pub const SUPPORTED_PROVIDER: &str = "gcp";

const DEFAULT_PAGE_SIZE: u32 = 500;

/// Merges inventory metadata into a record's annotations.
pub struct ResourceEnrichmentProcessor {
    inventory: Arc<dyn Inventory>,
    default_scope: String,
    page_size: u32,
}

impl ResourceEnrichmentProcessor {
    /// Create a processor that searches `default_scope` when a resource name
    /// carries no scope of its own.
    pub fn new(inventory: Arc<dyn Inventory>, default_scope: impl Into<String>) -> Self {
        Self {
            inventory,
            default_scope: default_scope.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enrich a record in place.
    ///
    /// Records for unsupported providers are left untouched and cause no
    /// inventory calls.
    pub async fn enrich(&self, record: &mut ResourceMapping) -> Result<(), EnrichError> {
        if record.resource.provider != SUPPORTED_PROVIDER {
            tracing::debug!(
                provider = %record.resource.provider,
                resource = %record.resource.name,
                "Skipping enrichment for unsupported provider"
            );
            return Ok(());
        }

        let name = record.resource.name.as_str();
        let mut scope = resolve_scope(name)?;
        if scope.is_empty() {
            scope = self.default_scope.clone();
        }

        let mut resources = self.search_resources(&scope, name).await?;
        if resources.len() != 1 {
            return Err(EnrichError::MatchCount {
                count: resources.len(),
                name: name.to_string(),
                scope,
            });
        }
        let resource = resources.remove(0);

        let policies = self.search_iam_policies(&scope, name).await?;

        tracing::info!(
            resource = %name,
            scope = %scope,
            iam_policies = policies.len(),
            "Enriching resource mapping"
        );

        EnrichmentBundle::from_search(&resource, policies)
            .merge_into(&mut record.annotations, RESERVED_ANNOTATION_KEY)?;
        Ok(())
    }

    async fn search_resources(&self, scope: &str, name: &str) -> Result<Vec<ResourceSearchResult>, EnrichError> {
        let mut request = self.request(scope, format!("name=\"{}\"", name));
        let mut results = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let page = self
                .inventory
                .search_resources(&request)
                .await
                .map_err(|source| EnrichError::ResourceSearch {
                    scope: scope.to_string(),
                    source,
                })?;
            results.extend(page.results);
            match next_token(&mut seen, page.next_page_token, "resources", scope)? {
                Some(token) => request.page_token = Some(token),
                None => return Ok(results),
            }
        }
    }

    async fn search_iam_policies(&self, scope: &str, name: &str) -> Result<Vec<IamPolicySearchResult>, EnrichError> {
        let mut request = self.request(scope, format!("resource=\"{}\"", name));
        let mut results = Vec::new();
        let mut seen = HashSet::new();
        loop {
            let page = self
                .inventory
                .search_iam_policies(&request)
                .await
                .map_err(|source| EnrichError::IamPolicySearch {
                    scope: scope.to_string(),
                    source,
                })?;
            results.extend(page.results);
            match next_token(&mut seen, page.next_page_token, "IAM policies", scope)? {
                Some(token) => request.page_token = Some(token),
                None => return Ok(results),
            }
        }
    }

    fn request(&self, scope: &str, query: String) -> SearchRequest {
        SearchRequest {
            scope: scope.to_string(),
            query,
            page_size: self.page_size,
            page_token: None,
        }
    }
}

/// The token to request next, or `None` on the last page.
///
/// A token the inventory already handed out would restart a page already
/// read, so it ends the search with an error.
fn next_token(
    seen: &mut HashSet<String>,
    token: Option<String>,
    search: &'static str,
    scope: &str,
) -> Result<Option<String>, EnrichError> {
    match token {
        Some(token) if !token.is_empty() => {
            if !seen.insert(token.clone()) {
                return Err(EnrichError::RepeatedPageToken {
                    search,
                    scope: scope.to_string(),
                    token,
                });
            }
            Ok(Some(token))
        }
        _ => Ok(None),
    }
}

#[async_trait]
impl Processor<ResourceMapping> for ResourceEnrichmentProcessor {
    fn name(&self) -> &str {
        "resource-enrichment"
    }

    async fn process(&self, record: &mut ResourceMapping) -> anyhow::Result<()> {
        self.enrich(record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{Binding, Page, Policy};
    use pmap_core::Resource;
    use serde_json::json;
    use std::sync::Mutex;

    /// Inventory double that records every request and serves fixed pages.
    #[derive(Default)]
    struct RecordingInventory {
        resource_pages: Vec<Vec<ResourceSearchResult>>,
        policy_pages: Vec<Vec<IamPolicySearchResult>>,
        fail_resources: bool,
        /// Every page claims another page follows under this token.
        stuck_token: Option<String>,
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl RecordingInventory {
        fn calls(&self) -> Vec<SearchRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn page<T: Clone>(pages: &[Vec<T>], request: &SearchRequest) -> Page<T> {
            let index: usize = request.page_token.as_deref().map_or(0, |t| t.parse().unwrap_or(pages.len()));
            Page {
                results: pages.get(index).cloned().unwrap_or_default(),
                next_page_token: (index + 1 < pages.len()).then(|| (index + 1).to_string()),
            }
        }
    }

    #[async_trait]
    impl Inventory for RecordingInventory {
        async fn search_resources(&self, request: &SearchRequest) -> anyhow::Result<Page<ResourceSearchResult>> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_resources {
                anyhow::bail!("permission denied");
            }
            let mut page = Self::page(&self.resource_pages, request);
            if let Some(token) = &self.stuck_token {
                page.next_page_token = Some(token.clone());
            }
            Ok(page)
        }

        async fn search_iam_policies(&self, request: &SearchRequest) -> anyhow::Result<Page<IamPolicySearchResult>> {
            self.requests.lock().unwrap().push(request.clone());
            let mut page = Self::page(&self.policy_pages, request);
            if let Some(token) = &self.stuck_token {
                page.next_page_token = Some(token.clone());
            }
            Ok(page)
        }
    }

    fn record(provider: &str, name: &str) -> ResourceMapping {
        let mut record = ResourceMapping {
            resource: Resource {
                provider: provider.to_string(),
                name: name.to_string(),
                subscope: None,
            },
            ..Default::default()
        };
        record.annotations.insert("owner".to_string(), json!("team-a"));
        record
    }

    fn bucket() -> ResourceSearchResult {
        ResourceSearchResult {
            name: "//storage.googleapis.com/bucket1".to_string(),
            project: "projects/123".to_string(),
            organization: "organizations/1".to_string(),
            location: "us".to_string(),
            ..Default::default()
        }
    }

    fn policy(role: &str) -> IamPolicySearchResult {
        IamPolicySearchResult {
            resource: "//storage.googleapis.com/bucket1".to_string(),
            policy: Policy {
                bindings: vec![Binding {
                    role: role.to_string(),
                    members: vec!["group:g@example.com".to_string()],
                }],
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unsupported_provider_is_noop() {
        let inventory = Arc::new(RecordingInventory::default());
        let processor = ResourceEnrichmentProcessor::new(inventory.clone(), "organizations/1");

        let mut mapping = record("aws", "arn:aws:s3:::bucket1");
        let before = mapping.clone();
        processor.enrich(&mut mapping).await.unwrap();

        assert_eq!(mapping, before);
        assert!(inventory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_enriches_with_default_scope() {
        let inventory = Arc::new(RecordingInventory {
            resource_pages: vec![vec![bucket()]],
            policy_pages: vec![vec![policy("roles/a")], vec![policy("roles/b")]],
            ..Default::default()
        });
        let processor = ResourceEnrichmentProcessor::new(inventory.clone(), "organizations/1").with_page_size(1);

        let mut mapping = record(SUPPORTED_PROVIDER, "//storage.googleapis.com/bucket1");
        processor.enrich(&mut mapping).await.unwrap();

        let info = &mapping.annotations[RESERVED_ANNOTATION_KEY];
        assert_eq!(info["ancestors"], json!(["organizations/1", "projects/123"]));
        assert_eq!(info["location"], "us");
        assert_eq!(info["iamPolicies"].as_array().unwrap().len(), 2);
        assert_eq!(mapping.annotations["owner"], "team-a");

        let calls = inventory.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.scope == "organizations/1" && c.page_size == 1));
        assert_eq!(calls[0].query, r#"name="//storage.googleapis.com/bucket1""#);
        assert_eq!(calls[1].query, r#"resource="//storage.googleapis.com/bucket1""#);
        assert_eq!(calls[2].page_token.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_scope_from_resource_name() {
        let inventory = Arc::new(RecordingInventory {
            resource_pages: vec![vec![bucket()]],
            ..Default::default()
        });
        let processor = ResourceEnrichmentProcessor::new(inventory.clone(), "organizations/1");

        let mut mapping = record(SUPPORTED_PROVIDER, "//bigquery.googleapis.com/projects/p9/datasets/d");
        processor.enrich(&mut mapping).await.unwrap();

        assert!(inventory.calls().iter().all(|c| c.scope == "projects/p9"));
    }

    #[tokio::test]
    async fn test_resources_collected_across_pages() {
        let inventory = Arc::new(RecordingInventory {
            resource_pages: vec![vec![bucket()], vec![bucket()]],
            ..Default::default()
        });
        let processor = ResourceEnrichmentProcessor::new(inventory, "organizations/1");

        let mut mapping = record(SUPPORTED_PROVIDER, "//storage.googleapis.com/bucket1");
        let err = processor.enrich(&mut mapping).await.unwrap_err();
        assert!(matches!(err, EnrichError::MatchCount { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_zero_matches_leaves_record_unchanged() {
        let inventory = Arc::new(RecordingInventory::default());
        let processor = ResourceEnrichmentProcessor::new(inventory.clone(), "organizations/1");

        let mut mapping = record(SUPPORTED_PROVIDER, "//storage.googleapis.com/bucket1");
        let before = mapping.clone();
        let err = processor.enrich(&mut mapping).await.unwrap_err();

        assert!(err.to_string().contains("0 matched resources found, expected 1"));
        assert_eq!(mapping, before);
        // IAM search is never attempted
        assert_eq!(inventory.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_resource_name_makes_no_calls() {
        let inventory = Arc::new(RecordingInventory::default());
        let processor = ResourceEnrichmentProcessor::new(inventory.clone(), "organizations/1");

        let mut mapping = record(SUPPORTED_PROVIDER, "//bigquery.googleapis.com/projects//datasets/d");
        let err = processor.process(&mut mapping).await.unwrap_err();

        assert!(err.to_string().contains("invalid resource name"));
        assert!(inventory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure() {
        let inventory = Arc::new(RecordingInventory {
            fail_resources: true,
            ..Default::default()
        });
        let processor = ResourceEnrichmentProcessor::new(inventory, "organizations/1");

        let mut mapping = record(SUPPORTED_PROVIDER, "//storage.googleapis.com/bucket1");
        let err = processor.enrich(&mut mapping).await.unwrap_err();
        assert!(matches!(err, EnrichError::ResourceSearch { .. }));
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_repeated_page_token_stops_search() {
        let inventory = Arc::new(RecordingInventory {
            resource_pages: vec![vec![bucket()]],
            stuck_token: Some("same".to_string()),
            ..Default::default()
        });
        let processor = ResourceEnrichmentProcessor::new(inventory.clone(), "organizations/1");

        let mut mapping = record(SUPPORTED_PROVIDER, "//storage.googleapis.com/bucket1");
        let before = mapping.clone();
        let err = processor.enrich(&mut mapping).await.unwrap_err();

        assert!(matches!(
            err,
            EnrichError::RepeatedPageToken { search: "resources", ref token, .. } if token == "same"
        ));
        assert_eq!(mapping, before);
        // First page, then the page behind "same", which hands out "same" again
        assert_eq!(inventory.calls().len(), 2);
    }

    #[test]
    fn test_next_token() {
        let mut seen = HashSet::new();
        assert_eq!(next_token(&mut seen, None, "resources", "projects/p").unwrap(), None);
        assert_eq!(next_token(&mut seen, Some(String::new()), "resources", "projects/p").unwrap(), None);
        assert_eq!(
            next_token(&mut seen, Some("1".to_string()), "resources", "projects/p").unwrap(),
            Some("1".to_string())
        );
        assert_eq!(
            next_token(&mut seen, Some("2".to_string()), "resources", "projects/p").unwrap(),
            Some("2".to_string())
        );
        assert!(next_token(&mut seen, Some("1".to_string()), "resources", "projects/p").is_err());
    }
}
