//! Resource enrichment configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Scope keywords accepted in a search scope.
pub const SCOPE_KEYWORDS: [&str; 3] = ["projects", "folders", "organizations"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Scope searched when the resource name carries none, e.g. "organizations/123".
    pub default_scope: String,

    /// JSON snapshot answering inventory searches.
    pub inventory_snapshot: PathBuf,

    /// Results requested per inventory page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    500
}

impl EnrichmentConfig {
    pub(crate) fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !is_scope(&self.default_scope) {
            problems.push(format!(
                "enrichment.default_scope {:?} must look like projects/<id>, folders/<id> or organizations/<id>",
                self.default_scope
            ));
        }
        if self.page_size == 0 {
            problems.push("enrichment.page_size must be greater than zero".to_string());
        }
        problems
    }
}

fn is_scope(scope: &str) -> bool {
    match scope.split_once('/') {
        Some((keyword, id)) => SCOPE_KEYWORDS.contains(&keyword) && !id.is_empty() && !id.contains('/'),
        None => false,
    }
}
