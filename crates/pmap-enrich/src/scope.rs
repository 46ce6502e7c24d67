//! Search scope resolution.

use pmap_core::config::enrichment::SCOPE_KEYWORDS;

use crate::error::EnrichError;

/// Extract the search scope from a full resource name.
///
/// Scans the slash-delimited name for `projects`, `folders` or
/// `organizations`; the segment after the keyword is the scope ID. When the
/// name holds several keywords the last one wins. Returns an empty string
/// when the name holds none.
///
/// ```
/// use pmap_enrich::resolve_scope;
///
/// let scope = resolve_scope("//bigquery.googleapis.com/projects/p1/datasets/d").unwrap();
/// assert_eq!(scope, "projects/p1");
/// assert_eq!(resolve_scope("//storage.googleapis.com/bucket1").unwrap(), "");
/// ```
pub fn resolve_scope(name: &str) -> Result<String, EnrichError> {
    let segments: Vec<&str> = name.split('/').collect();
    let mut scope = String::new();

    for (i, segment) in segments.iter().enumerate() {
        if !SCOPE_KEYWORDS.contains(segment) {
            continue;
        }
        match segments.get(i + 1) {
            Some(id) if !id.is_empty() => scope = format!("{}/{}", segment, id),
            _ => {
                return Err(EnrichError::InvalidResourceName {
                    name: name.to_string(),
                    keyword: segment.to_string(),
                });
            }
        }
    }

    Ok(scope)
}
