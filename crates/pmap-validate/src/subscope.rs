//! Subscope normalization rules.
//!
//! A subscope narrows a resource, e.g. `?location=us&zone=a` or
//! `//bigquery.googleapis.com/datasets/x?region=eu`. To keep equivalent
//! subscopes byte-identical it must be lowercase, and its query keys must be
//! in strictly ascending order.

use url::Url;

use crate::error::ValidationError;

/// Scheme-less subscopes are resolved against this base.
const BASE: &str = "subscope://pmap/";

/// Check a subscope and return every rule it breaks.
pub fn check_subscope(subscope: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if subscope.chars().any(char::is_uppercase) {
        errors.push(ValidationError::subscope_not_lowercase(subscope));
    }

    let parsed = match parse_reference(subscope) {
        Ok(url) => url,
        Err(e) => {
            errors.push(ValidationError::subscope_invalid_url(subscope, e));
            return errors;
        }
    };

    if let Some(query) = query_of(subscope, &parsed) {
        let keys = query_keys(&query);
        if !keys.windows(2).all(|w| w[0] < w[1]) {
            errors.push(ValidationError::subscope_query_order(subscope, &keys));
        }
    }

    errors
}

/// Parse an absolute URL or a URL reference relative to [`BASE`].
fn parse_reference(subscope: &str) -> Result<Url, url::ParseError> {
    let base = Url::parse(BASE)?;
    Url::options().base_url(Some(&base)).parse(subscope)
}

/// The query component of a subscope.
///
/// A subscope with no `?`, no `/` and at least one `=` is a bare
/// `key=value&...` list and is treated as a query in its own right.
fn query_of(subscope: &str, parsed: &Url) -> Option<String> {
    if subscope.contains('?') {
        return parsed.query().map(str::to_string);
    }
    let bare = subscope.split('#').next().unwrap_or_default();
    if !bare.contains('/') && bare.contains('=') {
        return Some(bare.to_string());
    }
    None
}

fn query_keys(query: &str) -> Vec<&str> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').map_or(pair, |(key, _)| key))
        .collect()
}
