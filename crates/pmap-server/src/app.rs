//! Application wiring.
//!
//! Builds the [`EventHandler`] for resource mappings from an [`AppConfig`].
//! The processor chain is the validator (unless disabled) followed by the
//! resource enrichment processor (when configured).

use anyhow::Context;
use pmap_core::{AppConfig, ResourceMapping};
use pmap_enrich::{ResourceEnrichmentProcessor, StaticInventory};
use pmap_messenger::create_messenger;
use pmap_runtime::{EventHandler, LocalObjectStore};
use pmap_validate::ValidationProcessor;
use std::sync::Arc;

/// Build the resource mapping handler described by `config`.
pub fn build_handler(config: &AppConfig) -> anyhow::Result<EventHandler<ResourceMapping>> {
    let mut builder = EventHandler::<ResourceMapping>::builder()
        .object_store(Arc::new(LocalObjectStore::new(config.storage.root.clone())));

    if config.validation.enabled {
        builder = builder.processor(Arc::new(ValidationProcessor::default()));
    }

    if let Some(enrichment) = &config.enrichment {
        let inventory = StaticInventory::from_file(&enrichment.inventory_snapshot).with_context(|| {
            format!(
                "failed to load inventory snapshot {}",
                enrichment.inventory_snapshot.display()
            )
        })?;
        let processor = ResourceEnrichmentProcessor::new(Arc::new(inventory), enrichment.default_scope.clone())
            .with_page_size(enrichment.page_size);
        builder = builder.processor(Arc::new(processor));
    }

    if let Some(messenger) = &config.success_messenger {
        builder = builder.success_messenger(create_messenger(messenger).context("success_messenger")?);
    }
    if let Some(messenger) = &config.failure_messenger {
        builder = builder.failure_messenger(create_messenger(messenger).context("failure_messenger")?);
    }

    let handler = builder.build()?;
    tracing::info!(
        processors = handler.processor_count(),
        storage_root = %config.storage.root.display(),
        "Event handler ready"
    );
    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmap_core::ConfigError;

    #[test]
    fn test_build_without_enrichment() {
        let config = AppConfig::from_toml(
            r#"
[success_messenger]
backend = "memory"

[failure_messenger]
backend = "memory"
"#,
        )
        .unwrap();

        let handler = build_handler(&config).unwrap();
        assert_eq!(handler.processor_count(), 1);
    }

    #[test]
    fn test_build_with_enrichment_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("inventory.json");
        std::fs::write(&snapshot, r#"{"resources": [], "iamPolicies": []}"#).unwrap();

        let config = AppConfig::from_toml(&format!(
            r#"
[enrichment]
default_scope = "organizations/1"
inventory_snapshot = {:?}

[success_messenger]
backend = "memory"

[failure_messenger]
backend = "memory"
"#,
            snapshot.display().to_string()
        ))
        .unwrap();

        let handler = build_handler(&config).unwrap();
        assert_eq!(handler.processor_count(), 2);
    }

    #[test]
    fn test_build_missing_failure_messenger() {
        let config = AppConfig::from_toml(
            r#"
[success_messenger]
backend = "console"
"#,
        )
        .unwrap();

        let err = build_handler(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingFailureMessenger { processors: 1 })
        ));
    }

    #[test]
    fn test_build_missing_snapshot() {
        let config = AppConfig::from_toml(
            r#"
[enrichment]
default_scope = "organizations/1"
inventory_snapshot = "/nonexistent/inventory.json"

[success_messenger]
backend = "memory"

[failure_messenger]
backend = "memory"
"#,
        )
        .unwrap();

        let err = build_handler(&config).unwrap_err();
        assert!(err.to_string().contains("failed to load inventory snapshot"));
    }
}
