//! Resource mapping validator.
//!
//! The [`MappingValidator`] runs every check against a record and collects
//! all defects. It is used inline as the first processor of the chain and by
//! the `pmap validate` batch tool.

use pmap_core::{RESERVED_ANNOTATION_KEY, ResourceMapping};

use crate::email::parse_mailbox;
use crate::error::{ValidationError, ValidationReport};
use crate::subscope::check_subscope;

/// Validates [`ResourceMapping`] records.
#[derive(Debug, Clone)]
pub struct MappingValidator {
    reserved_key: String,
}

impl Default for MappingValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingValidator {
    pub fn new() -> Self {
        Self {
            reserved_key: RESERVED_ANNOTATION_KEY.to_string(),
        }
    }

    /// Validate a record.
    ///
    /// Returns `Ok(())` if the record is valid, or a report with every
    /// defect found.
    pub fn validate(&self, mapping: &ResourceMapping) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::new();

        // 1. Required fields
        if mapping.resource.provider.is_empty() {
            report.push(ValidationError::missing_field("resource.provider"));
        }
        if mapping.resource.name.is_empty() {
            report.push(ValidationError::missing_field("resource.name"));
        }

        // 2. Contacts
        for (index, email) in mapping.contacts.emails.iter().enumerate() {
            if let Err(reason) = parse_mailbox(email) {
                report.push(ValidationError::invalid_email(index, email, reason));
            }
        }

        // 3. Annotations
        if mapping.annotations.contains_key(&self.reserved_key) {
            report.push(ValidationError::reserved_key(&self.reserved_key));
        }

        // 4. Subscope
        if let Some(subscope) = &mapping.resource.subscope {
            report.extend(check_subscope(subscope));
        }

        if !report.is_empty() {
            tracing::debug!(
                resource = %mapping.resource.name,
                errors = report.len(),
                "Resource mapping failed validation"
            );
        }

        report.into_result()
    }
}
