//! Validation error types.
//!
//! A [`ValidationError`] describes one defect; a [`ValidationReport`] carries
//! every defect found in a record.

use std::fmt;

/// One defect found in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The kind of validation error.
    pub kind: ValidationErrorKind,
    /// Dotted path of the offending field, e.g. "contacts.emails[1]".
    pub field: String,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(kind: ValidationErrorKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ValidationErrorKind::MissingField,
            field,
            format!("{} is required", field),
        )
    }

    pub fn invalid_email(index: usize, email: &str, reason: &str) -> Self {
        Self::new(
            ValidationErrorKind::InvalidEmail,
            format!("contacts.emails[{}]", index),
            format!("invalid email {:?}: {}", email, reason),
        )
    }

    pub fn reserved_key(key: &str) -> Self {
        Self::new(
            ValidationErrorKind::ReservedKey,
            format!("annotations.{}", key),
            format!("reserved key is included in annotations: {:?}", key),
        )
    }

    pub fn subscope_not_lowercase(subscope: &str) -> Self {
        Self::new(
            ValidationErrorKind::SubscopeNotLowercase,
            "resource.subscope",
            format!("subscope {:?} must be all lowercase", subscope),
        )
    }

    pub fn subscope_invalid_url(subscope: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ValidationErrorKind::SubscopeInvalidUrl,
            "resource.subscope",
            format!("subscope {:?} is not a valid URL: {}", subscope, reason),
        )
    }

    pub fn subscope_query_order(subscope: &str, keys: &[&str]) -> Self {
        Self::new(
            ValidationErrorKind::SubscopeQueryOrder,
            "resource.subscope",
            format!(
                "subscope {:?} query keys are not in alphabetical order: [{}]",
                subscope,
                keys.join(", ")
            ),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required field is empty.
    MissingField,
    /// A contact email does not parse.
    InvalidEmail,
    /// The reserved enrichment key is already present.
    ReservedKey,
    /// The subscope contains uppercase characters.
    SubscopeNotLowercase,
    /// The subscope does not parse as a URL reference.
    SubscopeInvalidUrl,
    /// The subscope query keys are not strictly ascending.
    SubscopeQueryOrder,
}

/// Every defect found in one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if any error has the given kind.
    pub fn has_kind(&self, kind: ValidationErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// `Ok(())` when nothing was found, the report otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s): ", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}
