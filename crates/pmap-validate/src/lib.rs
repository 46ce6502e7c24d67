//! pmap record validation
//!
//! Structural and semantic checks on decoded records. Unlike the processor
//! chain, validation never stops at the first defect: every problem found in
//! a record is collected into a single [`ValidationReport`].
//!
//! Checks performed on a [`ResourceMapping`](pmap_core::ResourceMapping):
//!
//! 1. **Required fields** - `resource.provider` and `resource.name`
//! 2. **Contacts** - every email parses as an RFC 5322 address
//! 3. **Annotations** - the reserved enrichment key is absent
//! 4. **Subscope** - lowercase, URL-parseable, query keys in ascending order

pub mod email;
pub mod error;
pub mod processor;
pub mod subscope;
pub mod validator;

pub use error::{ValidationError, ValidationErrorKind, ValidationReport};
pub use processor::ValidationProcessor;
pub use validator::MappingValidator;
