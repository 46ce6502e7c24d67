//! # pmap-enrich
//!
//! Enriches resource mappings with metadata looked up in a resource
//! inventory.
//!
//! For a record whose provider is supported, the
//! [`ResourceEnrichmentProcessor`]:
//!
//! 1. resolves the search scope from the resource name (falling back to a
//!    configured default),
//! 2. searches the inventory for exactly one resource with that name,
//! 3. collects the IAM policies bound to it,
//! 4. builds an [`EnrichmentBundle`] and merges it into the record's
//!    annotations under the reserved key.
//!
//! Records for other providers pass through untouched.

pub mod bundle;
pub mod error;
pub mod inventory;
pub mod processor;
pub mod scope;

pub use bundle::EnrichmentBundle;
pub use error::{EnrichError, InventoryError};
pub use inventory::{
    Binding, IamPolicySearchResult, Inventory, Page, Policy, ResourceSearchResult, SearchRequest,
    StaticInventory,
};
pub use processor::{ResourceEnrichmentProcessor, SUPPORTED_PROVIDER};
pub use scope::resolve_scope;
