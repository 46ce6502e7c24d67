//! # pmap-core
//!
//! Shared types for the pmap ingestion pipeline:
//!
//! - [`ResourceMapping`]: the record that lands in object storage
//! - [`Record`]: the decode contract every record type implements
//! - [`Processor`]: a pluggable step run against a decoded record
//! - [`OutcomeEvent`]: the envelope delivered to a messenger
//! - [`config`]: service configuration loaded at startup

// Configuration types shared across all pmap crates
pub mod config;

pub mod event;
pub mod processor;
pub mod record;

pub use config::{
    AppConfig, ConfigError, EnrichmentConfig, MessengerBackend, MessengerConfig, ServerConfig,
    StorageConfig, ValidationConfig,
};
pub use event::{OutcomeEvent, Provenance};
pub use processor::Processor;
pub use record::{Contacts, DecodeError, Record, Resource, ResourceMapping, RESERVED_ANNOTATION_KEY};
