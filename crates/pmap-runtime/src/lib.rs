//! # pmap-runtime
//!
//! The notification-driven processing pipeline.
//!
//! ```text
//! notification (bucket, object)
//!       │
//!       ▼
//! ┌──────────────────────┐
//! │ EventHandler<T>      │
//! │ 1. fetch object      │  ← ObjectStore (25 MB cap)
//! │ 2. decode into T     │  ← Record::decode
//! │ 3. run processors    │  ← Processor<T>, stops at first error
//! │ 4. build event       │  ← OutcomeEvent + provenance
//! │ 5. route             │  → success or failure Messenger
//! └──────────────────────┘
//! ```
//!
//! A fetch or decode failure aborts the notification without sending
//! anything. Otherwise exactly one messenger receives exactly one event.

pub mod error;
pub mod handler;
pub mod storage;

pub use error::{HandleError, StorageError};
pub use handler::{EventHandler, EventHandlerBuilder, MAX_OBJECT_BYTES};
pub use storage::{LocalObjectStore, MemoryObjectStore, ObjectLocator, ObjectStore, StoredObject};
