//! The generic event handler.
//!
//! [`EventHandler`] turns a storage notification into exactly one outcome
//! event:
//!
//! ```text
//! Received → Fetching → Decoding → Processing(1..N) ─┬─ all ok  → success messenger → Done
//!                │           │                        └─ error i → failure messenger → Done(error)
//!                └───────────┴─ error → Aborted (nothing sent)
//! ```
//!
//! Handling is sequential within one notification. Dropping the future
//! returned by [`EventHandler::handle`] cancels whatever fetch, search or send
//! is in flight.

use pmap_core::{ConfigError, OutcomeEvent, Processor, Provenance, Record};
use pmap_messenger::Messenger;
use std::fmt;
use std::sync::Arc;

use crate::error::HandleError;
use crate::storage::{ObjectLocator, ObjectStore};

/// Largest object the handler will read.
pub const MAX_OBJECT_BYTES: u64 = 25_000_000;

/// Decodes, processes and routes records of type `T`.
pub struct EventHandler<T: Record> {
    store: Arc<dyn ObjectStore>,
    processors: Vec<Arc<dyn Processor<T>>>,
    success_messenger: Arc<dyn Messenger>,
    failure_messenger: Option<Arc<dyn Messenger>>,
    max_object_bytes: u64,
}

impl<T: Record> EventHandler<T> {
    pub fn builder() -> EventHandlerBuilder<T> {
        EventHandlerBuilder::new()
    }

    /// Number of configured processors.
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Handle the notification for one stored object.
    pub async fn handle(&self, locator: &ObjectLocator) -> Result<(), HandleError> {
        tracing::debug!(bucket = %locator.bucket, object = %locator.object, kind = T::KIND, "Fetching object");
        let object = self.store.fetch(locator, self.max_object_bytes).await?;

        let mut record = T::decode(&object.data).map_err(|source| HandleError::Decode {
            locator: locator.clone(),
            source,
        })?;

        let failure = self.run_processors(&mut record).await;

        let provenance = Provenance::from_object_metadata(&locator.object, &object.metadata);
        let event = OutcomeEvent::new(&record, provenance)?;

        match failure {
            None => {
                self.success_messenger.send(&event).await?;
                tracing::info!(
                    bucket = %locator.bucket,
                    object = %locator.object,
                    kind = T::KIND,
                    "Routed record to success messenger"
                );
                Ok(())
            }
            Some((processor, source)) => {
                tracing::warn!(
                    bucket = %locator.bucket,
                    object = %locator.object,
                    kind = T::KIND,
                    processor = %processor,
                    error = %format!("{:#}", source),
                    "Processor failed, routing record to failure messenger"
                );
                // The builder guarantees a failure messenger whenever
                // processors exist, and only processors can fail.
                if let Some(messenger) = &self.failure_messenger {
                    messenger.send(&event).await?;
                }
                Err(HandleError::Processing {
                    locator: locator.clone(),
                    processor,
                    source,
                })
            }
        }
    }

    /// Run the chain in order, stopping at the first error.
    async fn run_processors(&self, record: &mut T) -> Option<(String, anyhow::Error)> {
        for processor in &self.processors {
            tracing::debug!(processor = processor.name(), kind = T::KIND, "Running processor");
            if let Err(e) = processor.process(record).await {
                return Some((processor.name().to_string(), e));
            }
        }
        None
    }
}

impl<T: Record> fmt::Debug for EventHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let processors: Vec<&str> = self.processors.iter().map(|p| p.name()).collect();
        f.debug_struct("EventHandler")
            .field("kind", &T::KIND)
            .field("processors", &processors)
            .field("failure_messenger", &self.failure_messenger.is_some())
            .field("max_object_bytes", &self.max_object_bytes)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EventHandler`]. All dependencies are checked in
/// [`build`](Self::build).
pub struct EventHandlerBuilder<T: Record> {
    store: Option<Arc<dyn ObjectStore>>,
    processors: Vec<Arc<dyn Processor<T>>>,
    success_messenger: Option<Arc<dyn Messenger>>,
    failure_messenger: Option<Arc<dyn Messenger>>,
    max_object_bytes: u64,
}

impl<T: Record> Default for EventHandlerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> EventHandlerBuilder<T> {
    pub fn new() -> Self {
        Self {
            store: None,
            processors: Vec::new(),
            success_messenger: None,
            failure_messenger: None,
            max_object_bytes: MAX_OBJECT_BYTES,
        }
    }

    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Append a processor to the chain.
    pub fn processor(mut self, processor: Arc<dyn Processor<T>>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn success_messenger(mut self, messenger: Arc<dyn Messenger>) -> Self {
        self.success_messenger = Some(messenger);
        self
    }

    pub fn failure_messenger(mut self, messenger: Arc<dyn Messenger>) -> Self {
        self.failure_messenger = Some(messenger);
        self
    }

    /// Lower the object size cap. Values above [`MAX_OBJECT_BYTES`] are clamped.
    pub fn max_object_bytes(mut self, max_object_bytes: u64) -> Self {
        self.max_object_bytes = max_object_bytes.min(MAX_OBJECT_BYTES);
        self
    }

    pub fn build(self) -> Result<EventHandler<T>, ConfigError> {
        let store = self.store.ok_or(ConfigError::MissingObjectStore)?;
        let success_messenger = self.success_messenger.ok_or(ConfigError::MissingSuccessMessenger)?;
        if !self.processors.is_empty() && self.failure_messenger.is_none() {
            return Err(ConfigError::MissingFailureMessenger {
                processors: self.processors.len(),
            });
        }

        Ok(EventHandler {
            store,
            processors: self.processors,
            success_messenger,
            failure_messenger: self.failure_messenger,
            max_object_bytes: self.max_object_bytes,
        })
    }
}
