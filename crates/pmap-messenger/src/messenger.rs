//! Messenger backends.

use async_trait::async_trait;
use pmap_core::{MessengerBackend, MessengerConfig, OutcomeEvent};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;

use crate::error::MessengerError;

/// Destination for outcome events.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one event. No retry is attempted.
    async fn send(&self, event: &OutcomeEvent) -> Result<(), MessengerError>;
}

/// Create a messenger based on configuration.
pub fn create_messenger(config: &MessengerConfig) -> Result<Arc<dyn Messenger>, MessengerError> {
    match config.backend {
        MessengerBackend::Console => Ok(Arc::new(ConsoleMessenger::new())),
        MessengerBackend::File => {
            let path = config
                .file_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| MessengerError::Configuration("file backend requires file_path".to_string()))?;
            Ok(Arc::new(FileMessenger::new(path)))
        }
        MessengerBackend::Memory => {
            tracing::warn!("Memory messenger configured, outcome events will not be persisted");
            Ok(Arc::new(MemoryMessenger::new()))
        }
    }
}

/// Console messenger (one JSON line per event on stdout).
#[derive(Default)]
pub struct ConsoleMessenger {
    // Serializes writes so concurrent requests never interleave lines.
    write_lock: tokio::sync::Mutex<()>,
}

impl ConsoleMessenger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send(&self, event: &OutcomeEvent) -> Result<(), MessengerError> {
        let mut line = event.to_bytes()?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&line).await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// File messenger (appends JSON Lines to a file).
pub struct FileMessenger {
    path: PathBuf,
    // Serializes appends so concurrent requests never interleave lines.
    write_lock: tokio::sync::Mutex<()>,
}

impl FileMessenger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Messenger for FileMessenger {
    async fn send(&self, event: &OutcomeEvent) -> Result<(), MessengerError> {
        let mut line = event.to_bytes()?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        tracing::debug!(path = %self.path.display(), "Outcome event appended");
        Ok(())
    }
}

/// In-memory messenger. Keeps every event it is sent.
#[derive(Default)]
pub struct MemoryMessenger {
    events: Mutex<Vec<OutcomeEvent>>,
}

impl MemoryMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<OutcomeEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Messenger for MemoryMessenger {
    async fn send(&self, event: &OutcomeEvent) -> Result<(), MessengerError> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| std::io::Error::other(format!("messenger lock poisoned: {}", e)))?;
        events.push(event.clone());
        Ok(())
    }
}
