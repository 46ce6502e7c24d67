//! Messenger (outcome sink) configuration.

use serde::{Deserialize, Serialize};

/// Where outcome events are delivered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessengerConfig {
    #[serde(default)]
    pub backend: MessengerBackend,

    /// File path (for file backend).
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Messenger backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessengerBackend {
    /// One JSON line per event on stdout.
    #[default]
    Console,
    /// Append JSON Lines to a file.
    File,
    /// Keep events in memory (development only).
    Memory,
}

impl MessengerConfig {
    pub(crate) fn problems(&self, section: &str) -> Vec<String> {
        match (self.backend, self.file_path.as_deref()) {
            (MessengerBackend::File, None | Some("")) => {
                vec![format!("{section}.file_path is required for the file backend")]
            }
            _ => Vec::new(),
        }
    }
}
