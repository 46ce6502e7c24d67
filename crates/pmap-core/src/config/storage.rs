//! Object storage configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local directory standing in for object storage.
///
/// Objects live at `<root>/<bucket>/<object>`; optional metadata lives next to
/// each object in `<object>.metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("data/objects")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: default_root() }
    }
}
