//! Object storage access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;
use tokio::io::AsyncReadExt;

use crate::error::StorageError;

/// Identifies exactly one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocator {
    pub bucket: String,
    pub object: String,
}

impl ObjectLocator {
    pub fn new(bucket: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.object)
    }
}

/// Object content together with its metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

/// Read access to object storage.
///
/// Implementations are shared between requests and must tolerate concurrent
/// use.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object, failing with [`StorageError::TooLarge`] when it holds
    /// more than `max_bytes`.
    async fn fetch(&self, locator: &ObjectLocator, max_bytes: u64) -> Result<StoredObject, StorageError>;
}

/// Object store backed by a local directory.
///
/// Objects live at `<root>/<bucket>/<object>`. Metadata, when present, lives
/// in `<root>/<bucket>/<object>.metadata.json` as a flat string map.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, locator: &ObjectLocator) -> Result<PathBuf, StorageError> {
        let relative = Path::new(&locator.bucket).join(&locator.object);
        let only_normal = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if locator.bucket.is_empty() || locator.object.is_empty() || locator.bucket.contains('/') || !only_normal {
            return Err(StorageError::InvalidLocator(locator.clone()));
        }
        Ok(self.root.join(relative))
    }

    async fn read_metadata(&self, locator: &ObjectLocator, path: &Path) -> Result<HashMap<String, String>, StorageError> {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(".metadata.json");

        match tokio::fs::read(&sidecar).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|source| StorageError::Metadata {
                locator: locator.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(source) => Err(StorageError::Io {
                locator: locator.clone(),
                source,
            }),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, locator: &ObjectLocator, max_bytes: u64) -> Result<StoredObject, StorageError> {
        let path = self.object_path(locator)?;
        let io_error = |source: std::io::Error| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(locator.clone())
            } else {
                StorageError::Io {
                    locator: locator.clone(),
                    source,
                }
            }
        };

        let file = tokio::fs::File::open(&path).await.map_err(io_error)?;
        let mut data = Vec::new();
        // Read one byte past the cap so an oversized object is detected
        // without reading it whole.
        file.take(max_bytes.saturating_add(1))
            .read_to_end(&mut data)
            .await
            .map_err(io_error)?;
        if data.len() as u64 > max_bytes {
            return Err(StorageError::TooLarge {
                locator: locator.clone(),
                limit: max_bytes,
            });
        }

        let metadata = self.read_metadata(locator, &path).await?;
        Ok(StoredObject { data, metadata })
    }
}

/// In-memory object store, for tests and local wiring.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectLocator, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, locator: ObjectLocator, object: StoredObject) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(locator, object);
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_object(self, locator: ObjectLocator, object: StoredObject) -> Self {
        self.insert(locator, object);
        self
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn fetch(&self, locator: &ObjectLocator, max_bytes: u64) -> Result<StoredObject, StorageError> {
        let objects = self.objects.read().map_err(|e| StorageError::Io {
            locator: locator.clone(),
            source: std::io::Error::other(format!("object store lock poisoned: {}", e)),
        })?;
        let object = objects
            .get(locator)
            .ok_or_else(|| StorageError::NotFound(locator.clone()))?;
        if object.data.len() as u64 > max_bytes {
            return Err(StorageError::TooLarge {
                locator: locator.clone(),
                limit: max_bytes,
            });
        }
        Ok(object.clone())
    }
}
