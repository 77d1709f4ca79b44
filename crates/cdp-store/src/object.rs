//! Object storage for raw JSON batches.
//!
//! Keys are forward-slash paths like `github-commits/2024-03-01/14-05-22.json`.
//! Because the ingestion stage keys objects by UTC timestamp, lexicographic
//! key order is chronological order, so `latest` is the greatest key.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use crate::error::{Result, StoreError};

/// A minimal blob store the pipeline stages hand batches through.
pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// All keys under `prefix`, sorted ascending.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// The most recent key under `prefix` (greatest in key order).
    fn latest(&self, prefix: &str) -> Result<Option<String>> {
        Ok(self.list(prefix)?.into_iter().next_back())
    }
}

/// Filesystem-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open the store, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|part| matches!(part, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.collect_keys(&path, keys)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let key = relative
                    .components()
                    .filter_map(|part| match part {
                        Component::Normal(segment) => segment.to_str(),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        tracing::debug!(key, bytes = bytes.len(), "stored object");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Err(StoreError::ObjectNotFound(key.to_string()));
        }
        Ok(fs::read(&path)?)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        self.collect_keys(&self.root, &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

/// In-memory store for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StoreError::Io(std::io::Error::other("store lock poisoned")))?;
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StoreError::Io(std::io::Error::other("store lock poisoned")))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound(key.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StoreError::Io(std::io::Error::other("store lock poisoned")))?;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
