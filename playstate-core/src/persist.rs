//! JSON snapshot files for the key/value store.
//!
//! A [`JsonFileStore`] serves reads and writes from memory and is flushed
//! to a versioned JSON file on [`JsonFileStore::save`], in the same manner
//! campaigns are saved: whole-file, human readable, version checked on load.

use crate::store::{BatchEntry, MemoryStore, PersistentStore, StoreError, StoreKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;
use tracing::info;

/// Errors from snapshot file operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current snapshot file version.
const SNAPSHOT_VERSION: u32 = 1;

/// One persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEntry {
    #[serde(default)]
    pub domain: String,
    pub namespace: String,
    pub property: String,
    pub value: String,
}

/// The on-disk form of a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedStore {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the snapshot was written (seconds since the epoch).
    pub saved_at: String,

    /// All entries, sorted by key.
    pub entries: Vec<SavedEntry>,
}

impl SavedStore {
    /// Capture the current contents of a memory store.
    pub fn capture(store: &MemoryStore) -> Result<Self, PersistError> {
        let entries = store
            .entries()?
            .into_iter()
            .map(|(key, value)| SavedEntry {
                domain: key.domain,
                namespace: key.namespace,
                property: key.property,
                value,
            })
            .collect();

        Ok(Self {
            version: SNAPSHOT_VERSION,
            saved_at: timestamp_now(),
            entries,
        })
    }

    /// Build a memory store from the snapshot.
    pub fn into_store(self) -> MemoryStore {
        MemoryStore::from_entries(self.entries.into_iter().map(|entry| {
            (
                StoreKey::new(entry.domain, entry.namespace, entry.property),
                entry.value,
            )
        }))
    }

    /// Decode a snapshot, rejecting other format versions.
    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        let saved: Self = serde_json::from_str(content)?;
        match saved.version {
            SNAPSHOT_VERSION => Ok(saved),
            found => Err(PersistError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found,
            }),
        }
    }
}

/// A memory-backed store bound to a snapshot file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl JsonFileStore {
    /// Open the snapshot at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let memory = if fs::try_exists(&path).await? {
            let saved = SavedStore::from_json(&fs::read_to_string(&path).await?)?;
            info!(path = %path.display(), entries = saved.entries.len(), "loaded state snapshot");
            saved.into_store()
        } else {
            MemoryStore::new()
        };

        Ok(Self { path, memory })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current contents to the snapshot file.
    pub async fn save(&self) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let saved = SavedStore::capture(&self.memory)?;
        fs::write(&self.path, serde_json::to_string_pretty(&saved)?).await?;
        info!(path = %self.path.display(), entries = saved.entries.len(), "saved state snapshot");
        Ok(())
    }
}

impl PersistentStore for JsonFileStore {
    fn has(&self, key: &StoreKey) -> Result<bool, StoreError> {
        self.memory.has(key)
    }

    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        self.memory.get(key)
    }

    fn set(&self, key: &StoreKey, value: &str) -> Result<(), StoreError> {
        self.memory.set(key, value)
    }

    fn clear(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.memory.clear(key)
    }

    fn write_batch(&self, entries: Vec<BatchEntry>) -> Result<(), StoreError> {
        self.memory.write_batch(entries)
    }
}

fn timestamp_now() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", now.as_secs())
}
