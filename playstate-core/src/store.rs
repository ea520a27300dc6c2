//! Key/value backing store for persisted states.
//!
//! The store is an external collaborator: the engine only needs single-key
//! `has/get/set/clear` on string values addressed by domain, namespace and
//! property. Booleans are stored as `"true"`/`"false"`.

use crate::ident::{Domain, QualifiedName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Invalid boolean value {value:?} for {key}")]
    InvalidBool { key: StoreKey, value: String },

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Fully qualified address of one persisted value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    pub domain: String,
    pub namespace: String,
    pub property: String,
}

impl StoreKey {
    pub fn new(
        domain: impl Into<String>,
        namespace: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            namespace: namespace.into(),
            property: property.into(),
        }
    }

    /// Key of a property belonging to the named node, e.g. `name.state.peers`.
    pub fn for_name(domain: &Domain, name: &QualifiedName, suffix: &str) -> Self {
        let property = match name.guid() {
            Some(guid) => format!("{}.{}.{}", name.name(), guid, suffix),
            None => format!("{}.{}", name.name(), suffix),
        };
        Self::new(domain.as_str(), name.namespace(), property)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.domain.is_empty() {
            write!(f, "{}.{}", self.namespace, self.property)
        } else {
            write!(f, "{}/{}.{}", self.domain, self.namespace, self.property)
        }
    }
}

/// One entry of a batched write; `None` clears the key.
pub type BatchEntry = (StoreKey, Option<String>);

/// Durable string key/value storage.
pub trait PersistentStore: Send + Sync {
    fn has(&self, key: &StoreKey) -> Result<bool, StoreError>;
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &StoreKey, value: &str) -> Result<(), StoreError>;
    fn clear(&self, key: &StoreKey) -> Result<(), StoreError>;

    /// Write several keys. Backends that can apply the batch under one lock
    /// override this so the batch is observed as a whole.
    fn write_batch(&self, entries: Vec<BatchEntry>) -> Result<(), StoreError> {
        for (key, value) in entries {
            match value {
                Some(value) => self.set(&key, &value)?,
                None => self.clear(&key)?,
            }
        }
        Ok(())
    }

    fn get_bool(&self, key: &StoreKey) -> Result<Option<bool>, StoreError> {
        match self.get(key)? {
            None => Ok(None),
            Some(value) => match value.as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(StoreError::InvalidBool {
                    key: key.clone(),
                    value,
                }),
            },
        }
    }

    fn set_bool(&self, key: &StoreKey, value: bool) -> Result<(), StoreError> {
        self.set(key, if value { "true" } else { "false" })
    }
}

/// In-memory store, used by tests and as the working copy of snapshot files.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (StoreKey, String)>) -> Self {
        Self {
            values: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Copy of all entries, sorted by key.
    pub fn entries(&self) -> Result<Vec<(StoreKey, String)>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut entries: Vec<_> = values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PersistentStore for MemoryStore {
    fn has(&self, key: &StoreKey) -> Result<bool, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(values.contains_key(key))
    }

    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &StoreKey, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::LockPoisoned)?;
        values.insert(key.clone(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &StoreKey) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::LockPoisoned)?;
        values.remove(key);
        Ok(())
    }

    fn write_batch(&self, entries: Vec<BatchEntry>) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::LockPoisoned)?;
        for (key, value) in entries {
            match value {
                Some(value) => {
                    values.insert(key, value);
                }
                None => {
                    values.remove(&key);
                }
            }
        }
        Ok(())
    }
}
