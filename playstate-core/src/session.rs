//! Session - the primary public API for a running script.
//!
//! A session wires the pieces together: one shared store (optionally backed
//! by a JSON snapshot file), one clock, a registry per domain created on
//! demand, and the inventory of declared items.

use crate::duration::{Clock, SystemClock};
use crate::ident::{Domain, QualifiedName};
use crate::inventory::Inventory;
use crate::item::{Item, ItemError};
use crate::persist::{JsonFileStore, PersistError};
use crate::registry::{RegistryConfig, RegistryError, StateRegistry};
use crate::rules::{ApplyRules, Rule};
use crate::store::{MemoryStore, PersistentStore, StoreError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the snapshot file.
pub const STORE_PATH_VAR: &str = "PLAYSTATE_STORE";
/// Environment variable naming the default domain.
pub const DOMAIN_VAR: &str = "PLAYSTATE_DOMAIN";

/// Errors from Session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Item error: {0}")]
    Item(#[from] ItemError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No item named {0} in the inventory")]
    UnknownItem(QualifiedName),
}

/// Configuration for creating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Domain used by `Session::registry` and item operations.
    pub default_domain: Domain,

    /// Reserved domain for last-used shadow records.
    pub last_used_domain: Domain,

    /// JSON snapshot file; the store is memory-only when unset.
    pub store_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            default_domain: Domain::default(),
            last_used_domain: Domain::last_used(),
            store_path: None,
        }
    }

    /// Load settings from the environment, reading a `.env` file if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::new();
        if let Ok(domain) = std::env::var(DOMAIN_VAR) {
            config.default_domain = Domain::new(domain);
        }
        if let Ok(path) = std::env::var(STORE_PATH_VAR) {
            if !path.is_empty() {
                config.store_path = Some(PathBuf::from(path));
            }
        }
        config
    }

    /// Set the default domain.
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.default_domain = domain;
        self
    }

    /// Set the reserved last-used domain.
    pub fn with_last_used_domain(mut self, domain: Domain) -> Self {
        self.last_used_domain = domain;
        self
    }

    /// Back the store with a JSON snapshot file.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Registry settings for `domain`.
    ///
    /// The default domain writes shadow records into the last-used domain
    /// itself; every other domain gets its own partition below it.
    pub fn registry_config(&self, domain: &Domain) -> RegistryConfig {
        let last_used = if domain.as_str() == Domain::DEFAULT {
            self.last_used_domain.clone()
        } else {
            Domain::new(format!("{}.{}", self.last_used_domain, domain))
        };
        RegistryConfig::for_domain(domain.clone()).with_last_used_domain(last_used)
    }
}

/// A running script session.
pub struct Session {
    config: SessionConfig,
    store: Arc<dyn PersistentStore>,
    file: Option<Arc<JsonFileStore>>,
    clock: Arc<dyn Clock>,
    registries: BTreeMap<Domain, StateRegistry>,
    inventory: Inventory,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("domains", &self.registries.keys().collect::<Vec<_>>())
            .field("items", &self.inventory.len())
            .finish()
    }
}

impl Session {
    /// Open a session, loading the snapshot file if one is configured.
    pub async fn open(config: SessionConfig) -> Result<Self, SessionError> {
        let file = match &config.store_path {
            Some(path) => Some(Arc::new(JsonFileStore::open(path.clone()).await?)),
            None => None,
        };
        let store: Arc<dyn PersistentStore> = match &file {
            Some(file) => file.clone() as Arc<dyn PersistentStore>,
            None => Arc::new(MemoryStore::new()),
        };

        info!(
            domain = %config.default_domain,
            snapshot = file.is_some(),
            "session opened"
        );
        let mut session = Self::with_store(config, store, Arc::new(SystemClock));
        session.file = file;
        Ok(session)
    }

    /// Create a session over an existing store and clock.
    pub fn with_store(
        config: SessionConfig,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            file: None,
            clock,
            registries: BTreeMap::new(),
            inventory: Inventory::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    /// Write the store to the snapshot file, if one is configured.
    pub async fn save(&self) -> Result<(), SessionError> {
        match &self.file {
            Some(file) => file.save().await?,
            None => debug!("session has no snapshot file, nothing to save"),
        }
        Ok(())
    }

    // =========================================================================
    // Registries
    // =========================================================================

    /// The registry of the default domain.
    pub fn registry(&mut self) -> &mut StateRegistry {
        let domain = self.config.default_domain.clone();
        self.domain(&domain)
    }

    /// The registry of `domain`, created on first use.
    pub fn domain(&mut self, domain: &Domain) -> &mut StateRegistry {
        let Self {
            config,
            store,
            clock,
            registries,
            inventory,
            ..
        } = self;
        registries.entry(domain.clone()).or_insert_with(|| {
            let mut registry =
                StateRegistry::new(config.registry_config(domain), store.clone(), clock.clone());
            for kind in inventory.kinds() {
                registry.declare_item_kind(&kind);
            }
            debug!(domain = %domain, "created registry");
            registry
        })
    }

    /// Domains with a live registry.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.registries.keys()
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Declare an item in the inventory and every live registry.
    pub fn add_item(&mut self, item: Item) {
        for registry in self.registries.values_mut() {
            registry.declare_item_kind(item.kind());
        }
        self.inventory.add(item);
    }

    pub fn item(&self, name: &QualifiedName) -> Result<&Item, SessionError> {
        self.inventory
            .get(name)
            .ok_or_else(|| SessionError::UnknownItem(name.clone()))
    }

    /// Apply a declared item to its default peers.
    pub fn apply_item(&mut self, name: &QualifiedName) -> Result<(), SessionError> {
        let item = self.item(name)?.clone();
        item.apply(self.registry())?;
        Ok(())
    }

    /// Remove a declared item from everything it is applied to.
    pub fn remove_item(&mut self, name: &QualifiedName) -> Result<(), SessionError> {
        let item = self.item(name)?.clone();
        item.remove(self.registry())?;
        Ok(())
    }

    /// Whether every apply rule holds for a declared item.
    pub fn can_apply(&mut self, name: &QualifiedName) -> Result<bool, SessionError> {
        let item = self.item(name)?.clone();
        Ok(item.can_apply(self.registry())?)
    }

    /// Every apply rule that currently fails for a declared item.
    pub fn explain(&mut self, name: &QualifiedName) -> Result<Vec<Rule>, SessionError> {
        let item = self.item(name)?.clone();
        Ok(ApplyRules::default().explain(&item, self.registry())?)
    }
}
