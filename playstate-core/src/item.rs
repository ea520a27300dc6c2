//! Items: named, optionally instanced views over the state of their kind.
//!
//! An [`Item`] owns no mutable data. Applying it links its kind's state with
//! the target peers and leaves two entries on every target: the kind, so
//! queries can ask for "any item of this kind", and the `kind:guid`
//! instance marker, so queries can ask for "this exact item". The kind's own
//! state also carries the instance marker while that instance is applied.
//!
//! Availability (inventory membership) is a separate persisted flag per
//! instance and is independent of whether the item is applied.

use crate::duration::Duration;
use crate::ident::{Attribute, QualifiedName};
use crate::registry::{RegistryError, StateHandle, StateRegistry};
use crate::rules::ApplyRules;
use crate::store::{StoreError, StoreKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Property suffix of the availability flag.
pub const AVAILABLE: &str = "available";

/// Errors from item operations.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Item {0} is not applied")]
    NotApplied(QualifiedName),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A kind of item, optionally narrowed to one physical instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    kind: QualifiedName,
    guid: Option<String>,
    display_name: String,
    #[serde(default)]
    default_peers: Vec<QualifiedName>,
    #[serde(default)]
    attributes: BTreeSet<QualifiedName>,
    #[serde(default)]
    blockers: Vec<QualifiedName>,
}

impl Item {
    /// Create an item. An instance identifier sets both kind and guid.
    pub fn new(name: QualifiedName) -> Self {
        let display_name = name.name().to_string();
        Self {
            kind: name.kind(),
            guid: name.guid().map(str::to_string),
            display_name,
            default_peers: Vec::new(),
            attributes: BTreeSet::new(),
            blockers: Vec::new(),
        }
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_default_peers(mut self, peers: impl IntoIterator<Item = QualifiedName>) -> Self {
        self.default_peers = peers.into_iter().collect();
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = QualifiedName>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn with_blockers(mut self, blockers: impl IntoIterator<Item = QualifiedName>) -> Self {
        self.blockers = blockers.into_iter().collect();
        self
    }

    /// A copy of this item describing a new physical instance.
    pub fn instance(&self) -> Self {
        self.clone().with_guid(Uuid::new_v4().to_string())
    }

    pub fn kind(&self) -> &QualifiedName {
        &self.kind
    }

    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// `kind:guid` for instances, the kind otherwise.
    pub fn instance_name(&self) -> QualifiedName {
        match &self.guid {
            Some(guid) => self.kind.with_guid(guid.clone()),
            None => self.kind.clone(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn default_peers(&self) -> &[QualifiedName] {
        &self.default_peers
    }

    pub fn attributes(&self) -> &BTreeSet<QualifiedName> {
        &self.attributes
    }

    pub fn blockers(&self) -> &[QualifiedName] {
        &self.blockers
    }

    // =========================================================================
    // Apply / remove
    // =========================================================================

    /// Apply to the default peers, or to the item's own kind if it has none.
    pub fn apply<'r>(&self, registry: &'r mut StateRegistry) -> Result<StateHandle<'r>, ItemError> {
        self.apply_to(registry, &[])
    }

    /// Apply to `peers`, falling back to the default peers when empty.
    ///
    /// Returns the kind's state so a duration can be chained.
    pub fn apply_to<'r>(
        &self,
        registry: &'r mut StateRegistry,
        peers: &[QualifiedName],
    ) -> Result<StateHandle<'r>, ItemError> {
        registry.declare_item_kind(&self.kind);
        let targets = if peers.is_empty() {
            &self.default_peers[..]
        } else {
            peers
        };
        if let Some(instance) = targets.iter().find(|p| p.is_instance()) {
            return Err(RegistryError::InstanceIsNotState(instance.clone()).into());
        }

        let instance = self.instance_name();
        if targets.is_empty() {
            registry.apply(&self.kind, &[instance.clone()])?;
        } else {
            for peer in targets {
                if self.guid.is_some() {
                    registry.apply(&self.kind, &[peer.clone(), instance.clone()])?;
                    registry.apply(peer, &[instance.clone()])?;
                } else {
                    registry.apply(&self.kind, &[peer.clone()])?;
                }
            }
        }
        if !self.attributes.is_empty() {
            registry.apply_attributes(&self.kind, self.attributes.iter().cloned())?;
        }

        debug!(item = %instance, peers = ?targets, "item applied");
        Ok(registry.state(&self.kind)?)
    }

    /// Remove from everything this item is applied to.
    pub fn remove(&self, registry: &mut StateRegistry) -> Result<(), ItemError> {
        self.remove_from(registry, &[])
    }

    /// Remove from `peers`, or from everything when empty.
    pub fn remove_from(
        &self,
        registry: &mut StateRegistry,
        peers: &[QualifiedName],
    ) -> Result<(), ItemError> {
        if !self.is_applied(registry)? {
            return Err(ItemError::NotApplied(self.instance_name()));
        }

        if self.guid.is_none() {
            if peers.is_empty() {
                registry.remove(&self.kind)?;
            } else {
                registry.remove_from(&self.kind, peers)?;
            }
            debug!(item = %self.kind, "item removed");
            return Ok(());
        }

        let instance = self.instance_name();
        let targets = if peers.is_empty() {
            self.applied_to(registry)?
        } else {
            peers.to_vec()
        };
        for peer in targets.iter().filter(|p| **p != self.kind) {
            if registry.get(peer)?.peers().contains(&instance) {
                registry.remove_from(peer, &[instance.clone()])?;
            }
            registry.remove_from(peer, &[self.kind.clone()])?;
        }
        self.release_instance(registry)?;

        debug!(item = %instance, "item removed");
        Ok(())
    }

    /// Drop the instance marker from the kind once no peer carries it.
    fn release_instance(&self, registry: &mut StateRegistry) -> Result<(), ItemError> {
        let instance = self.instance_name();
        registry.get(&self.kind)?;
        let Some(kind_state) = registry.peek(&self.kind) else {
            return Ok(());
        };
        if !kind_state.peers().contains(&instance) {
            return Ok(());
        }
        if !registry.instance_carried(&self.kind, &instance) {
            registry.remove_from(&self.kind, &[instance])?;
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether this item (this instance, for instanced items) is applied.
    pub fn is_applied(&self, registry: &mut StateRegistry) -> Result<bool, ItemError> {
        let state = registry.get(&self.kind)?;
        Ok(match &self.guid {
            Some(_) => state.peers().contains(&self.instance_name()),
            None => state.applied(),
        })
    }

    /// The states this item is currently applied to.
    pub fn applied_to(
        &self,
        registry: &mut StateRegistry,
    ) -> Result<Vec<QualifiedName>, ItemError> {
        let instance = self.instance_name();
        let peers: Vec<QualifiedName> = registry.get(&self.kind)?.state_peers().cloned().collect();
        if self.guid.is_none() {
            return Ok(peers);
        }
        Ok(peers
            .into_iter()
            .filter(|peer| {
                registry
                    .peek(peer)
                    .map(|s| s.peers().contains(&instance))
                    .unwrap_or(false)
            })
            .collect())
    }

    fn available_key(&self, registry: &StateRegistry) -> StoreKey {
        StoreKey::for_name(registry.domain(), &self.instance_name(), AVAILABLE)
    }

    /// Whether the item is part of the current inventory.
    pub fn is_available(&self, registry: &StateRegistry) -> Result<bool, ItemError> {
        let key = self.available_key(registry);
        Ok(registry.store().get_bool(&key)?.unwrap_or(false))
    }

    pub fn set_available(
        &self,
        registry: &StateRegistry,
        available: bool,
    ) -> Result<(), ItemError> {
        let key = self.available_key(registry);
        registry.store().set_bool(&key, available)?;
        Ok(())
    }

    /// Whether all apply rules currently hold.
    pub fn can_apply(&self, registry: &mut StateRegistry) -> Result<bool, ItemError> {
        ApplyRules::default().can_apply(self, registry)
    }

    /// Whether the item matches all requested attributes.
    ///
    /// The item's own kind, instance name and attributes always match. The
    /// state-level match only counts while this item is applied; instanced
    /// items match only the peers carrying their own instance marker.
    pub fn is(
        &self,
        registry: &mut StateRegistry,
        attributes: &[Attribute],
    ) -> Result<bool, ItemError> {
        if attributes.is_empty() {
            return Ok(false);
        }
        for attribute in attributes {
            if self.matches_statically(attribute) {
                continue;
            }
            if !self.matches_applied(registry, attribute)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_statically(&self, attribute: &Attribute) -> bool {
        let instance = self.instance_name();
        let names = || std::iter::once(&instance).chain(self.attributes.iter());
        match attribute {
            Attribute::Category(category) => names().any(|n| category.contains(n)),
            Attribute::Name(query) => names().any(|n| {
                n.is(query) || (query.is_wildcard() && n.namespace() == query.namespace())
            }),
        }
    }

    fn matches_applied(
        &self,
        registry: &mut StateRegistry,
        attribute: &Attribute,
    ) -> Result<bool, ItemError> {
        if !self.is_applied(registry)? {
            return Ok(false);
        }
        if self.guid.is_none() {
            return Ok(registry.is(&self.kind, std::slice::from_ref(attribute))?);
        }
        let carriers = self.applied_to(registry)?;
        let kind_attributes = registry.get(&self.kind)?.attributes();
        let tags = || carriers.iter().chain(kind_attributes.iter());
        Ok(match attribute {
            Attribute::Category(category) => tags().any(|n| category.contains(n)),
            Attribute::Name(query) => tags().any(|n| {
                n.is(query) || (query.is_wildcard() && n.namespace() == query.namespace())
            }),
        })
    }

    /// Effective duration of the kind's state.
    pub fn duration(&self, registry: &mut StateRegistry) -> Result<Duration, ItemError> {
        Ok(registry.duration(&self.kind)?)
    }

    pub fn expired(&self, registry: &mut StateRegistry) -> Result<bool, ItemError> {
        Ok(registry.expired(&self.kind)?)
    }

    /// Seconds since the item's kind was last removed.
    pub fn removed_since(&self, registry: &mut StateRegistry) -> Result<Option<u64>, ItemError> {
        Ok(registry.removed_since(&self.kind)?)
    }
}
