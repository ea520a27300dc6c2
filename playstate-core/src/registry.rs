//! Per-domain arena of states.
//!
//! The registry owns every [`State`] of one domain, keyed by identifier,
//! and is the only place where nodes are mutated. Peers are stored as
//! identifiers, so linking two nodes means inserting each identifier into
//! the other's peer set; instance markers (identifiers carrying a guid) are
//! bookkeeping entries and are only ever inserted on one side.
//!
//! Invariants maintained after every public call:
//! - peer links between nodes are symmetric,
//! - a node is applied exactly when its peer set is non-empty,
//! - one identifier maps to one cached node.

use crate::duration::{Clock, Duration, DurationError, Limit, TimeUnit};
use crate::ident::{Attribute, Domain, IdentifierError, QualifiedName};
use crate::state::{self, decode_list, PeerToken, State};
use crate::store::{PersistentStore, StoreError, StoreKey};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A different state is already registered for {0}")]
    DuplicateState(QualifiedName),

    #[error("State {0} is not applied")]
    NotApplied(QualifiedName),

    #[error("Instance identifier {0} cannot be used as a state")]
    InstanceIsNotState(QualifiedName),

    #[error("Malformed duration for {name}: {source}")]
    MalformedDuration {
        name: QualifiedName,
        #[source]
        source: DurationError,
    },

    #[error("Malformed peer list for {name}: {source}")]
    MalformedList {
        name: QualifiedName,
        #[source]
        source: serde_json::Error,
    },

    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Domain settings of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Domain of all states in the registry.
    pub domain: Domain,
    /// Reserved domain holding last-used shadow records.
    pub last_used_domain: Domain,
}

impl RegistryConfig {
    /// Config for a domain, with its shadow records in a derived reserved domain.
    pub fn for_domain(domain: Domain) -> Self {
        let last_used_domain = if domain.as_str() == Domain::DEFAULT {
            Domain::last_used()
        } else {
            Domain::new(format!("{}.{}", Domain::LAST_USED, domain))
        };
        Self {
            domain,
            last_used_domain,
        }
    }

    pub fn with_last_used_domain(mut self, domain: Domain) -> Self {
        self.last_used_domain = domain;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::for_domain(Domain::default())
    }
}

/// All states of one domain.
pub struct StateRegistry {
    config: RegistryConfig,
    store: Arc<dyn PersistentStore>,
    clock: Arc<dyn Clock>,
    states: BTreeMap<QualifiedName, State>,
    last_used: BTreeMap<QualifiedName, Duration>,
    item_kinds: BTreeSet<QualifiedName>,
}

impl std::fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRegistry")
            .field("config", &self.config)
            .field("states", &self.states.len())
            .field("item_kinds", &self.item_kinds)
            .finish()
    }
}

impl StateRegistry {
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            states: BTreeMap::new(),
            last_used: BTreeMap::new(),
            item_kinds: BTreeSet::new(),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.config.domain
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    /// Current time in seconds.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Record that `kind` names an item of the current inventory.
    pub fn declare_item_kind(&mut self, kind: &QualifiedName) {
        self.item_kinds.insert(kind.kind());
    }

    pub fn is_item_kind(&self, name: &QualifiedName) -> bool {
        self.item_kinds.contains(&name.kind())
    }

    pub fn item_kinds(&self) -> impl Iterator<Item = &QualifiedName> {
        self.item_kinds.iter()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// The state for `id`, created or restored on first use.
    pub fn state(&mut self, id: &QualifiedName) -> Result<StateHandle<'_>, RegistryError> {
        self.ensure_loaded(id)?;
        Ok(StateHandle {
            registry: self,
            id: id.clone(),
        })
    }

    /// Resolve a persisted token or a plain identifier to its state.
    ///
    /// A serialized state token resolves to the state it refers to rather
    /// than being treated as a new identifier.
    pub fn state_by_token(&mut self, token: &str) -> Result<StateHandle<'_>, RegistryError> {
        let id = PeerToken::decode(token)?.into_name();
        self.state(&id)
    }

    /// The cached state for `id`, loading it if necessary.
    pub fn get(&mut self, id: &QualifiedName) -> Result<&State, RegistryError> {
        self.ensure_loaded(id)?;
        self.cached(id)
    }

    fn cached(&self, id: &QualifiedName) -> Result<&State, RegistryError> {
        self.states
            .get(id)
            .ok_or_else(|| RegistryError::InvalidArgument(format!("state {id} is not loaded")))
    }

    /// The cached state for `id`, without loading.
    pub fn peek(&self, id: &QualifiedName) -> Option<&State> {
        self.states.get(id)
    }

    pub fn is_cached(&self, id: &QualifiedName) -> bool {
        self.states.contains_key(id)
    }

    /// All cached states.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Whether `id` is currently applied, loading it if necessary.
    pub fn is_applied(&mut self, id: &QualifiedName) -> Result<bool, RegistryError> {
        Ok(self.get(id)?.applied)
    }

    /// Register a state value built elsewhere.
    ///
    /// Registering an equal value again is a no-op; a different value under
    /// a cached identifier is rejected.
    pub fn insert(&mut self, state: State) -> Result<(), RegistryError> {
        if state.id.is_instance() {
            return Err(RegistryError::InstanceIsNotState(state.id));
        }
        match self.states.get(&state.id) {
            Some(cached) if *cached == state => Ok(()),
            Some(_) => Err(RegistryError::DuplicateState(state.id)),
            None => {
                self.states.insert(state.id.clone(), state);
                Ok(())
            }
        }
    }

    /// Drop all cached states. Persisted states are restored on next use.
    pub fn clear_cache(&mut self) {
        self.states.clear();
        self.last_used.clear();
    }

    fn ensure_loaded(&mut self, id: &QualifiedName) -> Result<(), RegistryError> {
        if self.states.contains_key(id) {
            return Ok(());
        }
        if id.is_instance() {
            return Err(RegistryError::InstanceIsNotState(id.clone()));
        }

        let applied_key = StoreKey::for_name(&self.config.domain, id, state::APPLIED);
        if self.store.has(&applied_key)? {
            self.restore(id)
        } else {
            let state = State::new(self.config.domain.clone(), id.clone(), self.now());
            self.states.insert(id.clone(), state);
            Ok(())
        }
    }

    // =========================================================================
    // Restore
    // =========================================================================

    fn restore(&mut self, id: &QualifiedName) -> Result<(), RegistryError> {
        let now = self.now();
        let mut state = State::new(self.config.domain.clone(), id.clone(), now);
        state.persistent = true;

        if let Some(text) = self.store.get(&state.key(state::DURATION))? {
            state.duration =
                Duration::parse(&text).map_err(|source| RegistryError::MalformedDuration {
                    name: id.clone(),
                    source,
                })?;
        }

        for text in self.read_list(&state, state::PEERS)? {
            let Some(peer) = decode_restored(id, &text) else {
                continue;
            };
            if self.accepts_restored_peer(&peer)? {
                state.peers.insert(peer);
            } else {
                warn!(
                    state = %id,
                    peer = %peer,
                    domain = %self.config.domain,
                    "dropping restored peer that no longer exists"
                );
            }
        }

        for text in self.read_list(&state, state::ATTRIBUTES)? {
            if let Some(attribute) = decode_restored(id, &text) {
                state.attributes.insert(attribute);
            }
        }

        state.applied = !state.peers.is_empty();
        debug!(state = %id, peers = state.peers.len(), "restored state");

        let linked: Vec<QualifiedName> = state.state_peers().cloned().collect();
        self.states.insert(id.clone(), state);
        self.load_last_used(id)?;

        for peer in linked {
            self.ensure_loaded(&peer)?;
            self.relink_restored(&peer, id, now);
        }
        Ok(())
    }

    fn read_list(&self, state: &State, suffix: &str) -> Result<Vec<String>, RegistryError> {
        let text = self.store.get(&state.key(suffix))?;
        decode_list(text.as_deref()).map_err(|source| RegistryError::MalformedList {
            name: state.id.clone(),
            source,
        })
    }

    /// Whether a persisted peer still exists in the current configuration.
    fn accepts_restored_peer(&self, peer: &QualifiedName) -> Result<bool, RegistryError> {
        let kind = peer.kind();
        let duration_key = StoreKey::for_name(&self.config.domain, &kind, state::DURATION);
        if self.store.has(&duration_key)? || self.is_item_kind(&kind) {
            return Ok(true);
        }
        Ok(self.states.get(&kind).map(|s| s.applied).unwrap_or(false))
    }

    /// Restore the back link of a restored peer that was not itself persisted.
    fn relink_restored(&mut self, peer: &QualifiedName, id: &QualifiedName, now: u64) {
        if let Some(other) = self.states.get_mut(peer) {
            if !other.peers.contains(id) {
                if !other.applied {
                    other.duration = Duration::temporary(now);
                }
                other.peers.insert(id.clone());
                other.applied = true;
            }
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Link `id` with each of `peers`.
    ///
    /// State peers are linked in both directions; instance markers only on
    /// `id`. Linking an existing peer again is a no-op. An empty peer list
    /// links the state with itself.
    pub fn apply(
        &mut self,
        id: &QualifiedName,
        peers: &[QualifiedName],
    ) -> Result<(), RegistryError> {
        self.ensure_loaded(id)?;
        for peer in peers.iter().filter(|p| !p.is_instance()) {
            self.ensure_loaded(peer)?;
        }

        let now = self.now();
        let self_link = [id.clone()];
        let peers = if peers.is_empty() { &self_link[..] } else { peers };

        let mut touched = BTreeSet::from([id.clone()]);
        for peer in peers {
            self.attach(id, peer, now);
            if !peer.is_instance() && peer != id {
                self.attach(peer, id, now);
                touched.insert(peer.clone());
            }
        }

        debug!(state = %id, peers = ?peers, domain = %self.config.domain, "applied");
        self.spread_persistence(&touched);
        self.persist_all(&touched)
    }

    /// Insert `peer` into `target`'s peer set, marking it applied.
    fn attach(&mut self, target: &QualifiedName, peer: &QualifiedName, now: u64) {
        let Some(state) = self.states.get_mut(target) else {
            return;
        };
        if !state.applied {
            state.duration = Duration::temporary(now);
        }
        state.applied = true;
        state.peers.insert(peer.clone());
        let shadow = state.duration;
        self.last_used.insert(target.clone(), shadow);
    }

    /// Remove `peer` from `target`'s peer set only.
    fn detach(&mut self, target: &QualifiedName, peer: &QualifiedName) {
        if let Some(state) = self.states.get_mut(target) {
            state.peers.remove(peer);
        }
    }

    /// Whether an instance marker still holds the link between `a` and `b`.
    fn still_referenced(&self, a: &QualifiedName, b: &QualifiedName) -> bool {
        let holds = |x: &QualifiedName, y: &QualifiedName| {
            self.states
                .get(x)
                .map(|s| s.instances_of(y).next().is_some())
                .unwrap_or(false)
        };
        holds(a, b) || holds(b, a)
    }

    /// Unlink `id` from each of `peers`.
    ///
    /// A state peer stays linked while an instance of its kind is still
    /// present on either side. A node left without peers is removed.
    pub fn remove_from(
        &mut self,
        id: &QualifiedName,
        peers: &[QualifiedName],
    ) -> Result<(), RegistryError> {
        if peers.is_empty() {
            return Err(RegistryError::InvalidArgument(format!(
                "no peers given to remove from {id}"
            )));
        }
        self.ensure_loaded(id)?;

        let mut touched = BTreeSet::from([id.clone()]);
        for peer in peers {
            if peer.is_instance() || peer == id {
                self.detach(id, peer);
                continue;
            }
            self.ensure_loaded(peer)?;
            if self.still_referenced(id, peer) {
                debug!(state = %id, peer = %peer, "peer still referenced by an instance");
                continue;
            }
            self.detach(id, peer);
            self.detach(peer, id);
            touched.insert(peer.clone());
        }

        debug!(state = %id, peers = ?peers, domain = %self.config.domain, "removed from");
        self.settle(touched)
    }

    /// Remove nodes left without peers and persist the rest.
    fn settle(&mut self, touched: BTreeSet<QualifiedName>) -> Result<(), RegistryError> {
        let mut remaining = BTreeSet::new();
        for id in touched {
            let emptied = self
                .states
                .get(&id)
                .map(|s| s.applied && s.peers.is_empty())
                .unwrap_or(false);
            if emptied {
                self.remove_node(&id)?;
            } else {
                remaining.insert(id);
            }
        }
        self.persist_all(&remaining)
    }

    /// Clear all links of `id`, mark it unapplied and delete its storage.
    ///
    /// Peers left without any other link are removed as well. The last-used
    /// shadow record keeps a frozen snapshot of the final duration. Removing
    /// a state that is not applied is an error.
    pub fn remove(&mut self, id: &QualifiedName) -> Result<(), RegistryError> {
        if !self.get(id)?.applied {
            return Err(RegistryError::NotApplied(id.clone()));
        }
        self.remove_node(id)
    }

    fn remove_node(&mut self, id: &QualifiedName) -> Result<(), RegistryError> {
        self.ensure_loaded(id)?;
        let now = self.now();

        let Some(state) = self.states.get_mut(id) else {
            return Ok(());
        };
        if !state.applied && state.peers.is_empty() {
            return Ok(());
        }
        let final_duration = state.duration.frozen(now);
        let linked: Vec<QualifiedName> = state.state_peers().cloned().collect();
        let carried: Vec<QualifiedName> =
            state.peers.iter().filter(|p| p.is_instance()).cloned().collect();
        let was_persistent = state.persistent;
        let cleared = state.cleared_properties();

        state.peers.clear();
        state.reset_attributes();
        state.applied = false;
        state.duration = Duration::temporary(now);
        state.persistent = false;
        self.last_used.insert(id.clone(), final_duration);

        let mut touched = BTreeSet::new();
        for peer in linked {
            if let Some(other) = self.states.get_mut(&peer) {
                other.peers.remove(id);
                other.peers.retain(|p| !(p.is_instance() && p.same_kind(id)));
                touched.insert(peer);
            }
        }
        // Instances this node carried lose their marker on the kind node
        // once no other carrier is left.
        for kind in &touched {
            let orphaned: Vec<QualifiedName> = carried
                .iter()
                .filter(|m| m.same_kind(kind) && !self.instance_carried(kind, m))
                .cloned()
                .collect();
            if let Some(other) = self.states.get_mut(kind) {
                for marker in &orphaned {
                    other.peers.remove(marker);
                }
            }
        }

        if was_persistent {
            let mut batch = cleared;
            batch.push((self.shadow_key(id), Some(final_duration.to_string())));
            self.store.write_batch(batch)?;
        }

        debug!(state = %id, domain = %self.config.domain, "removed");
        self.settle(touched)
    }

    /// Whether a state peer of `kind` still carries the instance `marker`.
    pub(crate) fn instance_carried(&self, kind: &QualifiedName, marker: &QualifiedName) -> bool {
        self.states
            .get(kind)
            .map(|state| {
                state.state_peers().any(|peer| {
                    self.states
                        .get(peer)
                        .map(|s| s.peers.contains(marker))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    }

    /// Set an explicit validity window starting now.
    pub fn over(&mut self, id: &QualifiedName, limit: Limit) -> Result<(), RegistryError> {
        self.ensure_loaded(id)?;
        let now = self.now();
        if let Some(state) = self.states.get_mut(id) {
            state.duration = Duration::new(now, limit);
            let shadow = state.duration;
            self.last_used.insert(id.clone(), shadow);
        }
        self.persist_all(&BTreeSet::from([id.clone()]))
    }

    /// Add attributes to a state.
    pub fn apply_attributes(
        &mut self,
        id: &QualifiedName,
        attributes: impl IntoIterator<Item = QualifiedName>,
    ) -> Result<(), RegistryError> {
        self.ensure_loaded(id)?;
        if let Some(state) = self.states.get_mut(id) {
            state.attributes.extend(attributes);
        }
        self.persist_all(&BTreeSet::from([id.clone()]))
    }

    /// Persist `id` and its linked states from now on.
    pub fn remember(&mut self, id: &QualifiedName) -> Result<(), RegistryError> {
        self.ensure_loaded(id)?;
        let mut touched = BTreeSet::from([id.clone()]);
        if let Some(state) = self.states.get(id) {
            touched.extend(state.state_peers().cloned());
        }
        for name in &touched {
            if let Some(state) = self.states.get_mut(name) {
                state.persistent = true;
            }
        }
        self.persist_all(&touched)
    }

    /// Linking a persistent state makes its new peers persistent too.
    fn spread_persistence(&mut self, touched: &BTreeSet<QualifiedName>) {
        let any_persistent = touched
            .iter()
            .any(|id| self.states.get(id).map(|s| s.persistent).unwrap_or(false));
        if !any_persistent {
            return;
        }
        for id in touched {
            if let Some(state) = self.states.get_mut(id) {
                state.persistent = true;
            }
        }
    }

    fn persist_all(&self, ids: &BTreeSet<QualifiedName>) -> Result<(), RegistryError> {
        for id in ids {
            let Some(state) = self.states.get(id) else {
                continue;
            };
            if !state.persistent {
                continue;
            }
            let mut batch = state.to_properties().map_err(|source| RegistryError::MalformedList {
                name: id.clone(),
                source,
            })?;
            if let Some(shadow) = self.last_used.get(id) {
                batch.push((self.shadow_key(id), Some(shadow.to_string())));
            }
            self.store.write_batch(batch)?;
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Effective duration.
    ///
    /// An explicit limit is authoritative. A temporary node lasts as long as
    /// the longest-lasting of its peer states.
    pub fn duration(&mut self, id: &QualifiedName) -> Result<Duration, RegistryError> {
        self.ensure_loaded(id)?;
        let now = self.now();
        let state = self.cached(id)?;
        let own = state.duration;
        if own.limit.is_explicit() {
            return Ok(own);
        }

        let mut longest = own;
        for peer in state.state_peers() {
            if let Some(other) = self.states.get(peer) {
                if other.duration.outlasts(&longest, now) {
                    longest = other.duration;
                }
            }
        }
        Ok(longest)
    }

    /// Whether the state is no longer valid.
    ///
    /// A node with an explicit limit expires on its own; a temporary node is
    /// expired only when every peer state's own window has closed.
    pub fn expired(&mut self, id: &QualifiedName) -> Result<bool, RegistryError> {
        self.ensure_loaded(id)?;
        let now = self.now();
        let state = self.cached(id)?;
        if state.duration.limit.is_explicit() {
            return Ok(state.duration.expired(now));
        }
        Ok(state.state_peers().all(|peer| {
            self.states
                .get(peer)
                .map(|other| other.duration.expired(now))
                .unwrap_or(true)
        }))
    }

    /// Whether the state matches all requested attributes.
    ///
    /// Each attribute is checked in order against: its category, direct
    /// membership of the node, its attributes and instance markers, a
    /// namespace wildcard, and finally the state peers, where a peer that is
    /// itself a cached node must list this node back.
    pub fn is(
        &mut self,
        id: &QualifiedName,
        attributes: &[Attribute],
    ) -> Result<bool, RegistryError> {
        if attributes.is_empty() {
            return Ok(false);
        }
        self.ensure_loaded(id)?;
        let Some(state) = self.states.get(id) else {
            return Ok(false);
        };
        Ok(attributes.iter().all(|attribute| self.matches(state, attribute)))
    }

    fn matches(&self, state: &State, attribute: &Attribute) -> bool {
        let query = match attribute {
            Attribute::Category(category) => return state.matches_category(*category),
            Attribute::Name(query) => query,
        };
        if state.matches_directly(query) || state.matches_wildcard(query) {
            return true;
        }
        state
            .state_peers()
            .filter(|peer| peer.is(query))
            .any(|peer| match self.states.get(peer) {
                Some(other) => other.peers.contains(&state.id),
                None => true,
            })
    }

    // =========================================================================
    // Last used
    // =========================================================================

    fn shadow_key(&self, id: &QualifiedName) -> StoreKey {
        StoreKey::for_name(&self.config.last_used_domain, id, state::DURATION)
    }

    fn load_last_used(&mut self, id: &QualifiedName) -> Result<(), RegistryError> {
        if self.last_used.contains_key(id) {
            return Ok(());
        }
        if let Some(text) = self.store.get(&self.shadow_key(id))? {
            let duration =
                Duration::parse(&text).map_err(|source| RegistryError::MalformedDuration {
                    name: id.clone(),
                    source,
                })?;
            self.last_used.insert(id.clone(), duration);
        }
        Ok(())
    }

    /// The shadow record of the last application of `id`.
    pub fn last_used(&mut self, id: &QualifiedName) -> Result<Option<Duration>, RegistryError> {
        self.load_last_used(id)?;
        Ok(self.last_used.get(id).copied())
    }

    /// Seconds since `id` was last removed; zero while it is in use and
    /// `None` if it was never applied.
    pub fn removed_since(&mut self, id: &QualifiedName) -> Result<Option<u64>, RegistryError> {
        let now = self.now();
        Ok(self.last_used(id)?.map(|shadow| match shadow.elapsed {
            Some(elapsed) => now.saturating_sub(shadow.start.saturating_add(elapsed)),
            None => 0,
        }))
    }
}

/// Decode one restored list entry, skipping tokens that no longer parse.
fn decode_restored(id: &QualifiedName, text: &str) -> Option<QualifiedName> {
    match PeerToken::decode(text) {
        Ok(token) => Some(token.into_name()),
        Err(err) => {
            warn!(state = %id, token = %text, error = %err, "dropping unreadable restored token");
            None
        }
    }
}

// ============================================================================
// Handle
// ============================================================================

/// A borrowed view of one state, for chaining operations.
pub struct StateHandle<'r> {
    registry: &'r mut StateRegistry,
    id: QualifiedName,
}

impl<'r> StateHandle<'r> {
    pub fn id(&self) -> &QualifiedName {
        &self.id
    }

    /// The underlying node.
    pub fn snapshot(&self) -> Option<&State> {
        self.registry.peek(&self.id)
    }

    pub fn applied(&self) -> bool {
        self.snapshot().map(State::applied).unwrap_or(false)
    }

    pub fn peers(&self) -> BTreeSet<QualifiedName> {
        self.snapshot().map(|s| s.peers.clone()).unwrap_or_default()
    }

    pub fn apply(&mut self, peers: &[QualifiedName]) -> Result<&mut Self, RegistryError> {
        self.registry.apply(&self.id, peers)?;
        Ok(self)
    }

    pub fn remove_from(&mut self, peers: &[QualifiedName]) -> Result<&mut Self, RegistryError> {
        self.registry.remove_from(&self.id, peers)?;
        Ok(self)
    }

    pub fn remove(&mut self) -> Result<&mut Self, RegistryError> {
        self.registry.remove(&self.id)?;
        Ok(self)
    }

    pub fn over(&mut self, amount: u64, unit: TimeUnit) -> Result<&mut Self, RegistryError> {
        self.registry.over(&self.id, Limit::of(amount, unit))?;
        Ok(self)
    }

    pub fn over_limit(&mut self, limit: Limit) -> Result<&mut Self, RegistryError> {
        self.registry.over(&self.id, limit)?;
        Ok(self)
    }

    pub fn remember(&mut self) -> Result<&mut Self, RegistryError> {
        self.registry.remember(&self.id)?;
        Ok(self)
    }

    pub fn duration(&mut self) -> Result<Duration, RegistryError> {
        self.registry.duration(&self.id)
    }

    pub fn expired(&mut self) -> Result<bool, RegistryError> {
        self.registry.expired(&self.id)
    }

    pub fn is(&mut self, attributes: &[Attribute]) -> Result<bool, RegistryError> {
        self.registry.is(&self.id, attributes)
    }
}
