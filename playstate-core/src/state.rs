//! Graph nodes and their persisted form.
//!
//! A [`State`] is plain data: the applied flag, the peer set, the attribute
//! set and the validity window. Anything that touches more than one node
//! (linking, unlinking, effective durations, reflective matching) lives on
//! the [`StateRegistry`](crate::registry::StateRegistry) that owns all nodes
//! of a domain.

use crate::duration::Duration;
use crate::ident::{Category, Domain, IdentifierError, QualifiedName};
use crate::store::{BatchEntry, StoreKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Property suffixes of the four persisted values of a state.
pub const APPLIED: &str = "state.applied";
pub const DURATION: &str = "state.duration";
pub const PEERS: &str = "state.peers";
pub const ATTRIBUTES: &str = "state.attributes";

/// Prefix marking a persisted peer token as a reference to another state.
pub const STATE_TOKEN_PREFIX: &str = "state/";

/// A node of the applied-with graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub(crate) id: QualifiedName,
    pub(crate) domain: Domain,
    pub(crate) applied: bool,
    pub(crate) peers: BTreeSet<QualifiedName>,
    pub(crate) attributes: BTreeSet<QualifiedName>,
    pub(crate) duration: Duration,
    pub(crate) persistent: bool,
}

impl State {
    /// A fresh, unapplied node.
    pub fn new(domain: Domain, id: QualifiedName, now: u64) -> Self {
        let attributes = BTreeSet::from([id.kind()]);
        Self {
            id,
            domain,
            applied: false,
            peers: BTreeSet::new(),
            attributes,
            duration: Duration::temporary(now),
            persistent: false,
        }
    }

    pub fn id(&self) -> &QualifiedName {
        &self.id
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn applied(&self) -> bool {
        self.applied
    }

    pub fn peers(&self) -> &BTreeSet<QualifiedName> {
        &self.peers
    }

    pub fn attributes(&self) -> &BTreeSet<QualifiedName> {
        &self.attributes
    }

    /// The node's own validity window, ignoring its peers.
    pub fn own_duration(&self) -> Duration {
        self.duration
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Peers that are graph nodes (not instance markers, not this node).
    pub fn state_peers(&self) -> impl Iterator<Item = &QualifiedName> {
        self.peers
            .iter()
            .filter(move |p| !p.is_instance() && **p != self.id)
    }

    /// Instance markers of the given kind.
    pub fn instances_of<'a>(
        &'a self,
        kind: &'a QualifiedName,
    ) -> impl Iterator<Item = &'a QualifiedName> + 'a {
        self.peers
            .iter()
            .filter(move |p| p.is_instance() && p.same_kind(kind))
    }

    pub(crate) fn reset_attributes(&mut self) {
        self.attributes = BTreeSet::from([self.id.kind()]);
    }

    fn tags(&self) -> impl Iterator<Item = &QualifiedName> {
        self.attributes.iter().chain(self.peers.iter())
    }

    // =========================================================================
    // Local matching
    // =========================================================================

    /// Class-level match: any attribute or peer belongs to the category.
    pub(crate) fn matches_category(&self, category: Category) -> bool {
        category.contains(&self.id) || self.tags().any(|t| category.contains(t))
    }

    /// Direct membership of the node itself, its attributes or its markers.
    pub(crate) fn matches_directly(&self, query: &QualifiedName) -> bool {
        self.id.is(query)
            || self.attributes.iter().any(|a| a.is(query))
            || self
                .peers
                .iter()
                .filter(|p| p.is_instance())
                .any(|p| p.is(query))
    }

    /// Any-of-kind wildcard: `Namespace.*` matches any tag of the namespace.
    pub(crate) fn matches_wildcard(&self, query: &QualifiedName) -> bool {
        query.is_wildcard() && self.tags().any(|t| t.namespace() == query.namespace())
    }

    // =========================================================================
    // Persisted form
    // =========================================================================

    pub fn key(&self, suffix: &str) -> StoreKey {
        StoreKey::for_name(&self.domain, &self.id, suffix)
    }

    /// The four persisted properties as a write batch.
    ///
    /// An empty peer list clears the property instead of storing `[]`.
    pub fn to_properties(&self) -> Result<Vec<BatchEntry>, serde_json::Error> {
        let peers = encode_list(self.peers.iter().map(PeerToken::for_peer))?;
        let attributes = encode_list(self.attributes.iter().cloned().map(PeerToken::Name))?;
        Ok(vec![
            (self.key(APPLIED), Some(self.applied.to_string())),
            (self.key(DURATION), Some(self.duration.to_string())),
            (self.key(PEERS), peers),
            (self.key(ATTRIBUTES), attributes),
        ])
    }

    /// Batch clearing all persisted properties.
    pub fn cleared_properties(&self) -> Vec<BatchEntry> {
        [APPLIED, DURATION, PEERS, ATTRIBUTES]
            .into_iter()
            .map(|suffix| (self.key(suffix), None))
            .collect()
    }
}

// ============================================================================
// Peer tokens
// ============================================================================

/// A persisted reference in a peer or attribute list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PeerToken {
    /// Another state of the same domain.
    State(QualifiedName),
    /// An instance marker or a plain attribute.
    Name(QualifiedName),
}

impl PeerToken {
    /// Token for an entry of a peer set.
    pub fn for_peer(peer: &QualifiedName) -> Self {
        if peer.is_instance() {
            PeerToken::Name(peer.clone())
        } else {
            PeerToken::State(peer.clone())
        }
    }

    pub fn name(&self) -> &QualifiedName {
        match self {
            PeerToken::State(name) | PeerToken::Name(name) => name,
        }
    }

    pub fn into_name(self) -> QualifiedName {
        match self {
            PeerToken::State(name) | PeerToken::Name(name) => name,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            PeerToken::State(name) => format!("{STATE_TOKEN_PREFIX}{name}"),
            PeerToken::Name(name) => name.to_string(),
        }
    }

    /// Decode a token; nested state prefixes resolve to the innermost target.
    pub fn decode(text: &str) -> Result<Self, IdentifierError> {
        let mut rest = text.trim();
        let mut is_state = false;
        while let Some(inner) = rest.strip_prefix(STATE_TOKEN_PREFIX) {
            rest = inner;
            is_state = true;
        }
        let name = QualifiedName::parse(rest)?;
        Ok(if is_state {
            PeerToken::State(name)
        } else {
            PeerToken::Name(name)
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct TokenList(Vec<String>);

/// Encode a token list; `None` when the list is empty.
pub fn encode_list(
    tokens: impl IntoIterator<Item = PeerToken>,
) -> Result<Option<String>, serde_json::Error> {
    let tokens: Vec<String> = tokens.into_iter().map(|t| t.encode()).collect();
    if tokens.is_empty() {
        Ok(None)
    } else {
        serde_json::to_string(&TokenList(tokens)).map(Some)
    }
}

/// Decode a persisted token list. Absent values decode as empty.
pub fn decode_list(text: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
    match text {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str::<TokenList>(text).map(|list| list.0),
    }
}
