//! Testing utilities for the state graph.
//!
//! This module provides tools for deterministic tests:
//! - `ManualClock` for controlling time without sleeping
//! - `TestHarness` bundling a registry with an in-memory store
//! - `check_invariants` for verifying graph consistency

use crate::duration::Clock;
use crate::ident::Domain;
use crate::registry::{RegistryConfig, StateRegistry};
use crate::store::MemoryStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A registry wired to an in-memory store and a manual clock.
pub struct TestHarness {
    pub registry: StateRegistry,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
}

impl TestHarness {
    /// Start time of every harness clock.
    pub const START: u64 = 1_000;

    pub fn new() -> Self {
        Self::with_domain(Domain::default())
    }

    pub fn with_domain(domain: Domain) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(Self::START);
        let registry = StateRegistry::new(
            RegistryConfig::for_domain(domain),
            store.clone(),
            Arc::new(clock.clone()),
        );
        Self {
            registry,
            store,
            clock,
        }
    }

    /// Simulate a process restart: a fresh registry over the same store.
    ///
    /// Declared item kinds survive, as they would when the inventory is
    /// configured again on startup.
    pub fn restart(&mut self) {
        let kinds: Vec<_> = self.registry.item_kinds().cloned().collect();
        let mut registry = StateRegistry::new(
            self.registry.config().clone(),
            self.store.clone(),
            Arc::new(self.clock.clone()),
        );
        for kind in &kinds {
            registry.declare_item_kind(kind);
        }
        self.registry = registry;
    }

    /// Panic with a description of every invariant violation.
    pub fn assert_consistent(&self) {
        let violations = check_invariants(&self.registry);
        assert!(
            violations.is_empty(),
            "graph invariants violated:\n{}",
            violations.join("\n")
        );
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Check symmetry and applied consistency over all cached states.
pub fn check_invariants(registry: &StateRegistry) -> Vec<String> {
    let mut violations = Vec::new();
    for state in registry.states() {
        if state.applied() == state.peers().is_empty() {
            violations.push(format!(
                "{}: applied={} with {} peers",
                state.id(),
                state.applied(),
                state.peers().len()
            ));
        }
        for peer in state.state_peers() {
            let linked_back = registry
                .peek(peer)
                .map(|other| other.peers().contains(state.id()))
                .unwrap_or(false);
            if !linked_back {
                violations.push(format!("{} -> {} is not linked back", state.id(), peer));
            }
        }
    }
    violations
}
