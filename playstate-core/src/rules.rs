//! Rules deciding whether an item may currently be applied.
//!
//! Rules are independent predicates over an item and the registry of its
//! domain, evaluated in a fixed order. All of them must hold.

use crate::ident::QualifiedName;
use crate::item::{Item, ItemError};
use crate::registry::StateRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single apply rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// The item's availability flag is set.
    IsAvailable,
    /// The item is not already applied where it would go.
    NotAlreadyApplied,
    /// No applied default peer is occupied by something else.
    CanApplyToPeers,
    /// None of the item's blockers is applied.
    NotBlocked,
}

impl Rule {
    /// Default evaluation order.
    pub const ORDER: [Rule; 4] = [
        Rule::IsAvailable,
        Rule::NotAlreadyApplied,
        Rule::CanApplyToPeers,
        Rule::NotBlocked,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::IsAvailable => "is available",
            Rule::NotAlreadyApplied => "not already applied",
            Rule::CanApplyToPeers => "can apply to peers",
            Rule::NotBlocked => "not blocked",
        }
    }

    /// Evaluate this rule for `item`.
    pub fn holds(&self, item: &Item, registry: &mut StateRegistry) -> Result<bool, ItemError> {
        match self {
            Rule::IsAvailable => item.is_available(registry),
            Rule::NotAlreadyApplied => {
                if item.default_peers().is_empty() {
                    return Ok(!item.is_applied(registry)?);
                }
                for peer in item.default_peers() {
                    if !registry.is_applied(peer)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Rule::CanApplyToPeers => {
                let own = item.instance_name();
                for peer in item.default_peers() {
                    let state = registry.get(peer)?;
                    if state.applied() && !state.peers().contains(&own) {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Rule::NotBlocked => {
                for blocker in item.blockers() {
                    if blocker_applied(registry, blocker)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An instance blocker is applied while its kind carries the instance marker.
fn blocker_applied(
    registry: &mut StateRegistry,
    blocker: &QualifiedName,
) -> Result<bool, ItemError> {
    let state = registry.get(&blocker.kind())?;
    Ok(if blocker.is_instance() {
        state.peers().contains(blocker)
    } else {
        state.applied()
    })
}

/// An ordered, conjunctive rule chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRules {
    rules: Vec<Rule>,
}

impl Default for ApplyRules {
    fn default() -> Self {
        Self {
            rules: Rule::ORDER.to_vec(),
        }
    }
}

impl ApplyRules {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Whether every rule holds.
    pub fn can_apply(&self, item: &Item, registry: &mut StateRegistry) -> Result<bool, ItemError> {
        Ok(self.first_failing(item, registry)?.is_none())
    }

    /// The first rule that does not hold, if any.
    pub fn first_failing(
        &self,
        item: &Item,
        registry: &mut StateRegistry,
    ) -> Result<Option<Rule>, ItemError> {
        for rule in &self.rules {
            if !rule.holds(item, registry)? {
                return Ok(Some(*rule));
            }
        }
        Ok(None)
    }

    /// Every rule that does not hold, in evaluation order.
    pub fn explain(
        &self,
        item: &Item,
        registry: &mut StateRegistry,
    ) -> Result<Vec<Rule>, ItemError> {
        let mut failing = Vec::new();
        for rule in &self.rules {
            if !rule.holds(item, registry)? {
                failing.push(*rule);
            }
        }
        Ok(failing)
    }
}
