//! The catalog of items known to a session.

use crate::ident::{Attribute, QualifiedName};
use crate::item::{Item, ItemError};
use crate::registry::StateRegistry;

/// Declared items, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an item. Re-declaring the same instance replaces it.
    pub fn add(&mut self, item: Item) {
        let name = item.instance_name();
        match self.items.iter_mut().find(|i| i.instance_name() == name) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct kinds of all declared items.
    pub fn kinds(&self) -> Vec<QualifiedName> {
        let mut kinds: Vec<_> = self.items.iter().map(|i| i.kind().clone()).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Look up an item by instance name, or the first item of a kind.
    pub fn get(&self, name: &QualifiedName) -> Option<&Item> {
        self.items
            .iter()
            .find(|i| i.instance_name() == *name)
            .or_else(|| {
                if name.is_instance() {
                    None
                } else {
                    self.items.iter().find(|i| i.kind() == name)
                }
            })
    }

    /// All instances of a kind.
    pub fn instances_of(&self, kind: &QualifiedName) -> Vec<&Item> {
        self.items.iter().filter(|i| i.kind().same_kind(kind)).collect()
    }

    /// Items whose availability flag is set.
    pub fn available(&self, registry: &StateRegistry) -> Result<Vec<&Item>, ItemError> {
        let mut found = Vec::new();
        for item in &self.items {
            if item.is_available(registry)? {
                found.push(item);
            }
        }
        Ok(found)
    }

    /// Items currently applied.
    pub fn applied(&self, registry: &mut StateRegistry) -> Result<Vec<&Item>, ItemError> {
        let mut found = Vec::new();
        for item in &self.items {
            if item.is_applied(registry)? {
                found.push(item);
            }
        }
        Ok(found)
    }

    /// Items matching all requested attributes.
    pub fn matching(
        &self,
        registry: &mut StateRegistry,
        attributes: &[Attribute],
    ) -> Result<Vec<&Item>, ItemError> {
        let mut found = Vec::new();
        for item in &self.items {
            if item.is(registry, attributes)? {
                found.push(item);
            }
        }
        Ok(found)
    }
}
