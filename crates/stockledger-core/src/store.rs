//! The in-memory ledger store.
//!
//! A [`LedgerStore`] is filled once by its owner (the loader or a test),
//! then frozen behind an `Arc` and shared read-only with every component
//! that needs it. Nothing in the crate hands out mutable access to an
//! ingested transaction.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::{Group, Item, Location, Recipe, Transaction, Unit};

/// Errors raised while filling a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Two entities of the same kind share a code.
    #[error("duplicate {kind} code: {code}")]
    DuplicateCode {
        /// Entity kind ("item", "group", ...).
        kind: &'static str,
        /// The repeated code.
        code: String,
    },
}

/// Insertion-ordered entities of one kind, indexed by code.
#[derive(Debug)]
struct Registry<T> {
    kind: &'static str,
    entries: Vec<Arc<T>>,
    index: HashMap<String, usize>,
}

impl<T> Registry<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn insert(&mut self, code: &str, value: T) -> Result<Arc<T>, StoreError> {
        if self.index.contains_key(code) {
            return Err(StoreError::DuplicateCode {
                kind: self.kind,
                code: code.to_string(),
            });
        }
        let value = Arc::new(value);
        self.index.insert(code.to_string(), self.entries.len());
        self.entries.push(Arc::clone(&value));
        Ok(value)
    }

    fn get(&self, code: &str) -> Option<&Arc<T>> {
        self.index.get(code).map(|&i| &self.entries[i])
    }
}

/// All reference data and transactions of one ledger.
#[derive(Debug)]
pub struct LedgerStore {
    groups: Registry<Group>,
    units: Registry<Unit>,
    locations: Registry<Location>,
    items: Registry<Item>,
    recipes: Registry<Recipe>,
    transactions: Vec<Transaction>,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: Registry::new("group"),
            units: Registry::new("unit"),
            locations: Registry::new("location"),
            items: Registry::new("item"),
            recipes: Registry::new("recipe"),
            transactions: Vec::new(),
        }
    }

    /// Add a group and return its shared handle.
    pub fn add_group(&mut self, group: Group) -> Result<Arc<Group>, StoreError> {
        let code = group.unique_code.clone();
        self.groups.insert(&code, group)
    }

    /// Add a unit and return its shared handle.
    pub fn add_unit(&mut self, unit: Unit) -> Result<Arc<Unit>, StoreError> {
        let code = unit.unique_code.clone();
        self.units.insert(&code, unit)
    }

    /// Add a location and return its shared handle.
    pub fn add_location(&mut self, location: Location) -> Result<Arc<Location>, StoreError> {
        let code = location.unique_code.clone();
        self.locations.insert(&code, location)
    }

    /// Add an item and return its shared handle.
    pub fn add_item(&mut self, item: Item) -> Result<Arc<Item>, StoreError> {
        let code = item.unique_code.clone();
        self.items.insert(&code, item)
    }

    /// Add a recipe and return its shared handle.
    pub fn add_recipe(&mut self, recipe: Recipe) -> Result<Arc<Recipe>, StoreError> {
        let code = recipe.unique_code.clone();
        self.recipes.insert(&code, recipe)
    }

    /// Append a transaction.
    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// Freeze the store for shared read-only use.
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Look up a group by code.
    #[must_use]
    pub fn group(&self, code: &str) -> Option<&Arc<Group>> {
        self.groups.get(code)
    }

    /// Look up a unit by code.
    #[must_use]
    pub fn unit(&self, code: &str) -> Option<&Arc<Unit>> {
        self.units.get(code)
    }

    /// Look up a location by code.
    #[must_use]
    pub fn location(&self, code: &str) -> Option<&Arc<Location>> {
        self.locations.get(code)
    }

    /// Look up an item by code.
    #[must_use]
    pub fn item(&self, code: &str) -> Option<&Arc<Item>> {
        self.items.get(code)
    }

    /// Look up a recipe by code.
    #[must_use]
    pub fn recipe(&self, code: &str) -> Option<&Arc<Recipe>> {
        self.recipes.get(code)
    }

    /// All groups in insertion order.
    #[must_use]
    pub fn groups(&self) -> &[Arc<Group>] {
        &self.groups.entries
    }

    /// All units in insertion order.
    #[must_use]
    pub fn units(&self) -> &[Arc<Unit>] {
        &self.units.entries
    }

    /// All locations in insertion order.
    #[must_use]
    pub fn locations(&self) -> &[Arc<Location>] {
        &self.locations.entries
    }

    /// All items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items.entries
    }

    /// All recipes in insertion order.
    #[must_use]
    pub fn recipes(&self) -> &[Arc<Recipe>] {
        &self.recipes.entries
    }

    /// All transactions in insertion order.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_code_rejected() {
        let mut store = LedgerStore::new();
        store.add_item(Item::new("flour", "Flour")).unwrap();
        let err = store.add_item(Item::new("flour", "Other")).unwrap_err();

        assert_eq!(
            err,
            StoreError::DuplicateCode {
                kind: "item",
                code: "flour".to_string()
            }
        );
        assert_eq!(err.to_string(), "duplicate item code: flour");
    }

    #[test]
    fn test_same_code_different_kinds() {
        let mut store = LedgerStore::new();
        store.add_group(Group::new("x", "Group X")).unwrap();
        store.add_item(Item::new("x", "Item X")).unwrap();

        assert_eq!(store.group("x").unwrap().name, "Group X");
        assert_eq!(store.item("x").unwrap().name, "Item X");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = LedgerStore::new();
        for code in ["c", "a", "b"] {
            store.add_location(Location::new(code, code)).unwrap();
        }
        let codes: Vec<_> = store
            .locations()
            .iter()
            .map(|l| l.unique_code.as_str())
            .collect();
        assert_eq!(codes, ["c", "a", "b"]);
    }
}
