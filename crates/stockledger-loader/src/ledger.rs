//! JSON ledger datasets.
//!
//! A dataset lists reference data and transactions in one document:
//!
//! ```json
//! {
//!   "groups":    [{"unique_code": "bakery", "name": "Bakery", "base": "food"}],
//!   "units":     [{"unique_code": "kg", "name": "kilogram", "value": 1000, "base": "g"}],
//!   "locations": [{"unique_code": "main", "name": "Main warehouse"}],
//!   "items":     [{"unique_code": "flour", "name": "Flour", "group": "bakery", "range": "kg"}],
//!   "recipes":   [{"unique_code": "bread", "name": "Bread",
//!                  "composition": [{"nomenclature": "flour", "range": "kg", "value": "0.5"}]}],
//!   "transactions": [{"item": "flour", "location": "main", "period": "2024-01-15", "value": "12.5"}]
//! }
//! ```
//!
//! References are codes and must name an entity declared earlier in the
//! document.
//!
//! Quantities may be JSON numbers or strings. Both are read as exact
//! decimals, so long numbers keep every digit.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use stockledger_core::{
    CompositionLine, Group, Item, LedgerStore, Location, Recipe, Transaction, Unit,
};

use crate::settings::parse_date;
use crate::LoadError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Dataset {
    groups: Vec<GroupRecord>,
    units: Vec<UnitRecord>,
    locations: Vec<LocationRecord>,
    items: Vec<ItemRecord>,
    recipes: Vec<RecipeRecord>,
    transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Deserialize)]
struct GroupRecord {
    unique_code: String,
    name: String,
    #[serde(default, alias = "parent")]
    base: Option<String>,
}

const fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct UnitRecord {
    unique_code: String,
    name: String,
    #[serde(default = "one")]
    value: u32,
    #[serde(default)]
    base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationRecord {
    unique_code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ItemRecord {
    unique_code: String,
    name: String,
    #[serde(default)]
    group: Option<String>,
    #[serde(default, alias = "unit")]
    range: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineRecord {
    #[serde(alias = "item")]
    nomenclature: String,
    #[serde(alias = "unit")]
    range: String,
    value: Decimal,
}

#[derive(Debug, Deserialize)]
struct RecipeRecord {
    unique_code: String,
    name: String,
    #[serde(default = "one")]
    portions: u32,
    #[serde(default)]
    cooking_time: String,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    composition: Vec<LineRecord>,
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    #[serde(default)]
    item: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    period: String,
    value: Decimal,
}

fn resolve<T>(
    found: Option<&Arc<T>>,
    kind: &'static str,
    code: &str,
    referrer: &str,
) -> Result<Arc<T>, LoadError> {
    found
        .map(Arc::clone)
        .ok_or_else(|| LoadError::UnknownReference {
            kind,
            code: code.to_string(),
            referrer: referrer.to_string(),
        })
}

fn build(dataset: Dataset) -> Result<LedgerStore, LoadError> {
    let mut store = LedgerStore::new();

    for record in dataset.groups {
        let mut group = Group::new(&record.unique_code, record.name);
        if let Some(code) = &record.base {
            group = group.with_parent(resolve(store.group(code), "group", code, &record.unique_code)?);
        }
        store.add_group(group)?;
    }

    for record in dataset.units {
        let base = match &record.base {
            Some(code) => Some(resolve(store.unit(code), "unit", code, &record.unique_code)?),
            None => None,
        };
        store.add_unit(Unit {
            unique_code: record.unique_code,
            name: record.name,
            value: record.value,
            base,
        })?;
    }

    for record in dataset.locations {
        store.add_location(Location::new(record.unique_code, record.name))?;
    }

    for record in dataset.items {
        let mut item = Item::new(&record.unique_code, record.name);
        if let Some(code) = &record.group {
            item = item.with_group(resolve(store.group(code), "group", code, &record.unique_code)?);
        }
        if let Some(code) = &record.range {
            item = item.with_unit(resolve(store.unit(code), "unit", code, &record.unique_code)?);
        }
        store.add_item(item)?;
    }

    for record in dataset.recipes {
        let mut recipe = Recipe {
            portions: record.portions,
            cooking_time: record.cooking_time,
            steps: record.steps,
            ..Recipe::new(&record.unique_code, record.name)
        };
        for line in record.composition {
            let item = resolve(store.item(&line.nomenclature), "item", &line.nomenclature, &record.unique_code)?;
            let unit = resolve(store.unit(&line.range), "unit", &line.range, &record.unique_code)?;
            recipe = recipe.with_line(CompositionLine::new(item, unit, line.value));
        }
        store.add_recipe(recipe)?;
    }

    for (index, record) in dataset.transactions.into_iter().enumerate() {
        let referrer = format!("transaction #{}", index + 1);
        let item = match &record.item {
            Some(code) => Some(resolve(store.item(code), "item", code, &referrer)?),
            None => None,
        };
        let location = match &record.location {
            Some(code) => Some(resolve(store.location(code), "location", code, &referrer)?),
            None => None,
        };
        let unit = match &record.unit {
            Some(code) => Some(resolve(store.unit(code), "unit", code, &referrer)?),
            None => None,
        };
        if item.is_none() || location.is_none() {
            debug!(%referrer, "transaction without item or location");
        }
        store.add_transaction(Transaction {
            item,
            location,
            unit,
            period: parse_date(&record.period)?,
            value: record.value,
        });
    }

    Ok(store)
}

/// Parse a dataset from a JSON string.
///
/// `origin` names the source in error messages.
pub fn ledger_from_str(data: &str, origin: &str) -> Result<Arc<LedgerStore>, LoadError> {
    let dataset: Dataset = serde_json::from_str(data).map_err(|source| LoadError::Decode {
        origin: origin.to_string(),
        source,
    })?;
    let store = build(dataset)?;
    info!(
        origin,
        items = store.items().len(),
        locations = store.locations().len(),
        recipes = store.recipes().len(),
        transactions = store.transactions().len(),
        "loaded ledger"
    );
    Ok(store.into_shared())
}

/// Load a dataset file.
pub fn load_ledger(path: &Path) -> Result<Arc<LedgerStore>, LoadError> {
    let data = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ledger_from_str(&data, &path.display().to_string())
}
