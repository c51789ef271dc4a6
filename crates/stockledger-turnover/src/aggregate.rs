//! Grouping transactions into per-(item, location) turnovers.

use rust_decimal::Decimal;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use stockledger_core::{Item, Location, Transaction, Unit};

/// Grouping key: (item code, location code).
pub type RowKey = (String, String);

/// Income and outcome of one item at one location.
///
/// `income` is the sum of positive quantities, `outcome` the sum of the
/// absolute values of the others; both are never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    /// Item code.
    pub item_code: String,
    /// Item display name.
    pub item_name: String,
    /// Location code.
    pub location_code: String,
    /// Location display name.
    pub location_name: String,
    /// Unit code, empty when neither the transaction nor the item has one.
    pub unit_code: String,
    /// Unit display name.
    pub unit_name: String,
    /// Total inflow.
    pub income: Decimal,
    /// Total outflow, as a positive number.
    pub outcome: Decimal,
}

impl AggregateRow {
    /// The row's grouping key.
    #[must_use]
    pub fn key(&self) -> RowKey {
        (self.item_code.clone(), self.location_code.clone())
    }

    /// Net movement (income minus outcome).
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.income - self.outcome
    }

    fn seed(transaction: &Transaction, item: &Item, location: &Location) -> Self {
        let unit: Option<&Arc<Unit>> = transaction.unit.as_ref().or(item.unit.as_ref());
        Self {
            item_code: item.unique_code.clone(),
            item_name: item.name.clone(),
            location_code: location.unique_code.clone(),
            location_name: location.name.clone(),
            unit_code: unit.map(|u| u.unique_code.clone()).unwrap_or_default(),
            unit_name: unit.map(|u| u.name.clone()).unwrap_or_default(),
            income: Decimal::ZERO,
            outcome: Decimal::ZERO,
        }
    }

    fn accumulate(&mut self, quantity: Decimal) {
        if quantity > Decimal::ZERO {
            self.income += quantity;
        } else {
            self.outcome += quantity.abs();
        }
    }
}

/// Aggregate transactions by (item, location).
///
/// Transactions without an item or a location are skipped. Display
/// metadata comes from the first transaction seen for each key. Rows are
/// returned sorted by key, so the output does not depend on input order.
pub fn aggregate<'a, I>(transactions: I) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut rows: BTreeMap<RowKey, AggregateRow> = BTreeMap::new();

    for transaction in transactions {
        let (Some(item), Some(location)) = (&transaction.item, &transaction.location) else {
            continue;
        };
        let key = (item.unique_code.clone(), location.unique_code.clone());
        let row = match rows.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(AggregateRow::seed(transaction, item, location)),
        };
        row.accumulate(transaction.value);
    }

    rows.into_values().collect()
}
