//! Ledger transactions.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::{Item, Location, Unit};

/// The earliest instant a period query can start from (1900-01-01 00:00).
#[must_use]
pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// A dated stock movement of one item at one location.
///
/// A positive `value` is an inflow (income), a negative one an outflow
/// (outcome). Transactions are immutable once ingested into a
/// [`LedgerStore`](crate::LedgerStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// The item moved. Transactions without an item are ignored by aggregation.
    pub item: Option<Arc<Item>>,
    /// Where the movement happened. Transactions without one are ignored too.
    pub location: Option<Arc<Location>>,
    /// Unit the quantity is expressed in.
    pub unit: Option<Arc<Unit>>,
    /// When the movement happened.
    pub period: NaiveDateTime,
    /// Signed quantity.
    pub value: Decimal,
}

impl Transaction {
    /// Create a transaction for an item at a location.
    #[must_use]
    pub fn new(
        item: Arc<Item>,
        location: Arc<Location>,
        period: NaiveDateTime,
        value: Decimal,
    ) -> Self {
        Self {
            item: Some(item),
            location: Some(location),
            unit: None,
            period,
            value,
        }
    }

    /// Set the unit of measure.
    #[must_use]
    pub fn with_unit(mut self, unit: Arc<Unit>) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Whether the transaction references both an item and a location.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.item.is_some() && self.location.is_some()
    }

    /// Whether this is an inflow.
    #[must_use]
    pub fn is_income(&self) -> bool {
        self.value > Decimal::ZERO
    }
}
