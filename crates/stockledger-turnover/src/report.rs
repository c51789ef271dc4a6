//! Report rows built on top of aggregation and the snapshot cache.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use stockledger_core::{LedgerStore, Transaction};
use stockledger_filter::{matches, FilterCriterion};

use crate::aggregate::{aggregate, AggregateRow, RowKey};
use crate::cutoff::SnapshotCache;
use crate::error::TurnoverError;
use crate::snapshot::CutoffSnapshot;

/// One line of a turnover sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnoverRow {
    /// Item code.
    pub item_code: String,
    /// Item display name.
    pub item_name: String,
    /// Location code.
    pub location_code: String,
    /// Location display name.
    pub location_name: String,
    /// Unit display name.
    pub unit_name: String,
    /// Balance before the window.
    #[serde(with = "rust_decimal::serde::str")]
    pub opening: Decimal,
    /// Income within the window.
    #[serde(with = "rust_decimal::serde::str")]
    pub income: Decimal,
    /// Outcome within the window.
    #[serde(with = "rust_decimal::serde::str")]
    pub outcome: Decimal,
    /// Balance at the end of the window.
    #[serde(with = "rust_decimal::serde::str")]
    pub closing: Decimal,
}

impl TurnoverRow {
    fn empty(meta: &AggregateRow) -> Self {
        Self {
            item_code: meta.item_code.clone(),
            item_name: meta.item_name.clone(),
            location_code: meta.location_code.clone(),
            location_name: meta.location_name.clone(),
            unit_name: meta.unit_name.clone(),
            opening: Decimal::ZERO,
            income: Decimal::ZERO,
            outcome: Decimal::ZERO,
            closing: Decimal::ZERO,
        }
    }
}

/// One line of a balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    /// Item code.
    pub item_code: String,
    /// Item display name.
    pub item_name: String,
    /// Location code.
    pub location_code: String,
    /// Location display name.
    pub location_name: String,
    /// Unit display name.
    pub unit_name: String,
    /// Combined income.
    #[serde(with = "rust_decimal::serde::str")]
    pub income: Decimal,
    /// Combined outcome.
    #[serde(with = "rust_decimal::serde::str")]
    pub outcome: Decimal,
    /// Income minus outcome.
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    /// Income at or before the cutoff.
    #[serde(with = "rust_decimal::serde::str")]
    pub blocked_income: Decimal,
    /// Outcome at or before the cutoff.
    #[serde(with = "rust_decimal::serde::str")]
    pub blocked_outcome: Decimal,
    /// Income after the cutoff.
    #[serde(with = "rust_decimal::serde::str")]
    pub fresh_income: Decimal,
    /// Outcome after the cutoff.
    #[serde(with = "rust_decimal::serde::str")]
    pub fresh_outcome: Decimal,
}

impl From<CutoffSnapshot> for BalanceRow {
    fn from(snap: CutoffSnapshot) -> Self {
        Self {
            income: snap.income(),
            outcome: snap.outcome(),
            balance: snap.balance(),
            blocked_income: snap.blocked_period_income,
            blocked_outcome: snap.blocked_period_outcome,
            fresh_income: snap.fresh_period_income,
            fresh_outcome: snap.fresh_period_outcome,
            item_code: snap.item_code,
            item_name: snap.item_name,
            location_code: snap.location_code,
            location_name: snap.location_name,
            unit_name: snap.unit_name,
        }
    }
}

fn item_matches(transaction: &Transaction, criterion: Option<&FilterCriterion>) -> bool {
    match (criterion, transaction.item.as_deref()) {
        (None, _) => true,
        (Some(criterion), Some(item)) => matches(item, criterion),
        (Some(_), None) => false,
    }
}

/// Turnover sheet for the window `[start, end]`.
///
/// Each (item, location) pair that moved before or within the window gets
/// a row: the opening balance from everything strictly before `start`, the
/// income and outcome within the window, and the resulting closing
/// balance. With `item_criterion`, only transactions whose item matches it
/// are counted.
pub fn turnover_sheet(
    store: &LedgerStore,
    start: NaiveDateTime,
    end: NaiveDateTime,
    item_criterion: Option<&FilterCriterion>,
) -> Result<Vec<TurnoverRow>, TurnoverError> {
    if end < start {
        return Err(TurnoverError::InvalidPeriod { start, end });
    }

    let selected: Vec<&Transaction> = store
        .transactions()
        .iter()
        .filter(|t| t.period <= end && item_matches(t, item_criterion))
        .collect();

    let before = aggregate(selected.iter().copied().filter(|t| t.period < start));
    let within = aggregate(selected.iter().copied().filter(|t| t.period >= start));

    let mut rows: BTreeMap<RowKey, TurnoverRow> = BTreeMap::new();
    for row in before {
        rows.entry(row.key())
            .or_insert_with(|| TurnoverRow::empty(&row))
            .opening = row.balance();
    }
    for row in within {
        let line = rows
            .entry(row.key())
            .or_insert_with(|| TurnoverRow::empty(&row));
        line.income = row.income;
        line.outcome = row.outcome;
    }

    let rows: Vec<TurnoverRow> = rows
        .into_values()
        .map(|mut row| {
            row.closing = row.opening + row.income - row.outcome;
            row
        })
        .collect();
    debug!(%start, %end, rows = rows.len(), "built turnover sheet");
    Ok(rows)
}

/// Balances as of `date`, with the blocked/fresh split of each row.
pub fn balances_at(
    cache: &SnapshotCache,
    date: NaiveDateTime,
) -> Result<Vec<BalanceRow>, TurnoverError> {
    Ok(cache
        .combined_until(date)?
        .into_iter()
        .map(BalanceRow::from)
        .collect())
}
