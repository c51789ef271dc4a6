//! Turnover aggregation and block-period caching for stockledger.
//!
//! - [`aggregate`] groups transactions by (item, location) into income and
//!   outcome totals.
//! - [`SnapshotCache`] keeps the totals at or before a movable cutoff in a
//!   [`SnapshotStore`] and combines them with fresh totals on demand.
//! - [`turnover_sheet`] and [`balances_at`] turn both into report rows.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use stockledger_core::{Item, LedgerStore, Location, Transaction};
//! use stockledger_turnover::{MemorySnapshotStore, SnapshotCache};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!
//! let mut store = LedgerStore::new();
//! let flour = store.add_item(Item::new("flour", "Flour")).unwrap();
//! let main = store.add_location(Location::new("main", "Main")).unwrap();
//! store.add_transaction(Transaction::new(Arc::clone(&flour), Arc::clone(&main), day(2), dec!(5)));
//! store.add_transaction(Transaction::new(flour, main, day(20), dec!(-2)));
//!
//! let cache = SnapshotCache::new(store.into_shared(), Box::new(MemorySnapshotStore::new()), day(10));
//! cache.recalculate().unwrap();
//!
//! let rows = cache.combined_until(day(31)).unwrap();
//! assert_eq!(rows[0].blocked_period_income, dec!(5));
//! assert_eq!(rows[0].fresh_period_outcome, dec!(2));
//! assert_eq!(rows[0].balance(), dec!(3));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod cutoff;
pub mod error;
pub mod report;
pub mod snapshot;

pub use aggregate::{aggregate, AggregateRow, RowKey};
pub use cutoff::{combine, SnapshotCache};
pub use error::{SnapshotError, TurnoverError};
pub use report::{balances_at, turnover_sheet, BalanceRow, TurnoverRow};
pub use snapshot::{
    BlockedSnapshot, CutoffSnapshot, JsonFileSnapshotStore, MemorySnapshotStore, SnapshotStore,
};
