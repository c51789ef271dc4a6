//! Core types for stockledger
//!
//! This crate provides the entity model shared by the rest of the workspace:
//!
//! - [`Item`], [`Group`], [`Unit`], [`Location`] - reference data
//! - [`Recipe`] and [`CompositionLine`] - item compositions
//! - [`Transaction`] - a dated, signed stock movement
//! - [`Nameable`] - the "has a display name" capability
//! - [`LedgerStore`] - the owned, read-only-after-load ledger
//!
//! # Example
//!
//! ```
//! use stockledger_core::{Item, LedgerStore, Location, Transaction, epoch};
//! use rust_decimal_macros::dec;
//!
//! let mut store = LedgerStore::new();
//! let flour = store.add_item(Item::new("flour", "Flour")).unwrap();
//! let main = store.add_location(Location::new("main", "Main warehouse")).unwrap();
//! store.add_transaction(Transaction::new(flour, main, epoch(), dec!(10)));
//!
//! let store = store.into_shared();
//! assert_eq!(store.transactions().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod entity;
pub mod store;
pub mod transaction;

pub use entity::{CompositionLine, Group, Item, Location, Nameable, Recipe, Unit};
pub use store::{LedgerStore, StoreError};
pub use transaction::{epoch, Transaction};

// Re-export commonly used external types
pub use chrono::{NaiveDate, NaiveDateTime};
pub use rust_decimal::Decimal;
