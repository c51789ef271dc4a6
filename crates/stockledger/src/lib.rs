//! Command-line tools for stockledger.
//!
//! This crate provides the following binaries:
//!
//! - `sledger-filter` - Filter items, groups, units and recipes
//! - `sledger-report` - Turnover sheets, period turnovers and balances
//! - `sledger-cutoff` - Inspect, move and recompute the block period
//!
//! Every tool reads a JSON ledger dataset and an optional settings file,
//! writes its result to stdout as a text table or JSON, and exits with 2
//! on bad input or 1 on any other failure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
