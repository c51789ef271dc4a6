//! Settings and ledger dataset loading for stockledger.
//!
//! This crate turns files on disk into the explicitly-owned objects the rest
//! of the workspace works with:
//!
//! - [`Settings`] - cutoff, snapshot location and output format
//! - [`load_ledger`] - a JSON dataset resolved into a shared [`LedgerStore`]
//!
//! # Example
//!
//! ```
//! use stockledger_loader::{ledger_from_str, parse_date};
//!
//! let store = ledger_from_str(
//!     r#"{
//!         "locations": [{"unique_code": "main", "name": "Main"}],
//!         "items": [{"unique_code": "flour", "name": "Flour"}],
//!         "transactions": [
//!             {"item": "flour", "location": "main", "period": "15.01.2024", "value": 10}
//!         ]
//!     }"#,
//!     "inline",
//! )
//! .unwrap();
//!
//! assert_eq!(store.transactions()[0].period, parse_date("2024-01-15").unwrap());
//! ```
//!
//! [`LedgerStore`]: stockledger_core::LedgerStore

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ledger;
mod settings;

pub use ledger::{ledger_from_str, load_ledger};
pub use settings::{format_date, parse_date, ReportFormat, Settings};

use std::path::PathBuf;
use stockledger_core::StoreError;
use thiserror::Error;

/// Errors that can occur while loading settings or a ledger.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error reading or writing a file.
    #[error("failed to access file {}: {source}", path.display())]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON of the expected shape.
    #[error("failed to decode {origin}: {source}")]
    Decode {
        /// File path or other description of the source.
        origin: String,
        /// The decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Settings could not be encoded.
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),

    /// A date string matches none of the accepted layouts.
    #[error("invalid date: {0:?} (expected e.g. 2024-01-31, 2024-01-31T12:00:00, 31.01.2024)")]
    InvalidDate(String),

    /// A reference names a code that was not declared before it.
    #[error("unknown {kind} code {code} referenced by {referrer}")]
    UnknownReference {
        /// Kind of the missing entity.
        kind: &'static str,
        /// The unresolved code.
        code: String,
        /// Who referenced it.
        referrer: String,
    },

    /// Two entities of one kind share a code.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LoadError {
    /// Whether this error describes bad user input rather than a bad file
    /// or an I/O failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidDate(_))
    }
}
