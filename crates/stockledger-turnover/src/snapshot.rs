//! Persisted cutoff snapshots.
//!
//! A snapshot row is an [`AggregateRow`] whose totals are split into the
//! blocked period (at or before the cutoff) and the fresh period (after
//! it). Decimals are stored as strings so they survive a round trip
//! exactly.
//!
//! The persisted document records the cutoff the rows were computed at,
//! so a reader can tell a snapshot that no longer matches the configured
//! cutoff from a current one:
//!
//! ```json
//! {"cutoff": "2024-01-01T00:00:00", "rows": [...]}
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::aggregate::{AggregateRow, RowKey};
use crate::error::SnapshotError;

/// One (item, location) row with its blocked/fresh split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoffSnapshot {
    /// Item code.
    pub item_code: String,
    /// Item display name.
    pub item_name: String,
    /// Location code.
    pub location_code: String,
    /// Location display name.
    pub location_name: String,
    /// Unit code.
    pub unit_code: String,
    /// Unit display name.
    pub unit_name: String,
    /// Income at or before the cutoff.
    #[serde(with = "rust_decimal::serde::str")]
    pub blocked_period_income: Decimal,
    /// Outcome at or before the cutoff.
    #[serde(with = "rust_decimal::serde::str")]
    pub blocked_period_outcome: Decimal,
    /// Income after the cutoff.
    #[serde(with = "rust_decimal::serde::str")]
    pub fresh_period_income: Decimal,
    /// Outcome after the cutoff.
    #[serde(with = "rust_decimal::serde::str")]
    pub fresh_period_outcome: Decimal,
    /// When the row was computed.
    pub calculated_at: DateTime<Utc>,
}

impl CutoffSnapshot {
    fn from_row(row: AggregateRow, calculated_at: DateTime<Utc>) -> Self {
        Self {
            item_code: row.item_code,
            item_name: row.item_name,
            location_code: row.location_code,
            location_name: row.location_name,
            unit_code: row.unit_code,
            unit_name: row.unit_name,
            blocked_period_income: Decimal::ZERO,
            blocked_period_outcome: Decimal::ZERO,
            fresh_period_income: Decimal::ZERO,
            fresh_period_outcome: Decimal::ZERO,
            calculated_at,
        }
    }

    /// A row whose totals all belong to the blocked period.
    #[must_use]
    pub fn blocked(row: AggregateRow, calculated_at: DateTime<Utc>) -> Self {
        let (income, outcome) = (row.income, row.outcome);
        Self {
            blocked_period_income: income,
            blocked_period_outcome: outcome,
            ..Self::from_row(row, calculated_at)
        }
    }

    /// A row whose totals all belong to the fresh period.
    #[must_use]
    pub fn fresh(row: AggregateRow, calculated_at: DateTime<Utc>) -> Self {
        let (income, outcome) = (row.income, row.outcome);
        Self {
            fresh_period_income: income,
            fresh_period_outcome: outcome,
            ..Self::from_row(row, calculated_at)
        }
    }

    /// The row's grouping key.
    #[must_use]
    pub fn key(&self) -> RowKey {
        (self.item_code.clone(), self.location_code.clone())
    }

    /// Combined income across both periods.
    #[must_use]
    pub fn income(&self) -> Decimal {
        self.blocked_period_income + self.fresh_period_income
    }

    /// Combined outcome across both periods.
    #[must_use]
    pub fn outcome(&self) -> Decimal {
        self.blocked_period_outcome + self.fresh_period_outcome
    }

    /// Combined income minus combined outcome.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.income() - self.outcome()
    }
}

/// The blocked-period rows together with the cutoff they were computed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSnapshot {
    /// Cutoff the rows aggregate up to (inclusive).
    pub cutoff: NaiveDateTime,
    /// One row per (item, location) pair.
    pub rows: Vec<CutoffSnapshot>,
}

/// Durable storage for the blocked-period snapshot.
///
/// `save` replaces the whole snapshot. Implementations must make the
/// replacement atomic: a concurrent `load` sees either the old snapshot or
/// the new one.
pub trait SnapshotStore: Send + Sync {
    /// Read the persisted snapshot, or `None` if nothing was persisted yet.
    fn load(&self) -> Result<Option<BlockedSnapshot>, SnapshotError>;

    /// Replace the persisted snapshot.
    fn save(&self, snapshot: &BlockedSnapshot) -> Result<(), SnapshotError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self) -> Result<Option<BlockedSnapshot>, SnapshotError> {
        (**self).load()
    }

    fn save(&self, snapshot: &BlockedSnapshot) -> Result<(), SnapshotError> {
        (**self).save(snapshot)
    }
}

const TMP_SUFFIX: &str = "tmp";

/// Snapshot kept in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    /// Store snapshots at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<BlockedSnapshot>, SnapshotError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot file");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|source| SnapshotError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, snapshot: &BlockedSnapshot) -> Result<(), SnapshotError> {
        let data = serde_json::to_string_pretty(snapshot).map_err(SnapshotError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = tmp_path(&self.path);
        let mut file = fs::File::create(&tmp).map_err(|e| self.io_error(e))?;
        file.write_all(data.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| self.io_error(e))?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        info!(
            path = %self.path.display(),
            cutoff = %snapshot.cutoff,
            rows = snapshot.rows.len(),
            "saved snapshot"
        );
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Snapshot kept in memory, for tests and benchmarks.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<BlockedSnapshot>>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<BlockedSnapshot>, SnapshotError> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &BlockedSnapshot) -> Result<(), SnapshotError> {
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row() -> AggregateRow {
        AggregateRow {
            item_code: "flour".to_string(),
            item_name: "Flour".to_string(),
            location_code: "main".to_string(),
            location_name: "Main".to_string(),
            unit_code: "kg".to_string(),
            unit_name: "kilogram".to_string(),
            income: dec!(10.25),
            outcome: dec!(3),
        }
    }

    #[test]
    fn test_split_sides() {
        let now = Utc::now();
        let blocked = CutoffSnapshot::blocked(row(), now);
        assert_eq!(blocked.blocked_period_income, dec!(10.25));
        assert_eq!(blocked.fresh_period_income, Decimal::ZERO);

        let fresh = CutoffSnapshot::fresh(row(), now);
        assert_eq!(fresh.fresh_period_outcome, dec!(3));
        assert_eq!(fresh.income(), dec!(10.25));
        assert_eq!(fresh.balance(), dec!(7.25));
    }

    #[test]
    fn test_decimals_serialized_as_strings() {
        let snap = CutoffSnapshot::blocked(row(), Utc::now());
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["blocked_period_income"], "10.25");
        assert_eq!(json["fresh_period_outcome"], "0");
    }

    #[test]
    fn test_tmp_path() {
        assert_eq!(
            tmp_path(Path::new("data/blocked.json")),
            PathBuf::from("data/blocked.json.tmp")
        );
        assert_eq!(tmp_path(Path::new("blocked")), PathBuf::from("blocked.tmp"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().unwrap().is_none());

        let cutoff = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let snapshot = BlockedSnapshot {
            cutoff,
            rows: vec![CutoffSnapshot::blocked(row(), Utc::now())],
        };
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_document_records_cutoff() {
        let cutoff = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let snapshot = BlockedSnapshot {
            cutoff,
            rows: Vec::new(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["cutoff"], "2024-01-01T00:00:00");
        assert!(json["rows"].as_array().unwrap().is_empty());
    }
}
