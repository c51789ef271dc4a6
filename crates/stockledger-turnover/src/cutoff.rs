//! The block-period cutoff and its snapshot cache.
//!
//! Everything at or before the cutoff is aggregated once and persisted
//! through a [`SnapshotStore`]. Queries reaching past the cutoff combine
//! that snapshot with a fresh aggregation of the transactions after it.
//! Every transaction lands in exactly one of the two buckets, so combined
//! totals do not depend on where the cutoff sits.
//!
//! # Locking
//!
//! The cutoff lives behind a read-write lock that also guards the snapshot.
//! Changing the cutoff holds the write lock across recompute and persist;
//! queries hold the read lock while they load the snapshot, so they always
//! see a snapshot that agrees with the cutoff they read.
//!
//! The persisted snapshot also records its own cutoff. A snapshot written
//! at another cutoff (a settings file that was not updated, or a direct
//! [`SnapshotCache::recompute_blocked`] call) is never combined as if it
//! were current: queries aggregate the blocked period in memory instead,
//! and [`SnapshotCache::ensure_blocked`] rewrites it.

use chrono::{NaiveDateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};

use stockledger_core::{epoch, LedgerStore};

use crate::aggregate::{aggregate, AggregateRow, RowKey};
use crate::error::TurnoverError;
use crate::snapshot::{BlockedSnapshot, CutoffSnapshot, SnapshotStore};

/// Cutoff-aware turnover cache over a shared ledger.
pub struct SnapshotCache {
    ledger: Arc<LedgerStore>,
    snapshots: Box<dyn SnapshotStore>,
    cutoff: RwLock<NaiveDateTime>,
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("cutoff", &*self.cutoff.read())
            .field("transactions", &self.ledger.transactions().len())
            .finish_non_exhaustive()
    }
}

impl SnapshotCache {
    /// Create a cache for `ledger` with the given cutoff.
    ///
    /// Nothing is computed yet; call [`ensure_blocked`](Self::ensure_blocked)
    /// or [`recalculate`](Self::recalculate) to build the snapshot.
    pub fn new(
        ledger: Arc<LedgerStore>,
        snapshots: Box<dyn SnapshotStore>,
        cutoff: NaiveDateTime,
    ) -> Self {
        Self {
            ledger,
            snapshots,
            cutoff: RwLock::new(cutoff),
        }
    }

    /// The current cutoff.
    pub fn cutoff(&self) -> NaiveDateTime {
        *self.cutoff.read()
    }

    /// The ledger this cache aggregates.
    pub fn ledger(&self) -> &Arc<LedgerStore> {
        &self.ledger
    }

    /// Aggregate everything at or before `cutoff` and persist it, replacing
    /// the previous snapshot.
    ///
    /// This does not move the cache's own cutoff; use
    /// [`set_cutoff`](Self::set_cutoff) for that. A snapshot persisted at a
    /// cutoff other than the current one is ignored by queries until
    /// [`ensure_blocked`](Self::ensure_blocked) or
    /// [`recalculate`](Self::recalculate) replaces it.
    pub fn recompute_blocked(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<CutoffSnapshot>, TurnoverError> {
        let _guard = self.cutoff.write();
        self.recompute_locked(cutoff)
    }

    // Callers hold the write lock.
    fn recompute_locked(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<CutoffSnapshot>, TurnoverError> {
        let _span = info_span!("recompute_blocked", %cutoff).entered();

        let snapshot = BlockedSnapshot {
            cutoff,
            rows: self.aggregate_blocked(cutoff),
        };
        self.snapshots.save(&snapshot)?;
        info!(rows = snapshot.rows.len(), "recomputed blocked snapshot");
        Ok(snapshot.rows)
    }

    fn aggregate_blocked(&self, cutoff: NaiveDateTime) -> Vec<CutoffSnapshot> {
        let now = Utc::now();
        aggregate(
            self.ledger
                .transactions()
                .iter()
                .filter(|t| t.period <= cutoff),
        )
        .into_iter()
        .map(|row| CutoffSnapshot::blocked(row, now))
        .collect()
    }

    // Callers hold the cutoff lock.
    fn blocked_at(&self, cutoff: NaiveDateTime) -> Result<Vec<CutoffSnapshot>, TurnoverError> {
        match self.snapshots.load()? {
            Some(snapshot) if snapshot.cutoff == cutoff => Ok(snapshot.rows),
            Some(snapshot) => {
                warn!(
                    %cutoff, snapshot_cutoff = %snapshot.cutoff,
                    "persisted snapshot belongs to another cutoff, aggregating in memory"
                );
                Ok(self.aggregate_blocked(cutoff))
            }
            None => Ok(Vec::new()),
        }
    }

    /// Read the persisted blocked-period snapshot.
    ///
    /// An absent snapshot is empty. A snapshot persisted at another cutoff
    /// is replaced by an in-memory aggregation at the current one.
    pub fn load_blocked(&self) -> Result<Vec<CutoffSnapshot>, TurnoverError> {
        let cutoff = self.cutoff.read();
        self.blocked_at(*cutoff)
    }

    /// Aggregate the transactions with `cutoff < period <= end`.
    pub fn compute_fresh(&self, cutoff: NaiveDateTime, end: NaiveDateTime) -> Vec<AggregateRow> {
        let rows = aggregate(
            self.ledger
                .transactions()
                .iter()
                .filter(|t| t.period > cutoff && t.period <= end),
        );
        debug!(%cutoff, %end, rows = rows.len(), "computed fresh turnovers");
        rows
    }

    /// Turnovers for the window `[start, end]`.
    ///
    /// A window starting at or after the cutoff is aggregated directly,
    /// with `start` treated as exclusive. A window ending at or before the
    /// cutoff returns the whole persisted snapshot, without applying
    /// `start` or `end`. A window spanning the cutoff returns the snapshot
    /// combined with the fresh turnovers up to `end`; `start` is not
    /// applied to the blocked part.
    pub fn get_for_period(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<CutoffSnapshot>, TurnoverError> {
        if end < start {
            return Err(TurnoverError::InvalidPeriod { start, end });
        }

        let cutoff = self.cutoff.read();
        if start >= *cutoff {
            debug!(%start, %end, "window after cutoff, computing directly");
            let now = Utc::now();
            return Ok(self
                .compute_fresh(start, end)
                .into_iter()
                .map(|row| CutoffSnapshot::fresh(row, now))
                .collect());
        }

        if end <= *cutoff {
            warn!(
                %start, %end, cutoff = %*cutoff,
                "window before cutoff: returning the full blocked snapshot, start and end not applied"
            );
            return self.blocked_at(*cutoff);
        }

        if start > epoch() {
            warn!(
                %start, cutoff = %*cutoff,
                "window spans cutoff: start not applied to the blocked snapshot"
            );
        }
        let blocked = self.blocked_at(*cutoff)?;
        Ok(combine(blocked, self.compute_fresh(*cutoff, end)))
    }

    /// Combined turnovers from the beginning of the ledger up to `end`.
    ///
    /// When `end` is before the cutoff the snapshot would over-count, so
    /// the turnovers are aggregated directly and reported as blocked.
    pub fn combined_until(&self, end: NaiveDateTime) -> Result<Vec<CutoffSnapshot>, TurnoverError> {
        let cutoff = self.cutoff.read();
        if end < *cutoff {
            debug!(%end, cutoff = %*cutoff, "end before cutoff, aggregating directly");
            let now = Utc::now();
            return Ok(aggregate(
                self.ledger
                    .transactions()
                    .iter()
                    .filter(|t| t.period <= end),
            )
            .into_iter()
            .map(|row| CutoffSnapshot::blocked(row, now))
            .collect());
        }
        let blocked = self.blocked_at(*cutoff)?;
        Ok(combine(blocked, self.compute_fresh(*cutoff, end)))
    }

    /// Move the cutoff and recompute the snapshot under it.
    ///
    /// The cutoff only changes once the new snapshot is persisted; on
    /// failure both stay as they were.
    pub fn set_cutoff(&self, new_cutoff: NaiveDateTime) -> Result<(), TurnoverError> {
        let mut cutoff = self.cutoff.write();
        let previous = *cutoff;
        self.recompute_locked(new_cutoff)?;
        *cutoff = new_cutoff;
        info!(%previous, cutoff = %new_cutoff, "moved cutoff");
        Ok(())
    }

    /// Recompute the snapshot at the current cutoff.
    pub fn recalculate(&self) -> Result<Vec<CutoffSnapshot>, TurnoverError> {
        let cutoff = self.cutoff.write();
        self.recompute_locked(*cutoff)
    }

    /// Compute the snapshot if none is persisted yet, or if the persisted
    /// one was computed at another cutoff.
    ///
    /// Returns whether a recomputation happened.
    pub fn ensure_blocked(&self) -> Result<bool, TurnoverError> {
        let cutoff = self.cutoff.write();
        match self.snapshots.load()? {
            Some(snapshot) if snapshot.cutoff == *cutoff => return Ok(false),
            Some(snapshot) => {
                info!(cutoff = %*cutoff, snapshot_cutoff = %snapshot.cutoff, "snapshot is stale");
            }
            None => {}
        }
        self.recompute_locked(*cutoff)?;
        Ok(true)
    }

    /// The persisted row for one item at one location.
    pub fn blocked_for(
        &self,
        item_code: &str,
        location_code: &str,
    ) -> Result<Option<CutoffSnapshot>, TurnoverError> {
        Ok(self
            .load_blocked()?
            .into_iter()
            .find(|row| row.item_code == item_code && row.location_code == location_code))
    }
}

/// Full outer merge of blocked snapshot rows with fresh turnovers.
///
/// Blocked totals come from `blocked`, fresh totals from `fresh`; a key
/// missing on one side gets zeros there. Rows are sorted by key.
pub fn combine(blocked: Vec<CutoffSnapshot>, fresh: Vec<AggregateRow>) -> Vec<CutoffSnapshot> {
    let now = Utc::now();
    let mut merged: BTreeMap<RowKey, CutoffSnapshot> = blocked
        .into_iter()
        .map(|mut row| {
            row.fresh_period_income = Decimal::ZERO;
            row.fresh_period_outcome = Decimal::ZERO;
            (row.key(), row)
        })
        .collect();

    for row in fresh {
        match merged.get_mut(&row.key()) {
            Some(existing) => {
                existing.fresh_period_income = row.income;
                existing.fresh_period_outcome = row.outcome;
            }
            None => {
                let snapshot = CutoffSnapshot::fresh(row, now);
                merged.insert(snapshot.key(), snapshot);
            }
        }
    }

    merged.into_values().collect()
}
