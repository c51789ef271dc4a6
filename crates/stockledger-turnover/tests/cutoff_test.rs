//! Cutoff placement, snapshot persistence and aggregation properties.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockledger_core::{epoch, Item, LedgerStore, Location, Transaction};
use stockledger_turnover::{
    aggregate, JsonFileSnapshotStore, MemorySnapshotStore, SnapshotCache, SnapshotError,
    SnapshotStore, TurnoverError,
};
use tempfile::TempDir;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn scenario_ledger() -> Arc<LedgerStore> {
    let mut store = LedgerStore::new();
    let flour = store.add_item(Item::new("flour", "Flour")).unwrap();
    let main = store.add_location(Location::new("main", "Main")).unwrap();
    for (date, value) in [
        (at(2023, 12, 15), dec!(100)),
        (at(2023, 12, 20), dec!(-50)),
        (at(2024, 2, 1), dec!(200)),
        (at(2024, 2, 15), dec!(-100)),
    ] {
        store.add_transaction(Transaction::new(
            Arc::clone(&flour),
            Arc::clone(&main),
            date,
            value,
        ));
    }
    store.into_shared()
}

#[test]
fn test_totals_do_not_depend_on_cutoff() {
    let ledger = scenario_ledger();
    let end = at(2024, 10, 1);

    let mut splits = Vec::new();
    for cutoff in [at(2023, 1, 1), at(2024, 1, 1), at(2024, 12, 1)] {
        let cache = SnapshotCache::new(
            Arc::clone(&ledger),
            Box::new(MemorySnapshotStore::new()),
            cutoff,
        );
        cache.recalculate().unwrap();

        let rows = cache.combined_until(end).unwrap();
        assert_eq!(rows.len(), 1, "cutoff {cutoff}");
        assert_eq!(rows[0].income(), dec!(300), "cutoff {cutoff}");
        assert_eq!(rows[0].outcome(), dec!(150), "cutoff {cutoff}");
        splits.push((rows[0].blocked_period_income, rows[0].fresh_period_income));
    }

    assert_eq!(
        splits,
        [
            (dec!(0), dec!(300)),
            (dec!(100), dec!(200)),
            (dec!(300), dec!(0)),
        ]
    );
}

#[test]
fn test_split_at_year_boundary() {
    let cache = SnapshotCache::new(
        scenario_ledger(),
        Box::new(MemorySnapshotStore::new()),
        at(2024, 1, 1),
    );
    cache.recalculate().unwrap();

    let rows = cache.get_for_period(epoch(), at(2024, 10, 1)).unwrap();
    let row = &rows[0];
    assert_eq!(
        (
            row.blocked_period_income,
            row.blocked_period_outcome,
            row.fresh_period_income,
            row.fresh_period_outcome,
        ),
        (dec!(100), dec!(50), dec!(200), dec!(100))
    );
}

#[test]
fn test_snapshot_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("blocked_turnovers.json");

    let cache = SnapshotCache::new(
        scenario_ledger(),
        Box::new(JsonFileSnapshotStore::new(&path)),
        at(2024, 1, 1),
    );
    assert!(cache.ensure_blocked().unwrap());
    assert!(path.exists());

    let written = cache.load_blocked().unwrap();
    let reread = JsonFileSnapshotStore::new(&path).load().unwrap().unwrap();
    assert_eq!(reread.cutoff, at(2024, 1, 1));
    assert_eq!(written, reread.rows);
    assert_eq!(reread.rows[0].blocked_period_income, dec!(100));
    assert_eq!(reread.rows[0].blocked_period_outcome, dec!(50));

    // A fresh cache over the same file reuses the snapshot.
    let reopened = SnapshotCache::new(
        scenario_ledger(),
        Box::new(JsonFileSnapshotStore::new(&path)),
        at(2024, 1, 1),
    );
    assert!(!reopened.ensure_blocked().unwrap());
}

#[test]
fn test_fractional_decimals_survive_persistence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blocked.json");

    let mut store = LedgerStore::new();
    let salt = store.add_item(Item::new("salt", "Salt")).unwrap();
    let main = store.add_location(Location::new("main", "Main")).unwrap();
    for value in [dec!(0.1), dec!(0.2), dec!(1234567890.123456789)] {
        store.add_transaction(Transaction::new(
            Arc::clone(&salt),
            Arc::clone(&main),
            at(2024, 1, 1),
            value,
        ));
    }

    let cache = SnapshotCache::new(
        store.into_shared(),
        Box::new(JsonFileSnapshotStore::new(&path)),
        at(2024, 6, 1),
    );
    cache.recalculate().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"1234567890.423456789\""));
    let snapshot = JsonFileSnapshotStore::new(&path).load().unwrap().unwrap();
    assert_eq!(snapshot.rows[0].blocked_period_income, dec!(1234567890.423456789));
}

#[test]
fn test_missing_snapshot_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileSnapshotStore::new(dir.path().join("absent.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn test_corrupt_snapshot_is_operation_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blocked.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        JsonFileSnapshotStore::new(&path).load(),
        Err(SnapshotError::Corrupt { .. })
    ));

    let cache = SnapshotCache::new(
        scenario_ledger(),
        Box::new(JsonFileSnapshotStore::new(&path)),
        at(2024, 1, 1),
    );
    let err = cache.load_blocked().unwrap_err();
    assert!(matches!(err, TurnoverError::OperationFailed(_)));
    assert!(err.to_string().starts_with("operation failed: "));

    // Recalculating overwrites the corrupt file.
    cache.recalculate().unwrap();
    assert_eq!(cache.load_blocked().unwrap().len(), 1);
}

#[test]
fn test_snapshot_from_another_cutoff_is_not_combined() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blocked.json");

    // Written at 2024-01-01, but the configured cutoff stayed at 2025-01-01.
    let moved = SnapshotCache::new(
        scenario_ledger(),
        Box::new(JsonFileSnapshotStore::new(&path)),
        at(2024, 1, 1),
    );
    moved.recalculate().unwrap();

    let cache = SnapshotCache::new(
        scenario_ledger(),
        Box::new(JsonFileSnapshotStore::new(&path)),
        at(2025, 1, 1),
    );
    let rows = cache.combined_until(at(2025, 6, 1)).unwrap();
    assert_eq!(rows[0].income(), dec!(300));
    assert_eq!(rows[0].outcome(), dec!(150));

    assert!(cache.ensure_blocked().unwrap());
    let snapshot = JsonFileSnapshotStore::new(&path).load().unwrap().unwrap();
    assert_eq!(snapshot.cutoff, at(2025, 1, 1));
    assert_eq!(snapshot.rows[0].blocked_period_income, dec!(300));
}

#[test]
fn test_queries_during_cutoff_moves_see_consistent_totals() {
    let dir = TempDir::new().unwrap();
    let cache = SnapshotCache::new(
        scenario_ledger(),
        Box::new(JsonFileSnapshotStore::new(dir.path().join("blocked.json"))),
        at(2024, 1, 1),
    );
    cache.recalculate().unwrap();

    let end = at(2024, 10, 1);
    let cutoffs = [
        at(2023, 1, 1),
        at(2023, 12, 18),
        at(2024, 1, 1),
        at(2024, 2, 10),
        at(2024, 9, 30),
    ];

    std::thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..10 {
                for cutoff in cutoffs {
                    cache.set_cutoff(cutoff).unwrap();
                }
            }
        });

        for _ in 0..3 {
            s.spawn(|| {
                for _ in 0..50 {
                    for rows in [
                        cache.get_for_period(epoch(), end).unwrap(),
                        cache.combined_until(end).unwrap(),
                    ] {
                        let income: Decimal = rows.iter().map(|r| r.income()).sum();
                        let outcome: Decimal = rows.iter().map(|r| r.outcome()).sum();
                        assert_eq!(income, dec!(300));
                        assert_eq!(outcome, dec!(150));
                    }
                }
            });
        }
    });

    assert_eq!(cache.cutoff(), at(2024, 9, 30));
}

#[test]
fn test_empty_ledger() {
    let cache = SnapshotCache::new(
        LedgerStore::new().into_shared(),
        Box::new(MemorySnapshotStore::new()),
        at(2024, 1, 1),
    );
    assert!(cache.recalculate().unwrap().is_empty());
    assert!(cache.get_for_period(epoch(), at(2025, 1, 1)).unwrap().is_empty());
}

/// Transactions for a few items and locations spread over 2024.
fn arb_ledger() -> impl Strategy<Value = Vec<(usize, usize, i64, i64)>> {
    prop::collection::vec((0..3usize, 0..2usize, 0..366i64, -1000..1000i64), 0..40)
}

fn build_ledger(entries: &[(usize, usize, i64, i64)]) -> Arc<LedgerStore> {
    let mut store = LedgerStore::new();
    let items: Vec<_> = (0..3)
        .map(|i| store.add_item(Item::new(format!("item-{i}"), format!("Item {i}"))).unwrap())
        .collect();
    let locations: Vec<_> = (0..2)
        .map(|l| {
            store
                .add_location(Location::new(format!("loc-{l}"), format!("Location {l}")))
                .unwrap()
        })
        .collect();
    for &(item, location, day, cents) in entries {
        store.add_transaction(Transaction::new(
            Arc::clone(&items[item]),
            Arc::clone(&locations[location]),
            at(2024, 1, 1) + Duration::days(day),
            Decimal::new(cents, 2),
        ));
    }
    store.into_shared()
}

proptest! {
    #[test]
    fn prop_cutoff_placement_invariance(
        entries in arb_ledger(),
        first in 0..400i64,
        second in 0..400i64,
    ) {
        let ledger = build_ledger(&entries);
        let end = at(2025, 2, 1);
        let totals = |cutoff_day: i64| {
            let cache = SnapshotCache::new(
                Arc::clone(&ledger),
                Box::new(MemorySnapshotStore::new()),
                at(2024, 1, 1) + Duration::days(cutoff_day),
            );
            cache.recalculate().unwrap();
            cache
                .get_for_period(epoch(), end)
                .unwrap()
                .into_iter()
                .map(|row| (row.key(), row.income(), row.outcome()))
                .collect::<Vec<_>>()
        };

        prop_assert_eq!(totals(first), totals(second));
    }

    #[test]
    fn prop_split_reconstructs_combined(entries in arb_ledger(), cutoff_day in 0..400i64) {
        let ledger = build_ledger(&entries);
        let cache = SnapshotCache::new(
            Arc::clone(&ledger),
            Box::new(MemorySnapshotStore::new()),
            at(2024, 1, 1) + Duration::days(cutoff_day),
        );
        cache.recalculate().unwrap();

        let direct = aggregate(ledger.transactions());
        let combined = cache.combined_until(at(2025, 2, 1)).unwrap();
        prop_assert_eq!(direct.len(), combined.len());
        for (d, c) in direct.iter().zip(&combined) {
            prop_assert_eq!(d.key(), c.key());
            prop_assert_eq!(c.blocked_period_income + c.fresh_period_income, d.income);
            prop_assert_eq!(c.blocked_period_outcome + c.fresh_period_outcome, d.outcome);
        }
    }

    #[test]
    fn prop_aggregation_ignores_order(entries in arb_ledger()) {
        let ledger = build_ledger(&entries);
        let forward = aggregate(ledger.transactions());
        let backward = aggregate(ledger.transactions().iter().rev());
        prop_assert_eq!(forward, backward);
    }
}
