//! `StatsManager`: per-table row counts and per-column HLL sketches (§4.3).

use crate::error::StatsError;
use crate::hll::{Hll, HllSnapshot};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use zero_core::Value;

/// Confidence band for a cardinality estimate, per §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    None,
    Medium,
    High,
}

impl Confidence {
    fn from_estimate(estimate: u64) -> Self {
        if estimate < 100 {
            Confidence::None
        } else if estimate < 1000 {
            Confidence::Medium
        } else {
            Confidence::High
        }
    }
}

/// A data source the stats manager can iterate during a rebuild (§4.3:
/// "a rebuild iterates a data source and re-initializes sketches").
pub trait StatsSource {
    /// Returns, for `table`, the full row count and an iterator of
    /// `(column_name, value)` pairs for every row and column to feed into
    /// fresh sketches.
    fn scan_table<'a>(&'a self, table: &str) -> Box<dyn Iterator<Item = Vec<(String, Value)>> + 'a>;
}

#[derive(Default, Clone)]
struct TableStats {
    row_count: u64,
    deletion_count: u64,
    columns: HashMap<String, Hll>,
}

/// Owns per-table row counts and per-`(table, column)` HLL sketches, and
/// exposes the `onAdd`/`onRemove`/`onEdit` hooks the mutation layer and
/// change-streamer consumer call on every change (§4.3).
#[derive(Default, Clone)]
pub struct StatsManager {
    tables: HashMap<String, TableStats>,
}

impl StatsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_add(&mut self, table: &str, row: &[(&str, &Value)]) {
        let entry = self.tables.entry(table.to_string()).or_default();
        entry.row_count += 1;
        for (column, value) in row {
            entry.columns.entry((*column).to_string()).or_default().add(value);
        }
    }

    /// HLL cannot remove (§3), so only the row/deletion counters move.
    pub fn on_remove(&mut self, table: &str) {
        let entry = self.tables.entry(table.to_string()).or_default();
        entry.row_count = entry.row_count.saturating_sub(1);
        entry.deletion_count += 1;
    }

    pub fn on_edit(&mut self, table: &str, changed: &[(&str, &Value)]) {
        let entry = self.tables.entry(table.to_string()).or_default();
        for (column, new_value) in changed {
            entry.columns.entry((*column).to_string()).or_default().add(new_value);
        }
    }

    pub fn row_count(&self, table: &str) -> u64 {
        self.tables.get(table).map(|t| t.row_count).unwrap_or(0)
    }

    pub fn cardinality(&self, table: &str, column: &str) -> (u64, Confidence) {
        let estimate = self
            .tables
            .get(table)
            .and_then(|t| t.columns.get(column))
            .map(|h| h.count())
            .unwrap_or(0);
        (estimate, Confidence::from_estimate(estimate))
    }

    /// `rowCount / cardinality`, clamped to be finite and `>= 1.0` whenever
    /// cardinality is positive, per the testable property in §8 (HLL
    /// estimation noise can otherwise push the raw ratio below 1).
    pub fn fanout(&self, table: &str, column: &str) -> f64 {
        let (cardinality, _) = self.cardinality(table, column);
        if cardinality == 0 {
            return 1.0;
        }
        let row_count = self.row_count(table) as f64;
        (row_count / cardinality as f64).max(1.0)
    }

    /// §4.3: `deletionRatio = deletions/(rows+deletions)`.
    pub fn should_rebuild(&self, table: &str, threshold: f64) -> bool {
        let Some(stats) = self.tables.get(table) else { return false };
        let denom = stats.row_count + stats.deletion_count;
        if denom == 0 {
            return false;
        }
        let ratio = stats.deletion_count as f64 / denom as f64;
        ratio > threshold
    }

    /// Re-initializes every sketch for `table` from a fresh scan, resetting
    /// `deletionCount` to zero (§4.3, §3 Lifecycles).
    pub fn rebuild(&mut self, table: &str, source: &dyn StatsSource) {
        let mut fresh = TableStats::default();
        for row in source.scan_table(table) {
            fresh.row_count += 1;
            for (column, value) in &row {
                fresh.columns.entry(column.clone()).or_default().add(value);
            }
        }
        self.tables.insert(table.to_string(), fresh);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let tables = self
            .tables
            .iter()
            .map(|(table, stats)| {
                let columns = stats
                    .columns
                    .iter()
                    .map(|(col, hll)| (col.clone(), hll.to_snapshot()))
                    .collect();
                (
                    table.clone(),
                    TableSnapshot { row_count: stats.row_count, deletion_count: stats.deletion_count, columns },
                )
            })
            .collect();
        StatsSnapshot { tables }
    }

    pub fn restore(snapshot: StatsSnapshot) -> Result<Self, StatsError> {
        let mut tables = HashMap::new();
        for (table, table_snap) in snapshot.tables {
            let mut columns = HashMap::new();
            for (col, hll_snap) in table_snap.columns {
                columns.insert(col, Hll::from_snapshot(hll_snap)?);
            }
            tables.insert(
                table,
                TableStats { row_count: table_snap.row_count, deletion_count: table_snap.deletion_count, columns },
            );
        }
        Ok(Self { tables })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub row_count: u64,
    pub deletion_count: u64,
    pub columns: HashMap<String, HllSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatsSnapshot {
    pub tables: HashMap<String, TableSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSource(Vec<(String, Vec<(String, Value)>)>);

    impl StatsSource for VecSource {
        fn scan_table<'a>(&'a self, table: &str) -> Box<dyn Iterator<Item = Vec<(String, Value)>> + 'a> {
            Box::new(self.0.iter().filter(move |(t, _)| t == table).map(|(_, row)| row.clone()))
        }
    }

    #[test]
    fn on_add_increments_row_count_and_sketch() {
        let mut stats = StatsManager::new();
        for i in 0..1000i64 {
            stats.on_add("t", &[("id", &Value::Int64(i))]);
        }
        assert_eq!(stats.row_count("t"), 1000);
        let (card, _) = stats.cardinality("t", "id");
        assert!((card as f64 - 1000.0).abs() / 1000.0 < 0.1);
    }

    #[test]
    fn cardinality_le_row_count_and_fanout_finite() {
        let mut stats = StatsManager::new();
        for i in 0..500i64 {
            stats.on_add("t", &[("id", &Value::Int64(i % 50))]);
        }
        let (card, _) = stats.cardinality("t", "id");
        let fanout = stats.fanout("t", "id");
        assert!(fanout.is_finite());
        assert!(fanout >= 1.0);
        assert!(card <= stats.row_count("t"));
    }

    #[test]
    fn remove_does_not_shrink_cardinality_until_rebuild() {
        let mut stats = StatsManager::new();
        for i in 0..1000i64 {
            stats.on_add("t", &[("id", &Value::Int64(i))]);
        }
        for _ in 0..500 {
            stats.on_remove("t");
        }
        assert_eq!(stats.row_count("t"), 500);
        let (card_before, _) = stats.cardinality("t", "id");
        assert!((card_before as f64 - 1000.0).abs() / 1000.0 < 0.1);

        let source = VecSource((0..500).map(|i| ("t".to_string(), vec![("id".to_string(), Value::Int64(i))])).collect());
        stats.rebuild("t", &source);
        assert_eq!(stats.row_count("t"), 500);
        assert!(!stats.should_rebuild("t", 0.2));
    }

    #[test]
    fn should_rebuild_above_threshold() {
        let mut stats = StatsManager::new();
        for i in 0..100i64 {
            stats.on_add("t", &[("id", &Value::Int64(i))]);
        }
        for _ in 0..30 {
            stats.on_remove("t");
        }
        assert!(stats.should_rebuild("t", 0.2));
        assert!(!stats.should_rebuild("t", 0.5));
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let mut stats = StatsManager::new();
        stats.on_add("t", &[("id", &Value::Int64(1))]);
        let snap = stats.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let parsed: StatsSnapshot = serde_json::from_str(&json).unwrap();
        let restored = StatsManager::restore(parsed).unwrap();
        assert_eq!(restored.row_count("t"), 1);
    }
}
