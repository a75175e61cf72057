//! Shared round-by-destination result grid.
//!
//! One row per round, one column per destination, grown as probes report.
//! All access funnels through a single mutex, so a reader never observes a
//! cell mid-write. Probe tasks write through a [`TableWriter`] handle; the
//! scheduler and renderer read through [`ResultTable`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::probe::Outcome;

struct TableInner {
    /// Column labels in first-seen order.
    destinations: Vec<String>,
    /// One map per materialized round, keyed by destination.
    rows: Vec<HashMap<String, Outcome>>,
}

impl TableInner {
    fn ensure_row(&mut self, round: usize) {
        while self.rows.len() <= round {
            self.rows.push(HashMap::new());
        }
    }

    fn register(&mut self, destination: &str) {
        if !self.destinations.iter().any(|d| d == destination) {
            self.destinations.push(destination.to_string());
        }
    }
}

// Cell writes are single map inserts, so the grid stays consistent even if
// a writer panicked while holding the lock.
fn lock(inner: &Mutex<TableInner>) -> MutexGuard<'_, TableInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Writer
// =============================================================================

/// Write handle for probe tasks.
///
/// Cloneable; all clones write into the same grid.
#[derive(Clone)]
pub struct TableWriter {
    inner: Arc<Mutex<TableInner>>,
}

impl std::fmt::Debug for TableWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableWriter").finish_non_exhaustive()
    }
}

impl TableWriter {
    /// Record the outcome of `destination`'s probe in round `round`.
    ///
    /// Rows up to `round` are materialized if missing, and an unseen
    /// destination is appended to the column set. Writing the same cell
    /// twice keeps the newer outcome.
    pub fn record(&self, round: usize, destination: &str, outcome: Outcome) {
        let mut inner = lock(&self.inner);
        inner.ensure_row(round);
        inner.register(destination);
        if inner.rows[round]
            .insert(destination.to_string(), outcome)
            .is_some()
        {
            tracing::debug!(round, %destination, "Replaced an already recorded cell");
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Round-by-destination result grid for one run.
pub struct ResultTable {
    inner: Arc<Mutex<TableInner>>,
}

impl std::fmt::Debug for ResultTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultTable")
            .field("rows", &self.row_count())
            .field("destinations", &self.destinations())
            .finish_non_exhaustive()
    }
}

impl ResultTable {
    /// Create a grid whose columns are seeded with the run's destinations,
    /// in order. Duplicates are registered once.
    pub fn new(destinations: &[String]) -> Self {
        let mut inner = TableInner {
            destinations: Vec::with_capacity(destinations.len()),
            rows: Vec::new(),
        };
        for destination in destinations {
            inner.register(destination);
        }
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Hand out a write handle for probe tasks.
    pub fn writer(&self) -> TableWriter {
        TableWriter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Materialize the row for `round`, so the round exists even if no
    /// probe ever reports into it.
    pub fn open_round(&self, round: usize) {
        lock(&self.inner).ensure_row(round);
    }

    /// Number of rows materialized so far.
    pub fn row_count(&self) -> usize {
        lock(&self.inner).rows.len()
    }

    /// Outcome recorded for `(row, destination)`, if any.
    pub fn get(&self, row: usize, destination: &str) -> Option<Outcome> {
        lock(&self.inner)
            .rows
            .get(row)
            .and_then(|cells| cells.get(destination))
            .copied()
    }

    /// Column labels in first-seen order.
    pub fn destinations(&self) -> Vec<String> {
        lock(&self.inner).destinations.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn reply(ms: u64) -> Outcome {
        Outcome::Reply {
            rtt: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_new_seeds_columns_in_order() {
        let table = ResultTable::new(&[
            "a".to_string(),
            "b".to_string(),
            "a".to_string(),
            "c".to_string(),
        ]);
        assert_eq!(table.destinations(), vec!["a", "b", "c"]);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_open_round_materializes_rows() {
        let table = ResultTable::new(&[]);
        table.open_round(0);
        assert_eq!(table.row_count(), 1);

        // opening a later round fills the gap
        table.open_round(3);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.get(2, "anything"), None);
    }

    #[test]
    fn test_record_addresses_round_and_destination() {
        let table = ResultTable::new(&["a".to_string(), "b".to_string()]);
        let writer = table.writer();

        writer.record(0, "a", reply(20));
        writer.record(0, "b", Outcome::Failed);
        writer.record(1, "a", reply(30));

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, "a"), Some(reply(20)));
        assert_eq!(table.get(0, "b"), Some(Outcome::Failed));
        assert_eq!(table.get(1, "a"), Some(reply(30)));
        assert_eq!(table.get(1, "b"), None);
    }

    #[test]
    fn test_record_registers_unseen_destination_once() {
        let table = ResultTable::new(&["a".to_string()]);
        let writer = table.writer();

        writer.record(0, "late", reply(5));
        writer.record(1, "late", reply(6));

        assert_eq!(table.destinations(), vec!["a", "late"]);
    }

    #[test]
    fn test_record_overwrite_keeps_newer_outcome() {
        let table = ResultTable::new(&["a".to_string()]);
        let writer = table.writer();

        writer.record(0, "a", reply(20));
        writer.record(0, "a", Outcome::Failed);

        assert_eq!(table.get(0, "a"), Some(Outcome::Failed));
    }

    #[test]
    fn test_writer_clones_share_the_grid() {
        let table = ResultTable::new(&[]);
        let writer = table.writer();
        let clone = writer.clone();

        writer.record(0, "a", reply(1));
        clone.record(0, "b", reply(2));

        assert_eq!(table.get(0, "a"), Some(reply(1)));
        assert_eq!(table.get(0, "b"), Some(reply(2)));
    }

    #[test]
    fn test_concurrent_writers_all_land() {
        let table = ResultTable::new(&[]);
        let mut handles = Vec::new();

        for t in 0u64..8 {
            let writer = table.writer();
            handles.push(std::thread::spawn(move || {
                for round in 0..50 {
                    writer.record(round, &format!("dest-{t}"), reply(t));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.row_count(), 50);
        assert_eq!(table.destinations().len(), 8);
        for t in 0u64..8 {
            for round in 0..50 {
                assert_eq!(table.get(round, &format!("dest-{t}")), Some(reply(t)));
            }
        }
    }
}
