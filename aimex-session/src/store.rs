use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use aimex_core::TrialRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write records: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only store of completed trials for one session.
///
/// Independent of export outcome: report generation works on a snapshot
/// and can never corrupt the records held here.
#[derive(Debug, Clone, Default)]
pub struct TrialStore {
    records: Vec<TrialRecord>,
}

impl TrialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Immutable copy of all records, for export.
    pub fn snapshot(&self) -> Vec<TrialRecord> {
        self.records.clone()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.records)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimex_core::{PathSample, Point};

    fn record(x: f64) -> TrialRecord {
        TrialRecord {
            path: vec![
                PathSample {
                    pos: Point::new(0.0, 0.0),
                    elapsed_ms: 0,
                },
                PathSample {
                    pos: Point::new(x, 0.0),
                    elapsed_ms: 100,
                },
            ],
            target: Point::new(x, 0.0),
            crossing: Point::new(x, 0.0),
        }
    }

    #[test]
    fn snapshot_is_independent_of_later_pushes() {
        let mut store = TrialStore::new();
        store.push(record(1.0));

        let snapshot = store.snapshot();
        store.push(record(2.0));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = TrialStore::new();
        store.push(record(1.0));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn save_json_round_trips_through_serde() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let mut store = TrialStore::new();
        store.push(record(3.0));
        store.save_json(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: Vec<TrialRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].crossing, Point::new(3.0, 0.0));
    }
}
