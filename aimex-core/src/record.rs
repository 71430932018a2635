use serde::{Deserialize, Serialize};

use crate::point::Point;

/// One timestamped point of a cursor trajectory, relative to trial start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    pub pos: Point,
    pub elapsed_ms: u64,
}

/// Recorded outcome of a single trial, immutable once stored.
///
/// The path is time-ordered: the first sample is the trial start at the
/// circle center, the last sample is the crossing point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub path: Vec<PathSample>,
    pub target: Point,
    pub crossing: Point,
}

impl TrialRecord {
    /// Movement duration from trial start to the crossing, in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.path.last().map_or(0, |s| s.elapsed_ms)
    }
}
