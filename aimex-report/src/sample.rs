use aimex_core::{PathSample, Point};

/// One row of the per-trial coordinate table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledRow {
    pub time_ms: u64,
    pub pos: Point,
}

/// Resamples a recorded path on a fixed time grid.
///
/// For each tick from 0 to the trial duration, the row carries the
/// position of the recorded sample nearest in timestamp; no positional
/// interpolation is done between samples.
pub fn sample_by_interval(path: &[PathSample], interval_ms: u64) -> Vec<SampledRow> {
    let Some(last) = path.last() else {
        return Vec::new();
    };
    let interval = interval_ms.max(1);

    let mut rows = Vec::with_capacity((last.elapsed_ms / interval + 1) as usize);
    let mut tick = 0;
    while tick <= last.elapsed_ms {
        let nearest = path
            .iter()
            .min_by_key(|s| s.elapsed_ms.abs_diff(tick))
            .copied()
            .unwrap_or(*last);
        rows.push(SampledRow {
            time_ms: tick,
            pos: nearest.pos,
        });
        tick += interval;
    }
    rows
}
