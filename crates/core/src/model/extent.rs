use blockgrid_protocol::{Block, TimeSpan};

use crate::timespan::{SECONDS_PER_DAY, SnapStrategy, snap_span, snap_to_unit};

const DEFAULT_ROWS: u32 = 25;

/// The area of the grid worth laying out for a set of blocks: how many rows
/// and which whole days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridExtent {
    pub rows: u32,
    pub time_span: TimeSpan,
}

impl GridExtent {
    /// Rows run to the highest occupied row (25 when nothing is placed yet);
    /// time is snapped outward to UTC day boundaries, or the first day of the
    /// epoch for an empty set.
    pub fn from_blocks<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Self {
        let mut max_row = None::<u32>;
        let mut start = f64::INFINITY;
        let mut end = f64::NEG_INFINITY;
        for block in blocks {
            max_row = Some(max_row.map_or(block.row, |r| r.max(block.row)));
            start = start.min(block.start_time);
            end = end.max(block.end_time);
        }

        let time_span = if start.is_finite() && end.is_finite() {
            snap_span(&TimeSpan::new(start, end), SECONDS_PER_DAY, true)
        } else {
            TimeSpan::new(0.0, SECONDS_PER_DAY)
        };

        Self {
            rows: max_row.map_or(DEFAULT_ROWS, |r| r.saturating_add(1)),
            time_span,
        }
    }
}

/// UTC midnight at or before the earliest block start.
pub fn day_floor<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Option<f64> {
    let earliest = blocks
        .into_iter()
        .map(|b| b.start_time)
        .fold(f64::INFINITY, f64::min);
    earliest
        .is_finite()
        .then(|| snap_to_unit(earliest, SECONDS_PER_DAY, SnapStrategy::Earliest))
}
