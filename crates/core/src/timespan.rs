//! Pure functions over `{start_time, end_time}` shaped values.
//!
//! Nothing here validates `start_time <= end_time`; a malformed span yields
//! a defined but negative-duration answer. Check with [`TimeSpan::validate`]
//! before inserting user data.

use blockgrid_protocol::{Block, TimeSpan};
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const SECONDS_PER_HOUR: f64 = SECONDS_PER_MINUTE * 60.0;
pub const SECONDS_PER_DAY: f64 = SECONDS_PER_HOUR * 24.0;

/// Anything with a start and an end in the same time unit.
pub trait Timed {
    fn start_time(&self) -> f64;
    fn end_time(&self) -> f64;

    fn time_span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time(), self.end_time())
    }
}

impl Timed for TimeSpan {
    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn end_time(&self) -> f64 {
        self.end_time
    }
}

impl Timed for Block {
    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn end_time(&self) -> f64 {
        self.end_time
    }
}

impl<T: Timed> Timed for &T {
    fn start_time(&self) -> f64 {
        (**self).start_time()
    }

    fn end_time(&self) -> f64 {
        (**self).end_time()
    }
}

/// Inclusive on both ends.
pub fn contains_time(container: &impl Timed, t: f64) -> bool {
    t >= container.start_time() && t <= container.end_time()
}

pub fn contains_span(container: &impl Timed, span: &impl Timed) -> bool {
    span.start_time() >= container.start_time() && span.end_time() <= container.end_time()
}

pub fn spans_equal(a: &impl Timed, b: &impl Timed) -> bool {
    a.start_time() == b.start_time() && a.end_time() == b.end_time()
}

/// True when the spans share any instant. Exact edge adjacency counts, which
/// is what lets back-to-back blocks of one type coalesce into a single span.
pub fn overlaps(a: &impl Timed, b: &impl Timed) -> bool {
    if a.start_time() == b.end_time() || a.end_time() == b.start_time() {
        return true;
    }
    a.start_time() < b.end_time() && a.end_time() > b.start_time()
}

/// The smallest span enclosing both. Does not require them to overlap.
pub fn merge(a: &impl Timed, b: &impl Timed) -> TimeSpan {
    TimeSpan::new(
        a.start_time().min(b.start_time()),
        a.end_time().max(b.end_time()),
    )
}

/// The span enclosing every span in the set.
///
/// An empty set yields [`TimeSpan::unbounded`], which callers must read as
/// "no constraint" rather than as a real range.
pub fn union_all<T: Timed>(spans: &[T]) -> TimeSpan {
    match spans {
        [] => TimeSpan::unbounded(),
        [only] => only.time_span(),
        [head, rest @ ..] => rest
            .iter()
            .fold(head.time_span(), |union, span| merge(&union, span)),
    }
}

/// Coalesce chronologically ordered spans that overlap (or touch).
pub fn merge_overlaps_in_order(spans: &[TimeSpan]) -> Vec<TimeSpan> {
    let Some((first, rest)) = spans.split_first() else {
        return Vec::new();
    };
    let mut combined = Vec::with_capacity(spans.len());
    let mut current = *first;
    for span in rest {
        if overlaps(&current, span) {
            current = merge(&current, span);
        } else {
            combined.push(current);
            current = *span;
        }
    }
    combined.push(current);
    combined
}

/// The gaps between chronologically sorted, non-overlapping spans, including
/// the open-ended gaps before the first and after the last span. A boundary
/// already at -∞ or +∞ produces no gap on that side.
pub fn invert(spans: &[TimeSpan]) -> Vec<TimeSpan> {
    if spans.is_empty() {
        return vec![TimeSpan::unbounded()];
    }

    let mut start = f64::NEG_INFINITY;
    let mut rest = spans;
    if let Some((first, tail)) = spans.split_first()
        && first.start_time == f64::NEG_INFINITY
    {
        start = first.end_time;
        rest = tail;
    }

    let mut inverted = Vec::with_capacity(rest.len() + 1);
    for span in rest {
        inverted.push(TimeSpan::new(start, span.start_time));
        start = span.end_time;
    }
    if start < f64::INFINITY {
        inverted.push(TimeSpan::new(start, f64::INFINITY));
    }
    inverted
}

/// Rounding direction for [`snap_to_unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapStrategy {
    /// Closer multiple; exactly halfway rounds up.
    #[default]
    Nearest,
    /// Always down.
    Earliest,
    /// Always up. Exact multiples stay put.
    Latest,
}

/// Snap `time` to a multiple of `unit`.
///
/// Offsets are measured with `rem_euclid`, so negative times snap the same
/// way as positive ones. A non-positive unit or non-finite time is returned
/// unchanged.
pub fn snap_to_unit(time: f64, unit: f64, strategy: SnapStrategy) -> f64 {
    if unit.is_nan() || unit <= 0.0 || !time.is_finite() {
        return time;
    }
    let offset = time.rem_euclid(unit);
    let advance = match strategy {
        SnapStrategy::Nearest => offset >= unit * 0.5,
        SnapStrategy::Earliest => false,
        SnapStrategy::Latest => offset > 0.0,
    };
    if advance {
        time + (unit - offset)
    } else {
        time - offset
    }
}

/// Snap both ends of a span. With `grow_only` the start rounds down and the
/// end rounds up, so the result always contains the input.
pub fn snap_span(span: &impl Timed, unit: f64, grow_only: bool) -> TimeSpan {
    let (start, end) = if grow_only {
        (SnapStrategy::Earliest, SnapStrategy::Latest)
    } else {
        (SnapStrategy::Nearest, SnapStrategy::Nearest)
    };
    TimeSpan::new(
        snap_to_unit(span.start_time(), unit, start),
        snap_to_unit(span.end_time(), unit, end),
    )
}
