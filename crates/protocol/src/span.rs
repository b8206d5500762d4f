use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SpanError {
    #[error("span ends before it starts: {start} > {end}")]
    Malformed { start: f64, end: f64 },
    #[error("span bound is NaN")]
    NotANumber,
}

/// A range of time in an arbitrary but consistent unit (seconds in practice).
///
/// Touching endpoints count as overlap throughout the algebra, so two spans
/// sharing an edge are merge candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start_time: f64,
    pub end_time: f64,
}

impl TimeSpan {
    pub const UNBOUNDED: TimeSpan = TimeSpan {
        start_time: f64::NEG_INFINITY,
        end_time: f64::INFINITY,
    };

    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// The "no constraint" sentinel. Not a real range.
    pub fn unbounded() -> Self {
        Self::UNBOUNDED
    }

    pub fn is_unbounded(&self) -> bool {
        self.start_time == f64::NEG_INFINITY && self.end_time == f64::INFINITY
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Check the `start_time <= end_time` precondition the algebra relies on.
    pub fn validate(&self) -> Result<(), SpanError> {
        if self.start_time.is_nan() || self.end_time.is_nan() {
            return Err(SpanError::NotANumber);
        }
        if self.start_time > self.end_time {
            return Err(SpanError::Malformed {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(())
    }
}

/// Half-open range of row indices, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSpan {
    pub start_index: u32,
    pub end_index: u32,
}

impl RowSpan {
    pub fn new(start_index: u32, end_index: u32) -> Self {
        Self {
            start_index,
            end_index,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0, u32::MAX)
    }

    pub fn contains(&self, row: u32) -> bool {
        row >= self.start_index && row < self.end_index
    }

    pub fn is_empty(&self) -> bool {
        self.end_index <= self.start_index
    }
}

/// The query a windower hands to its datasource: a time range crossed with a
/// row range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRange {
    pub time_span: TimeSpan,
    pub row_span: RowSpan,
}

impl GridRange {
    pub fn new(time_span: TimeSpan, row_span: RowSpan) -> Self {
        Self {
            time_span,
            row_span,
        }
    }

    /// Every row at every time.
    pub fn unbounded() -> Self {
        Self::new(TimeSpan::unbounded(), RowSpan::unbounded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_inverted_span() {
        assert!(TimeSpan::new(0.0, 10.0).validate().is_ok());
        assert!(TimeSpan::new(5.0, 5.0).validate().is_ok());
        assert_eq!(
            TimeSpan::new(10.0, 0.0).validate(),
            Err(SpanError::Malformed {
                start: 10.0,
                end: 0.0
            })
        );
        assert_eq!(
            TimeSpan::new(f64::NAN, 0.0).validate(),
            Err(SpanError::NotANumber)
        );
    }

    #[test]
    fn unbounded_sentinels() {
        assert!(TimeSpan::unbounded().is_unbounded());
        assert!(!TimeSpan::new(0.0, f64::INFINITY).is_unbounded());
        let rows = RowSpan::unbounded();
        assert!(rows.contains(0));
        assert!(rows.contains(1_000_000));
    }

    #[test]
    fn row_span_is_half_open() {
        let rows = RowSpan::new(2, 4);
        assert!(!rows.contains(1));
        assert!(rows.contains(2));
        assert!(rows.contains(3));
        assert!(!rows.contains(4));
        assert!(RowSpan::new(3, 3).is_empty());
    }
}
