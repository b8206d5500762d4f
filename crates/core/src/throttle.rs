//! Time-based rate limiting for scroll-driven window recomputation.

use std::time::{Duration, Instant};

/// Lets an action through at most once per `interval`. The first call is
/// always ready.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the action may run at `now`; if so, `now` becomes the last run.
    pub fn ready(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last
            && now.saturating_duration_since(last) < self.interval
        {
            return false;
        }
        self.last = Some(now);
        true
    }

    /// Forget the last run so the next call is ready.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
