//! Human-readable labels for times, spans and durations.

use chrono::DateTime;

use crate::timespan::{SECONDS_PER_HOUR, SECONDS_PER_MINUTE, Timed};

/// RFC 1123 style UTC date for a unix timestamp in seconds, or `"whenever"`
/// for an unbounded end.
pub fn describe_time(seconds: f64) -> String {
    if seconds.is_infinite() {
        return "whenever".to_string();
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1.0e9) as u32;
    match DateTime::from_timestamp(whole as i64, nanos) {
        Some(at) => at.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        None => format!("{seconds}s"),
    }
}

pub fn describe_span(span: &impl Timed) -> String {
    format!(
        "from {} to {}",
        describe_time(span.start_time()),
        describe_time(span.end_time())
    )
}

/// `"1h 15m"` style label. Hours are floored, leftover minutes rounded up,
/// and zero parts left out.
pub fn describe_duration(seconds: f64) -> String {
    let hours = (seconds / SECONDS_PER_HOUR).floor();
    let minutes = ((seconds - hours * SECONDS_PER_HOUR) / SECONDS_PER_MINUTE).ceil();
    let mut parts = Vec::with_capacity(2);
    if hours > 0.0 {
        parts.push(format!("{hours:.0}h"));
    }
    if minutes > 0.0 {
        parts.push(format!("{minutes:.0}m"));
    }
    parts.join(" ")
}
