//! The 15-minute time quantum (SPEC_FULL.md §3, "Time quantum").

use chrono::{DateTime, Duration, Timelike, Utc};

/// Length of one accounting interval.
pub const INTERVAL_MINUTES: i64 = 15;

/// Floor `timestamp_ms` (epoch milliseconds) down to the start of its
/// containing 15-minute interval: minutes rounded down to the nearest
/// multiple of 15, seconds and milliseconds zeroed.
pub fn normalize_interval_ms(timestamp_ms: i64) -> i64 {
    let dt = epoch_ms_to_utc(timestamp_ms);
    let floored_minute = (dt.minute() as i64 / INTERVAL_MINUTES) * INTERVAL_MINUTES;
    dt.with_minute(floored_minute as u32)
        .and_then(|dt| dt.with_second(0))
        .and_then(|dt| dt.with_nanosecond(0))
        .expect("floored minute/second/nanosecond are always in range")
        .timestamp_millis()
}

/// Enumerate every interval boundary in `[start_ms, end_ms)`, used to sum
/// delta metrics: `T0 = start, T1 = start + 15min, …, Tn` where `Tn` is the
/// last boundary strictly less than `end_ms`.
///
/// Intervals are advanced in calendar time (`DateTime + Duration::minutes(15)`)
/// rather than by a fixed integer millisecond offset, so the sequence stays
/// correct if this function is ever asked to reason in a timezone with
/// daylight-saving transitions, even though the values themselves are UTC
/// epoch-milliseconds (SPEC_FULL.md §4.4).
pub fn delta_intervals(start_ms: i64, end_ms: i64) -> Vec<i64> {
    if start_ms >= end_ms {
        return Vec::new();
    }
    let mut boundaries = Vec::new();
    let mut cursor = epoch_ms_to_utc(start_ms);
    let end = epoch_ms_to_utc(end_ms);
    while cursor < end {
        boundaries.push(cursor.timestamp_millis());
        cursor += Duration::minutes(INTERVAL_MINUTES);
    }
    boundaries
}

/// Enumerate the boundaries used for absolute-metric lookups: every value
/// [`delta_intervals`] would produce, plus `end_ms` itself appended as the
/// final boundary (SPEC_FULL.md §4.4: "the list also includes end itself as
/// the final boundary for absolute lookup but not for delta summation").
pub fn absolute_boundaries(start_ms: i64, end_ms: i64) -> Vec<i64> {
    let mut boundaries = delta_intervals(start_ms, end_ms);
    if boundaries.last().copied() != Some(end_ms) {
        boundaries.push(end_ms);
    }
    boundaries
}

fn epoch_ms_to_utc(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .unwrap_or_else(|| panic!("timestamp {timestamp_ms} out of range for DateTime<Utc>"))
}
