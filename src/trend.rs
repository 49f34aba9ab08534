//! Rising/falling inference at an instant.
//!
//! Two interchangeable policies, matched to what the active source provides:
//! discrete events support a look-ahead to the next extremum, a raw sample
//! grid supports comparing levels across a trailing window. Both are total;
//! indeterminate data defaults to rising.

use crate::{Sample, TideEvent, TideKind, Trend};
use chrono::{DateTime, Duration, Utc};

/// Trailing window the sample-comparison policy looks back over.
const WINDOW_MINUTES: i64 = 60;

/// Event-lookahead policy: rising when the next future event is a high tide,
/// falling when it is a low. No future event defaults to rising.
pub fn from_next_event(events: &[TideEvent], now: DateTime<Utc>) -> Trend {
    match events.iter().find(|event| event.time > now) {
        Some(event) if event.kind == TideKind::Low => Trend::Falling,
        _ => Trend::Rising,
    }
}

/// Window-comparison policy: compare the earliest and latest sample levels in
/// the trailing hour up to `now`. Fewer than two samples in the window
/// defaults to rising.
pub fn from_recent_samples(samples: &[Sample], now: DateTime<Utc>) -> Trend {
    let window_start = now - Duration::minutes(WINDOW_MINUTES);
    let mut recent = samples
        .iter()
        .filter(|sample| sample.time >= window_start && sample.time <= now);

    let Some(earliest) = recent.next() else {
        return Trend::Rising;
    };
    let Some(latest) = recent.last() else {
        return Trend::Rising;
    };

    if latest.level > earliest.level {
        Trend::Rising
    } else {
        Trend::Falling
    }
}
