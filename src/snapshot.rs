//! Snapshot assembly: one immutable tidal state from a source series.

use crate::{interpolate, timestamp, trend, SourceSeries, TideSnapshot};
use chrono::{DateTime, Duration, Utc};

/// Combine a source series and the current instant into one [`TideSnapshot`].
///
/// Pure function of its inputs: no side effects beyond construction. The
/// station offset only shapes the local calendar-day filter.
///
/// - `todays_events`: events within `[local midnight, +24h)` of the instant's
///   calendar day, order preserved.
/// - `next_event`: first event strictly after `now`.
/// - `current_level`: the live observation when one is present; otherwise
///   interpolation over the raw samples when the source supplied them,
///   otherwise over the events.
/// - `trend`: window-comparison when raw samples are present (CSV path),
///   event-lookahead otherwise (API and synthetic paths).
pub fn assemble(series: &SourceSeries, now: DateTime<Utc>, offset_hours: i32) -> TideSnapshot {
    let day_start = timestamp::local_day_start(now, offset_hours);
    let day_end = day_start + Duration::hours(24);

    let todays_events = series
        .events
        .iter()
        .filter(|event| event.time >= day_start && event.time < day_end)
        .cloned()
        .collect();

    let next_event = series.events.iter().find(|event| event.time > now).cloned();

    let current_level = match series.observation {
        Some(observed) => observed,
        None if !series.samples.is_empty() => interpolate::estimate_level(&series.samples, now),
        None => interpolate::estimate_level(&series.events, now),
    };

    let trend = if series.samples.is_empty() {
        trend::from_next_event(&series.events, now)
    } else {
        trend::from_recent_samples(&series.samples, now)
    };

    TideSnapshot {
        current_level,
        trend,
        next_event,
        todays_events,
        captured_at: now,
        origin: series.origin,
    }
}
