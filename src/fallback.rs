//! # Synthetic Tide Model
//!
//! Last tier of the data ladder: an idealized semi-diurnal day used when no
//! live data and no usable cache entry exist. Two lows and two highs at
//! fixed local hours with levels representative of Rimouski's tidal range.
//! Deliberately deterministic: the same calendar day always yields the same
//! four events, so consecutive refreshes agree with each other while the
//! snapshot's origin label tells consumers the data is approximate.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::{timestamp, SeriesOrigin, SourceSeries, TideEvent, TideKind};

/// Local hour-of-day, kind, and level of the idealized semi-diurnal cycle.
const IDEAL_CYCLE: [(i64, TideKind, f64); 4] = [
    (2, TideKind::Low, 0.8),
    (8, TideKind::High, 4.2),
    (14, TideKind::Low, 0.9),
    (20, TideKind::High, 4.1),
];

/// Build the idealized event series anchored to `local_day`.
pub fn idealized_series(local_day: NaiveDate, offset_hours: i32) -> SourceSeries {
    let offset = timestamp::station_offset(offset_hours);
    let midnight = timestamp::to_utc(local_day.and_time(NaiveTime::MIN), offset);

    let events = IDEAL_CYCLE
        .iter()
        .map(|&(hour, kind, level)| TideEvent {
            time: midnight + Duration::hours(hour),
            kind,
            level: Some(level),
        })
        .collect();

    SourceSeries {
        events,
        samples: Vec::new(),
        observation: None,
        origin: SeriesOrigin::Synthetic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const OFFSET_HOURS: i32 = -4;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 11).unwrap()
    }

    #[test]
    fn same_day_yields_identical_series() {
        assert_eq!(
            idealized_series(day(), OFFSET_HOURS),
            idealized_series(day(), OFFSET_HOURS)
        );
    }

    #[test]
    fn cycle_alternates_low_and_high_at_fixed_hours() {
        let series = idealized_series(day(), OFFSET_HOURS);
        assert_eq!(series.origin, SeriesOrigin::Synthetic);
        assert!(series.samples.is_empty());
        assert_eq!(series.observation, None);

        let kinds: Vec<TideKind> = series.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![TideKind::Low, TideKind::High, TideKind::Low, TideKind::High]
        );

        // 02:00 local is 06:00 UTC at the station's fixed offset.
        assert_eq!(
            series.events[0].time,
            Utc.with_ymd_and_hms(2025, 9, 11, 6, 0, 0).unwrap()
        );
        assert_eq!(series.events[3].level, Some(4.1));
    }

    #[test]
    fn events_stay_within_the_anchored_day() {
        let series = idealized_series(day(), OFFSET_HOURS);
        let midnight = Utc.with_ymd_and_hms(2025, 9, 11, 4, 0, 0).unwrap();
        for event in &series.events {
            assert!(event.time >= midnight);
            assert!(event.time < midnight + Duration::hours(24));
        }
    }
}
