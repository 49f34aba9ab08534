//! Timestamp normalization for heterogeneous date/time text.
//!
//! Prediction rows arrive in several shapes: bare dates, date plus
//! hour:minute, full seconds, `T` or space separated, with or without a UTC
//! offset. This module owns all of that variability as an ordered list of
//! parse rules so the rest of the engine only ever sees `DateTime<Utc>`.
//! Offset-less text is interpreted in the station's fixed local offset;
//! date-only text means local midnight.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};

/// Formats carrying an explicit UTC offset, tried in order.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Offset-less formats, interpreted in station local time, tried in order.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_ONLY: &str = "%Y-%m-%d";

/// Parse free-form timestamp text into a canonical UTC instant.
///
/// Returns `None` for text matching none of the known shapes, so callers can
/// skip a malformed row without aborting the whole load. Surrounding ASCII
/// and typographic quotes are stripped first; CSV exports carry them.
pub fn normalize(text: &str, offset_hours: i32) -> Option<DateTime<Utc>> {
    let cleaned = text
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\u{201c}' | '\u{201d}'))
        .trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(cleaned, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    let offset = station_offset(offset_hours);
    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(to_utc(naive, offset));
        }
    }

    // A bare date is the station's local midnight.
    if let Ok(date) = NaiveDate::parse_from_str(cleaned, DATE_ONLY) {
        return Some(to_utc(date.and_time(NaiveTime::MIN), offset));
    }

    None
}

/// Fixed offset for the station. Out-of-range hour values collapse to UTC.
pub(crate) fn station_offset(offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Interpret a naive local datetime in `offset` and convert to UTC.
pub(crate) fn to_utc(naive: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    // Fixed-offset mappings are total; `single()` cannot be ambiguous here.
    match offset.from_local_datetime(&naive).single() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

/// UTC instant of local midnight on the calendar day containing `at`.
pub(crate) fn local_day_start(at: DateTime<Utc>, offset_hours: i32) -> DateTime<Utc> {
    let offset = station_offset(offset_hours);
    let midnight = at.with_timezone(&offset).date_naive().and_time(NaiveTime::MIN);
    to_utc(midnight, offset)
}
