//! Time-windowed linear interpolation between known water-level points.

use crate::TidePoint;
use chrono::{DateTime, Utc};

/// Level reported when no usable bracket exists, in meters.
///
/// The clock face must always render a number, so indeterminate interpolation
/// resolves to a mid-range value rather than an error.
pub const DEFAULT_LEVEL_M: f64 = 2.5;

/// Estimate the water level at `at` by linear interpolation between the
/// consecutive pair of points bracketing it.
///
/// The bracket is the first consecutive pair with `t0 <= at <= t1` and
/// `t0 < t1`; a zero-width pair (duplicate timestamps) is not a bracket.
/// Returns [`DEFAULT_LEVEL_M`] when `at` lies outside the series span, fewer
/// than two points exist, or a bracket point carries no level.
pub fn estimate_level<P: TidePoint>(points: &[P], at: DateTime<Utc>) -> f64 {
    let bracket = points
        .windows(2)
        .find(|pair| pair[0].time() <= at && at <= pair[1].time() && pair[0].time() < pair[1].time());
    let Some(pair) = bracket else {
        return DEFAULT_LEVEL_M;
    };
    let (Some(before), Some(after)) = (pair[0].level(), pair[1].level()) else {
        return DEFAULT_LEVEL_M;
    };

    let span = (pair[1].time() - pair[0].time()).num_seconds() as f64;
    let progress = (at - pair[0].time()).num_seconds() as f64 / span;
    before + (after - before) * progress
}
