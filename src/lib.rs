//! # Tide Engine Core Library
//!
//! This library reconstructs a continuous, queryable tidal state for a single
//! coastal station (Rimouski, QC) from sparse or irregular water-level data.
//! It turns either discrete high/low predictions from the DFO water-level API
//! or raw periodic samples from a daily CSV file into one immutable
//! [`TideSnapshot`]: current level, trend direction, next extremum, and the
//! current calendar day's extrema.
//!
//! ## Data Flow
//!
//! 1. A [`tide_data::TideSource`] ([`dfo_api::ApiSource`] or
//!    [`csv_source::CsvSource`]) produces a [`SourceSeries`] of events and/or
//!    raw samples.
//! 2. The CSV path runs its samples through [`extrema::detect`] to recover
//!    high/low events; the API path already yields discrete events.
//! 3. [`snapshot::assemble`] combines the series with the current instant,
//!    using [`interpolate::estimate_level`] and the [`trend`] policies.
//! 4. [`tide_data::TideEngine`] wraps the whole pipeline behind a three-tier
//!    ladder (live fetch, cached snapshot, synthetic model) so a snapshot
//!    always exists, and callers never see a fetch error.
//!
//! ## Degradation Tiers
//!
//! - **Live**: predictions plus a best-effort latest observation.
//! - **Cached**: the previous snapshot while it is within its TTL.
//! - **Synthetic**: [`fallback::idealized_series`], a deterministic
//!   semi-diurnal day, labelled [`SeriesOrigin::Synthetic`] so consumers can
//!   flag reduced accuracy.
//!
//! The rendering layer (clock face, refresh cadence) lives outside this crate
//! and only reads the snapshot structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod csv_source;
pub mod dfo_api;
pub mod extrema;
pub mod fallback;
pub mod interpolate;
pub mod snapshot;
pub mod tide_data;
pub mod timestamp;
pub mod trend;

pub use snapshot::assemble;
pub use tide_data::{DateRange, SnapshotCache, TideEngine, TideError, TideSource};

/// A raw timestamped water-level measurement, not necessarily an extremum.
///
/// Produced by the CSV source at a dense, regular spacing (every few
/// minutes). Levels are meters above chart datum.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use tide_engine::{Sample, TidePoint};
///
/// let sample = Sample {
///     time: Utc.with_ymd_and_hms(2025, 9, 11, 14, 0, 0).unwrap(),
///     level: 3.2,
/// };
/// assert_eq!(sample.level(), Some(3.2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Instant of the measurement
    pub time: DateTime<Utc>,
    /// Water level in meters
    pub level: f64,
}

/// Whether a tide event is a high or low water extremum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    High,
    Low,
}

/// A high or low water extremum with time and (usually) level.
///
/// Either supplied directly by the API or derived from a [`Sample`] series by
/// [`extrema::detect`]. Consecutive events in a valid series strictly
/// alternate high/low (semi-diurnal assumption); the engine does not enforce
/// this, but the trend logic assumes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideEvent {
    /// Instant of the extremum
    pub time: DateTime<Utc>,
    /// High or low water
    pub kind: TideKind,
    /// Water level in meters, when the source supplies one
    pub level: Option<f64>,
}

/// Direction the water level is moving at an instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
}

/// Which tier of the data ladder produced a series or snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesOrigin {
    /// Live DFO predictions (and possibly an observation)
    Api,
    /// Daily CSV prediction file
    LocalCsv,
    /// Idealized fallback model
    Synthetic,
}

/// Raw output of a data source, ready for [`snapshot::assemble`].
///
/// The API path yields events only (`samples` empty); the CSV path yields the
/// raw sample grid plus the events detected from it. The assembler keys its
/// interpolation and trend policies on whether raw samples are present.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceSeries {
    /// High/low events in chronological order
    pub events: Vec<TideEvent>,
    /// Raw sample grid, empty for event-only sources
    pub samples: Vec<Sample>,
    /// Latest live observation in meters, when one was available
    pub observation: Option<f64>,
    /// Tier that produced this series
    pub origin: SeriesOrigin,
}

/// One immutable tidal state at a captured instant.
///
/// Each refresh cycle produces a new snapshot; a prior snapshot is never
/// mutated. The rendering layer only reads this structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideSnapshot {
    /// Estimated or observed water level in meters
    pub current_level: f64,
    /// Direction the level is moving
    pub trend: Trend,
    /// First event strictly after the capture instant, if any
    pub next_event: Option<TideEvent>,
    /// Events within the capture instant's local calendar day
    pub todays_events: Vec<TideEvent>,
    /// Instant this snapshot was produced
    pub captured_at: DateTime<Utc>,
    /// Tier that produced the underlying series
    pub origin: SeriesOrigin,
}

/// A known `(time, level)` point usable for interpolation.
///
/// Implemented by both [`Sample`] (level always present) and [`TideEvent`]
/// (level sometimes absent), so [`interpolate::estimate_level`] works over
/// either series unchanged.
pub trait TidePoint {
    /// Instant of the point
    fn time(&self) -> DateTime<Utc>;
    /// Water level in meters, if known
    fn level(&self) -> Option<f64>;
}

impl TidePoint for Sample {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn level(&self) -> Option<f64> {
        Some(self.level)
    }
}

impl TidePoint for TideEvent {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn level(&self) -> Option<f64> {
        self.level
    }
}
