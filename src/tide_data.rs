//! # Tide Data Acquisition and Caching
//!
//! This module drives the data-source tier ladder and owns the snapshot
//! cache. It is the only place where fetch failures are handled; everything
//! above it sees a snapshot, never an error.
//!
//! ## Tier Ladder
//!
//! 1. **Cache**: a snapshot within its TTL is returned unchanged, with no
//!    network traffic.
//! 2. **Source**: the configured [`TideSource`] fetches a fresh series for a
//!    two-day window (today and tomorrow, so a full tide cycle is covered
//!    near midnight). Success overwrites the cache unconditionally.
//! 3. **Synthetic**: with no fresh data and no usable cache entry, the
//!    idealized model in [`crate::fallback`] guarantees a snapshot. Synthetic
//!    results never populate the cache.
//!
//! ## Error Handling
//!
//! - Malformed rows (timestamp or level) are skipped inside the sources,
//!   never aborting a load.
//! - A failed mandatory fetch aborts the source tier and falls through the
//!   ladder.
//! - The optional observation fetch is swallowed inside [`crate::dfo_api`].
//! - Total unavailability ends at the synthetic tier, which is pure
//!   computation; [`TideEngine::current_snapshot`] is therefore total.
//!
//! ## Concurrency
//!
//! Single refresh in flight at a time is assumed. Overlapping refreshes are
//! not serialized; the last writer wins the cache, which is acceptable given
//! the 15-minute TTL relative to fetch latency.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::io;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::{fallback, snapshot, timestamp, SourceSeries, TideSnapshot};

/// Errors that can occur while producing a source series.
///
/// These never escape [`TideEngine`]; they select the next tier of the
/// ladder. Sources return them so callers embedding a source directly can
/// still distinguish failure modes.
#[derive(Error, Debug)]
pub enum TideError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected payload shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Prediction file operations failed (missing file, permissions)
    #[error("file error: {0}")]
    File(#[from] io::Error),

    /// The source produced no usable rows
    #[error("no usable tide rows")]
    Empty,
}

/// Local calendar-day window a source should cover, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `day` and the day after, guaranteeing full-cycle coverage near
    /// midnight.
    pub fn two_day_window(day: NaiveDate) -> Self {
        DateRange {
            start: day,
            end: day.succ_opt().unwrap_or(day),
        }
    }
}

/// A producer of raw event/sample series for the assembler.
///
/// Implemented by [`crate::dfo_api::ApiSource`] and
/// [`crate::csv_source::CsvSource`]; which one feeds a [`TideEngine`] is the
/// caller's configuration concern.
#[allow(async_fn_in_trait)]
pub trait TideSource {
    /// Fetch the series covering `range`, events sorted chronologically.
    async fn fetch_series(&self, range: DateRange) -> Result<SourceSeries, TideError>;
}

/// One cached snapshot with its capture time.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub snapshot: TideSnapshot,
    pub captured_at: DateTime<Utc>,
}

/// Single-entry snapshot cache with a fixed TTL.
///
/// At most one live entry exists; a superseded entry is discarded, not
/// versioned. The TTL check lives inside [`SnapshotCache::get`], so callers
/// never see an expired snapshot.
#[derive(Debug)]
pub struct SnapshotCache {
    entry: Option<CacheEntry>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(ttl_minutes: u64) -> Self {
        SnapshotCache {
            entry: None,
            ttl: Duration::minutes(ttl_minutes as i64),
        }
    }

    /// Return the cached snapshot if it is still within its TTL.
    pub fn get(&self, now: DateTime<Utc>) -> Option<TideSnapshot> {
        let entry = self.entry.as_ref()?;
        if now - entry.captured_at < self.ttl {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    /// Store `snapshot`, unconditionally discarding any prior entry.
    pub fn put(&mut self, snapshot: TideSnapshot, now: DateTime<Utc>) {
        self.entry = Some(CacheEntry {
            snapshot,
            captured_at: now,
        });
    }

    /// Drop the entry so the next refresh fetches fresh data.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Tide reconstruction engine: one [`TideSource`] behind the tier ladder.
///
/// # Example
/// ```no_run
/// use tide_engine::config::Config;
/// use tide_engine::dfo_api::ApiSource;
/// use tide_engine::TideEngine;
///
/// # async fn run() -> Result<(), tide_engine::TideError> {
/// let config = Config::load();
/// let engine = TideEngine::new(ApiSource::new(&config)?, &config);
/// let snapshot = engine.current_snapshot().await;
/// println!("{:.2} m and {:?}", snapshot.current_level, snapshot.trend);
/// # Ok(())
/// # }
/// ```
pub struct TideEngine<S> {
    source: S,
    cache: Mutex<SnapshotCache>,
    offset_hours: i32,
}

impl<S: TideSource> TideEngine<S> {
    pub fn new(source: S, config: &Config) -> Self {
        TideEngine {
            source,
            cache: Mutex::new(SnapshotCache::new(config.data.cache_ttl_minutes)),
            offset_hours: config.station.utc_offset_hours,
        }
    }

    /// Snapshot for the current wall-clock instant.
    ///
    /// Total: every failure mode resolves to a lower tier, ending at the
    /// synthetic model.
    pub async fn current_snapshot(&self) -> TideSnapshot {
        self.snapshot_at(Utc::now()).await
    }

    /// Snapshot for an explicit instant. Exposed so callers with their own
    /// clock (and tests) can pin `now`.
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> TideSnapshot {
        if let Some(cached) = self.lock_cache().get(now) {
            return cached;
        }

        let local_day = now
            .with_timezone(&timestamp::station_offset(self.offset_hours))
            .date_naive();
        match self.source.fetch_series(DateRange::two_day_window(local_day)).await {
            Ok(series) => {
                info!(
                    origin = ?series.origin,
                    events = series.events.len(),
                    samples = series.samples.len(),
                    "assembled fresh tide series"
                );
                let fresh = snapshot::assemble(&series, now, self.offset_hours);
                self.lock_cache().put(fresh.clone(), now);
                fresh
            }
            Err(error) => {
                warn!(%error, "tide series fetch failed");
                if let Some(cached) = self.lock_cache().get(now) {
                    return cached;
                }
                let series = fallback::idealized_series(local_day, self.offset_hours);
                snapshot::assemble(&series, now, self.offset_hours)
            }
        }
    }

    /// Most recent snapshot still within its TTL, without fetching.
    pub fn cached_snapshot(&self, now: DateTime<Utc>) -> Option<TideSnapshot> {
        self.lock_cache().get(now)
    }

    /// Drop the cached snapshot so the next call fetches fresh data.
    pub fn invalidate_cache(&self) {
        self.lock_cache().invalidate();
    }

    fn lock_cache(&self) -> MutexGuard<'_, SnapshotCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SeriesOrigin, TideEvent, TideKind, Trend};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source stub that serves a fixed series and counts fetches.
    struct StubSource {
        series: Option<SourceSeries>,
        fetches: AtomicUsize,
    }

    impl StubSource {
        fn serving(series: SourceSeries) -> Self {
            StubSource {
                series: Some(series),
                fetches: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            StubSource {
                series: None,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl TideSource for StubSource {
        async fn fetch_series(&self, _range: DateRange) -> Result<SourceSeries, TideError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.series.clone().ok_or(TideError::Empty)
        }
    }

    fn engine_with(source: StubSource) -> TideEngine<StubSource> {
        TideEngine::new(source, &Config::default())
    }

    fn api_series(events: Vec<TideEvent>) -> SourceSeries {
        SourceSeries {
            events,
            samples: Vec::new(),
            observation: None,
            origin: SeriesOrigin::Api,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 11, 16, 0, 0).unwrap() // 12:00 local
    }

    #[tokio::test]
    async fn fresh_cache_short_circuits_the_fetch() {
        let series = api_series(vec![TideEvent {
            time: noon() + Duration::hours(2),
            kind: TideKind::High,
            level: Some(4.2),
        }]);
        let engine = engine_with(StubSource::serving(series));

        let first = engine.snapshot_at(noon()).await;
        let hit = engine.snapshot_at(noon() + Duration::minutes(14)).await;
        assert_eq!(first, hit, "within TTL the identical snapshot is returned");
        assert_eq!(engine.source.fetch_count(), 1);

        engine.snapshot_at(noon() + Duration::minutes(16)).await;
        assert_eq!(engine.source.fetch_count(), 2, "expired cache triggers a refetch");
    }

    #[tokio::test]
    async fn invalidate_forces_a_refetch() {
        let engine = engine_with(StubSource::serving(api_series(Vec::new())));

        engine.snapshot_at(noon()).await;
        assert!(engine.cached_snapshot(noon()).is_some());

        engine.invalidate_cache();
        assert!(engine.cached_snapshot(noon()).is_none());

        engine.snapshot_at(noon() + Duration::minutes(1)).await;
        assert_eq!(engine.source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_falls_back_to_the_synthetic_model() {
        let engine = engine_with(StubSource::failing());

        let snapshot = engine.snapshot_at(noon()).await;
        assert_eq!(snapshot.origin, SeriesOrigin::Synthetic);
        assert_eq!(snapshot.todays_events.len(), 4);
        // Synthetic results must not populate the cache.
        assert!(engine.cached_snapshot(noon()).is_none());
    }

    #[tokio::test]
    async fn synthetic_snapshots_are_deterministic_within_a_day() {
        let engine = engine_with(StubSource::failing());

        let morning = engine.snapshot_at(noon() - Duration::hours(3)).await;
        let afternoon = engine.snapshot_at(noon() + Duration::hours(3)).await;
        assert_eq!(morning.todays_events, afternoon.todays_events);
        assert_ne!(morning.captured_at, afternoon.captured_at);
    }

    #[tokio::test]
    async fn idealized_day_reconstructs_the_expected_state() {
        // 05:00 local sits midway between the 02:00 low (0.8 m) and the
        // 08:00 high (4.2 m): level 2.5 m and rising.
        let five_am_local = Utc.with_ymd_and_hms(2025, 9, 11, 9, 0, 0).unwrap();
        let engine = engine_with(StubSource::failing());

        let snapshot = engine.snapshot_at(five_am_local).await;
        assert!((snapshot.current_level - 2.5).abs() < 1e-9);
        assert_eq!(snapshot.trend, Trend::Rising);

        let next = snapshot.next_event.unwrap();
        assert_eq!(next.kind, TideKind::High);
        assert_eq!(next.time, five_am_local + Duration::hours(3));
        assert_eq!(next.level, Some(4.2));
    }

    #[test]
    fn two_day_window_spans_today_and_tomorrow() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 11).unwrap();
        let range = DateRange::two_day_window(day);
        assert_eq!(range.start, day);
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 9, 12).unwrap());
    }
}
