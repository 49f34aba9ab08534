//! Local extremum detection over a raw sample series.

use crate::{Sample, TideEvent, TideKind};

/// Scan a time-ordered sample series and emit its interior local extrema as
/// high/low tide events, in chronological order.
///
/// Each interior sample is compared to its immediate neighbors: strictly
/// greater than both emits a high, strictly less than both emits a low.
/// Plateaus (a sample equal to a neighbor) are invisible to this detector.
/// Endpoints are never classified, so the first and last tide of a partial
/// window are lost; sources compensate by requesting a full extra day of
/// margin. Series shorter than three samples yield no events.
pub fn detect(samples: &[Sample]) -> Vec<TideEvent> {
    let mut events = Vec::new();
    for window in samples.windows(3) {
        let (prev, current, next) = (&window[0], &window[1], &window[2]);
        let kind = if current.level > prev.level && current.level > next.level {
            TideKind::High
        } else if current.level < prev.level && current.level < next.level {
            TideKind::Low
        } else {
            continue;
        };
        events.push(TideEvent {
            time: current.time,
            kind,
            level: Some(current.level),
        });
    }
    events
}
