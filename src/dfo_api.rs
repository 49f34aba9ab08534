//! # DFO Water-Level API Source
//!
//! Remote tier: fetches predicted high/low events and, best-effort, the
//! latest observation for the configured station.
//!
//! ## Endpoints
//!
//! - `GET {base}/stations/{id}/predictions?start=YYYY-MM-DD&end=YYYY-MM-DD`
//!   — list of predictions, each with an `eventType` tag (`high`/`low`), an
//!   ISO `eventDate`, and a numeric `value`. Mandatory: its failure fails
//!   the tier.
//! - `GET {base}/stations/{id}/observations?start=...&end=...&limit=1`
//!   — recent observations with a numeric `value`. Optional: any failure is
//!   logged and swallowed, and the tier proceeds with predictions only.
//!
//! Both requests go out concurrently; the optional one must not delay the
//! mandatory one's result. Rows with unknown event types or unparseable
//! timestamps are skipped, never fatal.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::tide_data::{DateRange, TideError, TideSource};
use crate::timestamp;
use crate::{SeriesOrigin, SourceSeries, TideEvent, TideKind};

/// Request timeout for both fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote event source backed by the DFO water-level API.
pub struct ApiSource {
    client: Client,
    base_url: String,
    station_id: String,
    offset_hours: i32,
}

impl ApiSource {
    pub fn new(config: &Config) -> Result<Self, TideError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(ApiSource {
            client,
            base_url: config.data.api_base_url.clone(),
            station_id: config.station.id.clone(),
            offset_hours: config.station.utc_offset_hours,
        })
    }

    async fn fetch_predictions(&self, range: &DateRange) -> Result<Vec<TideEvent>, TideError> {
        let url = format!(
            "{}/stations/{}/predictions?start={}&end={}",
            self.base_url, self.station_id, range.start, range.end
        );
        let payload = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        decode_predictions(&payload, self.offset_hours)
    }

    async fn fetch_observation(&self, range: &DateRange) -> Result<Option<f64>, TideError> {
        let url = format!(
            "{}/stations/{}/observations?start={}&end={}&limit=1",
            self.base_url, self.station_id, range.start, range.end
        );
        let payload = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        decode_observation(&payload)
    }
}

impl TideSource for ApiSource {
    async fn fetch_series(&self, range: DateRange) -> Result<SourceSeries, TideError> {
        // The observation is a nice-to-have; both requests go out together
        // so its latency or failure never delays the prediction result.
        let (predictions, observation) = tokio::join!(
            self.fetch_predictions(&range),
            self.fetch_observation(&range),
        );

        let mut events = predictions?;
        events.sort_by_key(|event| event.time);

        let observation = observation.unwrap_or_else(|error| {
            warn!(%error, "observation fetch failed, continuing with predictions only");
            None
        });

        Ok(SourceSeries {
            events,
            samples: Vec::new(),
            observation,
            origin: SeriesOrigin::Api,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PredictionsPayload {
    #[serde(default)]
    predictions: Vec<PredictionRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictionRow {
    event_type: String,
    event_date: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ObservationsPayload {
    #[serde(default)]
    observations: Vec<ObservationRow>,
}

#[derive(Debug, Deserialize)]
struct ObservationRow {
    value: Option<f64>,
}

/// Decode a predictions payload into tide events, skipping rows that are not
/// high/low extrema or carry unparseable timestamps.
fn decode_predictions(payload: &str, offset_hours: i32) -> Result<Vec<TideEvent>, TideError> {
    let payload: PredictionsPayload = serde_json::from_str(payload)?;
    let mut events = Vec::with_capacity(payload.predictions.len());
    for row in payload.predictions {
        let kind = match row.event_type.as_str() {
            "high" => TideKind::High,
            "low" => TideKind::Low,
            other => {
                debug!(event_type = other, "skipping non-extremum prediction row");
                continue;
            }
        };
        let Some(time) = timestamp::normalize(&row.event_date, offset_hours) else {
            debug!(event_date = %row.event_date, "skipping row with unparseable timestamp");
            continue;
        };
        events.push(TideEvent {
            time,
            kind,
            level: row.value,
        });
    }
    Ok(events)
}

/// Decode an observations payload into the latest observed level, if any.
fn decode_observation(payload: &str) -> Result<Option<f64>, TideError> {
    let payload: ObservationsPayload = serde_json::from_str(payload)?;
    Ok(payload.observations.first().and_then(|row| row.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const OFFSET_HOURS: i32 = -4;

    #[test]
    fn decodes_high_and_low_predictions() {
        let payload = r#"{
            "predictions": [
                {"eventType": "low",  "eventDate": "2025-09-11T02:04:00-04:00", "value": 0.8},
                {"eventType": "high", "eventDate": "2025-09-11T08:12:00-04:00", "value": 4.2}
            ]
        }"#;

        let events = decode_predictions(payload, OFFSET_HOURS).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, TideKind::Low);
        assert_eq!(events[0].level, Some(0.8));
        assert_eq!(
            events[0].time,
            Utc.with_ymd_and_hms(2025, 9, 11, 6, 4, 0).unwrap()
        );
        assert_eq!(events[1].kind, TideKind::High);
    }

    #[test]
    fn skips_unknown_event_types_and_bad_timestamps() {
        let payload = r#"{
            "predictions": [
                {"eventType": "slack", "eventDate": "2025-09-11T05:00:00-04:00", "value": 2.0},
                {"eventType": "high",  "eventDate": "not a date",                "value": 4.2},
                {"eventType": "low",   "eventDate": "2025-09-11 14:30",          "value": 0.9}
            ]
        }"#;

        let events = decode_predictions(payload, OFFSET_HOURS).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TideKind::Low);
    }

    #[test]
    fn missing_value_becomes_an_event_without_level() {
        let payload = r#"{
            "predictions": [
                {"eventType": "high", "eventDate": "2025-09-11T08:12:00-04:00", "value": null}
            ]
        }"#;

        let events = decode_predictions(payload, OFFSET_HOURS).unwrap();
        assert_eq!(events[0].level, None);
    }

    #[test]
    fn empty_or_absent_prediction_list_decodes_to_no_events() {
        assert!(decode_predictions(r#"{"predictions": []}"#, OFFSET_HOURS)
            .unwrap()
            .is_empty());
        assert!(decode_predictions(r#"{}"#, OFFSET_HOURS).unwrap().is_empty());
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        assert!(matches!(
            decode_predictions("<html>busy</html>", OFFSET_HOURS),
            Err(TideError::Decode(_))
        ));
    }

    #[test]
    fn observation_takes_the_first_usable_value() {
        let payload = r#"{"observations": [{"value": 3.07}, {"value": 3.11}]}"#;
        assert_eq!(decode_observation(payload).unwrap(), Some(3.07));
    }

    #[test]
    fn null_or_missing_observation_is_none() {
        assert_eq!(
            decode_observation(r#"{"observations": [{"value": null}]}"#).unwrap(),
            None
        );
        assert_eq!(decode_observation(r#"{"observations": []}"#).unwrap(), None);
        assert_eq!(decode_observation(r#"{}"#).unwrap(), None);
    }
}
