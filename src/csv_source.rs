//! # Daily CSV Prediction Files
//!
//! Alternative remote tier for deployments that prefer local data: one
//! comma-separated file per calendar day, `timestamp,level` rows after a
//! block of header/metadata lines. The raw sample grid is kept alongside the
//! detected extrema so the assembler can interpolate and infer trend from
//! the denser data.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Config;
use crate::tide_data::{DateRange, TideError, TideSource};
use crate::{extrema, timestamp, Sample, SeriesOrigin, SourceSeries};

/// Local source reading daily prediction CSV files.
pub struct CsvSource {
    dir: PathBuf,
    file_prefix: String,
    station_code: String,
    station_name: String,
    offset_hours: i32,
}

impl CsvSource {
    pub fn new(config: &Config) -> Self {
        CsvSource {
            dir: PathBuf::from(&config.data.csv_dir),
            file_prefix: config.data.csv_file_prefix.clone(),
            station_code: config.data.csv_station_code.clone(),
            station_name: config.station.name.clone(),
            offset_hours: config.station.utc_offset_hours,
        }
    }

    /// Path of the prediction file covering `date`.
    pub fn daily_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}_{}.csv",
            self.file_prefix, self.station_code, self.station_name, date
        ))
    }

    /// Whether a prediction file exists for `date`.
    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.daily_path(date).is_file()
    }

    fn load_samples(&self, path: &Path) -> Result<Vec<Sample>, TideError> {
        let contents = fs::read_to_string(path)?;
        Ok(parse_rows(&contents, self.offset_hours))
    }
}

impl TideSource for CsvSource {
    async fn fetch_series(&self, range: DateRange) -> Result<SourceSeries, TideError> {
        let path = self.daily_path(range.start);
        let samples = self.load_samples(&path)?;
        if samples.is_empty() {
            return Err(TideError::Empty);
        }

        let events = extrema::detect(&samples);
        Ok(SourceSeries {
            events,
            samples,
            observation: None,
            origin: SeriesOrigin::LocalCsv,
        })
    }
}

/// Parse data rows into samples, in chronological order.
///
/// Leading header/metadata lines are skipped until the first date-shaped
/// row. Malformed rows after that are skipped individually; a bad row never
/// aborts the load.
fn parse_rows(contents: &str, offset_hours: i32) -> Vec<Sample> {
    let mut samples = Vec::new();
    let mut in_data = false;

    for line in contents.lines() {
        let line = line.trim();
        if !in_data {
            if looks_like_data_row(line) {
                in_data = true;
            } else {
                continue;
            }
        }
        if line.is_empty() {
            continue;
        }

        let Some((date_text, level_text)) = line.split_once(',') else {
            debug!(row = line, "skipping csv row without a level column");
            continue;
        };
        let Some(time) = timestamp::normalize(date_text, offset_hours) else {
            debug!(row = line, "skipping csv row with unparseable timestamp");
            continue;
        };
        let Ok(level) = level_text.trim().parse::<f64>() else {
            debug!(row = line, "skipping csv row with non-numeric level");
            continue;
        };

        samples.push(Sample { time, level });
    }

    samples.sort_by_key(|sample| sample.time);
    samples
}

/// True for lines shaped like `YYYY-MM-DD…,…`; the first such line marks the
/// end of the header/metadata block.
fn looks_like_data_row(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() > 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
        && line.contains(',')
}
