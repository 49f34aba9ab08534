//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! tide-config.toml file. It provides a centralized way to configure the
//! water-level station, data-source settings, and cache behavior.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Water-level station configuration
    pub station: StationConfig,
    /// Data-source and cache configuration
    pub data: DataConfig,
}

/// Water-level station configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationConfig {
    /// DFO station ID (e.g., "03360" for Rimouski, QC)
    pub id: String,
    /// Human-readable station name, also used in CSV file names
    pub name: String,
    /// Fixed UTC offset in hours, applied to offset-less timestamps and
    /// local calendar-day boundaries
    pub utc_offset_hours: i32,
}

/// Data-source and cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Base URL of the water-level API
    pub api_base_url: String,
    /// Snapshot cache TTL in minutes
    pub cache_ttl_minutes: u64,
    /// Prefer the daily CSV files over the remote API
    pub prefer_local: bool,
    /// Directory holding the daily prediction CSV files
    pub csv_dir: String,
    /// Leading component of the daily CSV file name
    pub csv_file_prefix: String,
    /// Station code embedded in the daily CSV file name
    pub csv_station_code: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            station: StationConfig {
                id: "03360".to_string(),
                name: "Rimouski".to_string(),
                utc_offset_hours: -4,
            },
            data: DataConfig {
                api_base_url: "https://api.waterlevels.gc.ca/api/v1".to_string(),
                cache_ttl_minutes: 15,
                prefer_local: false,
                csv_dir: "/prediction".to_string(),
                csv_file_prefix: "pr\u{e9}dictions".to_string(),
                csv_station_code: "02985".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from tide-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("tide-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(station = %config.station.name, "loaded configuration");
                    config
                }
                Err(error) => {
                    warn!(%error, "invalid config file format, using Rimouski defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using Rimouski defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to tide-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("tide-config.toml", contents)?;
        Ok(())
    }
}
