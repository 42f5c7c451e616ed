// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Configuration loaded from environment variables.
//!
//! Tracking parameters have built-in defaults and can be overridden with
//! `STRIDE_*` variables. The sync binary additionally needs the workout API
//! location.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default number of remote save attempts before a queued workout is dropped.
pub const DEFAULT_MAX_SYNC_ATTEMPTS: u32 = 3;

/// Parameters that shape live session tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Speed (km/h) below which a GPS session auto-pauses
    pub auto_pause_speed_kmh: f64,
    /// Whether speed-based auto-pause is enabled
    pub auto_pause_enabled: bool,
    /// Distance (m) between automatic laps
    pub auto_lap_distance_m: f64,
    /// Body weight (kg) for MET calorie estimates
    pub body_weight_kg: f64,
    /// GPS segments shorter than this (m) are treated as jitter
    pub min_segment_m: f64,
    /// Upper bound on stored route points
    pub route_max_points: usize,
    /// Remote save attempts before a sync-queue entry is dropped
    pub max_sync_attempts: u32,
    /// Period of the duration tick
    pub tick_period: Duration,
    /// Period of the autosave snapshot
    pub autosave_period: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            auto_pause_speed_kmh: 1.0,
            auto_pause_enabled: true,
            auto_lap_distance_m: 1000.0,
            body_weight_kg: 70.0,
            min_segment_m: 2.0,
            route_max_points: 500,
            max_sync_attempts: DEFAULT_MAX_SYNC_ATTEMPTS,
            tick_period: Duration::from_secs(1),
            autosave_period: Duration::from_secs(30),
        }
    }
}

impl TrackerConfig {
    /// Load tracking parameters, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        Ok(Self {
            auto_pause_speed_kmh: parse_or("STRIDE_AUTO_PAUSE_KMH", defaults.auto_pause_speed_kmh)?,
            auto_pause_enabled: parse_or("STRIDE_AUTO_PAUSE", defaults.auto_pause_enabled)?,
            auto_lap_distance_m: parse_or("STRIDE_AUTO_LAP_M", defaults.auto_lap_distance_m)?,
            body_weight_kg: parse_or("STRIDE_BODY_WEIGHT_KG", defaults.body_weight_kg)?,
            min_segment_m: defaults.min_segment_m,
            route_max_points: parse_or("STRIDE_ROUTE_MAX_POINTS", defaults.route_max_points)?,
            max_sync_attempts: parse_or("STRIDE_MAX_SYNC_ATTEMPTS", defaults.max_sync_attempts)?,
            tick_period: defaults.tick_period,
            autosave_period: Duration::from_secs(parse_or(
                "STRIDE_AUTOSAVE_SECS",
                defaults.autosave_period.as_secs(),
            )?),
        })
    }
}

/// Configuration for the `stride-sync` binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the workout API
    pub api_base_url: String,
    /// Bearer token for the workout API
    pub api_token: Option<String>,
    /// Directory backing the local key-value store
    pub data_dir: PathBuf,
    /// Seconds between sync sweeps
    pub sync_interval: Duration,
    pub tracker: TrackerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("API_BASE_URL"))?,
            api_token: env::var("API_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            data_dir: env::var("STRIDE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./stride-data")),
            sync_interval: Duration::from_secs(parse_or("SYNC_INTERVAL_SECS", 300u64)?),
            tracker: TrackerConfig::from_env()?,
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_config_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.auto_pause_speed_kmh, 1.0);
        assert_eq!(config.auto_lap_distance_m, 1000.0);
        assert_eq!(config.body_weight_kg, 70.0);
        assert_eq!(config.max_sync_attempts, 3);
        assert_eq!(config.autosave_period, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_or_invalid_value() {
        env::set_var("STRIDE_TEST_INVALID_NUMBER", "not-a-number");
        let result: Result<f64, _> = parse_or("STRIDE_TEST_INVALID_NUMBER", 1.0);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_app_config_from_env() {
        env::set_var("API_BASE_URL", "https://api.example.com/v1/");
        env::set_var("SYNC_INTERVAL_SECS", "60");

        let config = AppConfig::from_env().expect("Config should load");

        assert_eq!(config.api_base_url, "https://api.example.com/v1");
        assert_eq!(config.sync_interval, Duration::from_secs(60));
    }
}
