// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position samples from location services and accepted route points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw position sample delivered by a location provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Horizontal accuracy in metres
    pub accuracy: Option<f64>,
    /// Provider speed estimate in m/s
    pub speed_hint: Option<f64>,
    /// Capture time; the tracker's time source is used when absent
    pub timestamp: Option<DateTime<Utc>>,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            speed_hint: None,
            timestamp: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Accepted route point. Never mutated after capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub timestamp: DateTime<Utc>,
    /// Instantaneous speed in km/h
    pub speed: f64,
    /// Cumulative session distance in metres at capture
    pub distance: f64,
}
