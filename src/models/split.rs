// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Split/lap records and running elevation statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a split was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Auto,
    Manual,
}

/// A completed distance segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    /// 1-based, contiguous across auto and manual splits
    pub number: u32,
    /// Segment distance in metres
    pub distance: f64,
    /// Segment time in seconds
    pub time: u64,
    /// Segment pace in min/km
    pub pace: f64,
    /// Session distance in metres when the split completed
    pub cumulative_distance: f64,
    /// Elevation gained within the segment
    pub elevation_gain: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SplitKind,
}

/// Elevation statistics updated on every accepted sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Elevation {
    pub gain: f64,
    pub loss: f64,
    pub current: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

impl Elevation {
    /// Fold a new altitude reading into the statistics.
    pub fn record(&mut self, altitude: f64) {
        if let Some(previous) = self.current {
            let delta = altitude - previous;
            if delta > 0.0 {
                self.gain += delta;
            } else {
                self.loss += -delta;
            }
        }
        self.current = Some(altitude);
        self.max = Some(self.max.map_or(altitude, |m| m.max(altitude)));
        self.min = Some(self.min.map_or(altitude, |m| m.min(altitude)));
    }

    /// Take a new reference altitude without counting the change as gain or
    /// loss (first fix after a gap).
    pub fn rebase(&mut self, altitude: f64) {
        self.current = None;
        self.record(altitude);
    }
}
