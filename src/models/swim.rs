// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swimming lap model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeType {
    #[default]
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    Medley,
}

impl StrokeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeType::Freestyle => "freestyle",
            StrokeType::Backstroke => "backstroke",
            StrokeType::Breaststroke => "breaststroke",
            StrokeType::Butterfly => "butterfly",
            StrokeType::Medley => "medley",
        }
    }
}

/// One completed pool length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimLap {
    pub number: u32,
    /// Seconds since the previous lap boundary
    pub time: u64,
    pub stroke_type: StrokeType,
    pub stroke_count: u32,
    /// Pool length in metres
    pub pool_length: f64,
    /// `time + stroke_count`; lower is more efficient
    pub swolf: u64,
    pub timestamp: DateTime<Utc>,
}
