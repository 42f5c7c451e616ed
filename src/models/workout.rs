// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Finalized workout payloads, save results and sync-queue entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{ActivityKind, Elevation, Split, SwimLap};

/// Workout visibility on the remote service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Friends,
    Private,
}

/// Final workout record, as saved remotely and in local history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityKind,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Active seconds
    pub duration: u64,
    pub calories: u32,
    pub completed: bool,
    pub privacy: Privacy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<GpsDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycling: Option<GpsDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swimming: Option<SwimmingDetails>,
}

/// Metrics for GPS-tracked activities (running, cycling).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsDetails {
    /// Metres
    pub distance: f64,
    /// km/h
    pub average_speed: f64,
    pub max_speed: f64,
    /// min/km
    pub average_pace: f64,
    pub best_pace: f64,
    pub elevation: Elevation,
    pub splits: Vec<Split>,
    /// Compressed `lat,lon;lat,lon` route
    #[serde(default)]
    pub route: String,
    /// Encoded polyline (precision 5) of the compressed route
    #[serde(default)]
    pub polyline: String,
    #[serde(default)]
    pub point_count: usize,
}

/// Metrics for pool swimming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimmingDetails {
    pub pool_length: f64,
    /// Metres
    pub total_distance: f64,
    pub laps: Vec<SwimLap>,
    pub total_strokes: u32,
    pub average_swolf: f64,
    pub best_swolf: Option<u64>,
    /// Seconds per 100 m
    pub pace_per_100m: f64,
    /// Lap count per stroke type
    pub stroke_breakdown: BTreeMap<String, u32>,
}

/// Response body of the remote workout-save call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteSaveResponse {
    pub success: bool,
    #[serde(default)]
    pub workout: Option<serde_json::Value>,
    #[serde(default)]
    pub achievements: Vec<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of [`crate::services::ActivityTracker::save_workout`].
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub success: bool,
    pub workout: Option<WorkoutRecord>,
    pub achievements: Vec<serde_json::Value>,
    pub message: String,
    /// Whether the remote service accepted the workout
    pub synced: bool,
}

impl SaveOutcome {
    /// The workout could not be recorded anywhere.
    pub fn failed(error: &dyn std::fmt::Display) -> Self {
        Self {
            success: false,
            workout: None,
            achievements: Vec::new(),
            message: format!("Failed to save workout: {}", error),
            synced: false,
        }
    }
}

/// A workout that failed remote save and awaits a sync sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueEntry {
    #[serde(flatten)]
    pub workout: WorkoutRecord,
    pub needs_sync: bool,
    pub sync_attempts: u32,
    #[serde(default)]
    pub last_sync_attempt: Option<DateTime<Utc>>,
}

impl SyncQueueEntry {
    pub fn new(workout: WorkoutRecord) -> Self {
        Self {
            workout,
            needs_sync: true,
            sync_attempts: 0,
            last_sync_attempt: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> WorkoutRecord {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap();
        WorkoutRecord {
            id: "workout_1".to_string(),
            session_id: "running_1_abcd".to_string(),
            user_id: "user-1".to_string(),
            activity_type: ActivityKind::Running,
            name: "Morning Run".to_string(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            duration: 1800,
            calories: 350,
            completed: true,
            privacy: Privacy::Public,
            notes: None,
            running: Some(GpsDetails::default()),
            cycling: None,
            swimming: None,
        }
    }

    #[test]
    fn test_workout_payload_field_names() {
        let value = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(value["sessionId"], "running_1_abcd");
        assert_eq!(value["userId"], "user-1");
        assert_eq!(value["type"], "running");
        assert_eq!(value["duration"], 1800);
        assert!(value.get("running").is_some());
        assert!(value.get("swimming").is_none());
    }

    #[test]
    fn test_sync_entry_flattens_workout() {
        let entry = SyncQueueEntry::new(sample_record());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["sessionId"], "running_1_abcd");
        assert_eq!(value["needsSync"], true);
        assert_eq!(value["syncAttempts"], 0);

        let parsed: SyncQueueEntry = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, entry);
    }
}
