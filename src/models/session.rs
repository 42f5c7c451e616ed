// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session identity, lifecycle state and persisted snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::workout::{GpsDetails, SwimmingDetails};

/// Kind of workout being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Running,
    Cycling,
    Swimming,
    Gym,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Running => "running",
            ActivityKind::Cycling => "cycling",
            ActivityKind::Swimming => "swimming",
            ActivityKind::Gym => "gym",
        }
    }

    /// Default calorie burn per active minute.
    pub fn calories_per_minute(&self) -> f64 {
        match self {
            ActivityKind::Running => 12.0,
            ActivityKind::Cycling => 8.0,
            ActivityKind::Swimming => 10.0,
            ActivityKind::Gym => 6.0,
        }
    }

    /// Noun used in generated workout names ("Morning Run").
    pub fn display_noun(&self) -> &'static str {
        match self {
            ActivityKind::Running => "Run",
            ActivityKind::Cycling => "Ride",
            ActivityKind::Swimming => "Swim",
            ActivityKind::Gym => "Workout",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Active,
    Paused,
    Stopped,
}

/// Identity and temporal envelope of one workout attempt.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Option<String>,
    pub kind: ActivityKind,
    pub user_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Accumulated active seconds
    pub duration: u64,
    pub state: SessionState,
}

impl Session {
    pub fn new(kind: ActivityKind, user_id: Option<String>) -> Self {
        Self {
            session_id: None,
            kind,
            user_id,
            start_time: None,
            end_time: None,
            duration: 0,
            state: SessionState::Idle,
        }
    }

    /// Active covers both running and paused sessions.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration as f64 / 60.0
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration as f64 / 3600.0
    }
}

/// Autosaved snapshot, stored under `active_session_<sessionId>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityKind,
    pub user_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration: u64,
    pub calories: u32,
    pub is_active: bool,
    pub is_paused: bool,
    pub saved_at: DateTime<Utc>,
}

/// Session snapshot enriched with activity metrics, ready to become a workout.
#[derive(Debug, Clone)]
pub struct SessionData {
    pub session: Session,
    pub calories: u32,
    pub gps: Option<GpsDetails>,
    pub swimming: Option<SwimmingDetails>,
}

impl SessionData {
    pub fn new(session: Session, calories: u32) -> Self {
        Self {
            session,
            calories,
            gps: None,
            swimming: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ActivityKind::Swimming).unwrap();
        assert_eq!(json, "\"swimming\"");
    }

    #[test]
    fn test_paused_session_is_active() {
        let mut session = Session::new(ActivityKind::Running, None);
        assert!(!session.is_active());
        session.state = SessionState::Paused;
        assert!(session.is_active());
        assert!(session.is_paused());
    }
}
