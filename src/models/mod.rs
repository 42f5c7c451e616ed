// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for sessions, samples, laps and stored workouts.

pub mod gps;
pub mod session;
pub mod split;
pub mod swim;
pub mod workout;

pub use gps::{GpsPoint, PositionSample};
pub use session::{ActivityKind, Session, SessionData, SessionSnapshot, SessionState};
pub use split::{Elevation, Split, SplitKind};
pub use swim::{StrokeType, SwimLap};
pub use workout::{
    GpsDetails, Privacy, RemoteSaveResponse, SaveOutcome, SwimmingDetails,
    SyncQueueEntry, WorkoutRecord,
};
