// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session engine and its collaborators.

pub mod clock;
pub mod driver;
pub mod events;
pub mod geomath;
pub mod haptics;
pub mod location;
pub mod running;
pub mod swimming;
pub mod sync_queue;
pub mod tracker;
pub mod workout_api;

pub use clock::{ClockPoll, SessionClock};
pub use driver::{feed_positions, save_shared, spawn_session_timer, SharedTracker, TimerHandle};
pub use events::{ErrorReporter, ErrorSite, EventBus, ListenerId, TrackerEvent};
pub use haptics::{HapticCue, Haptics, NoopHaptics, RecordingHaptics};
pub use location::{LocationError, LocationProvider, StaticLocationProvider, WatchId, WatchOptions};
pub use running::{CyclingTracker, GpsActivity, RunningTracker, SpeedSample};
pub use swimming::{SwimActivity, SwimmingTracker};
pub use sync_queue::{SyncQueue, SyncReport};
pub use tracker::{
    persist_workout, ActivityCapability, ActivityTracker, BasicActivity, GymTracker, Hooks,
    TrackerContext,
};
pub use workout_api::{HttpWorkoutApi, MockWorkoutApi, WorkoutApi};
