// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Async plumbing that drives a shared tracker from the tokio runtime.
//!
//! The tracker itself is synchronous. These helpers own the periodic timer,
//! pump a location stream into a GPS tracker, and save without holding the
//! tracker lock across the network call.

use crate::models::{PositionSample, SaveOutcome, SessionState};
use crate::services::location::LocationError;
use crate::services::running::GpsActivity;
use crate::services::tracker::{persist_workout, ActivityCapability, ActivityTracker};
use futures_util::{pin_mut, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub type SharedTracker<C> = Arc<Mutex<ActivityTracker<C>>>;

/// Handle to a running session timer. Dropping it stops the timer.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(self) {
        self.task.abort();
    }

    /// True once the timer loop has exited (session stopped or cleaned up).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Call [`ActivityTracker::on_timer`] every `period` until the session is
/// stopped or the tracker is cleaned up.
pub fn spawn_session_timer<C>(tracker: SharedTracker<C>, period: Duration) -> TimerHandle
where
    C: ActivityCapability + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let mut tracker = tracker.lock().await;
            if tracker.is_cleaned_up() || tracker.state() == SessionState::Stopped {
                tracing::debug!("Session timer exiting");
                break;
            }
            tracker.on_timer();
        }
    });
    TimerHandle { task }
}

/// Feed location updates into a GPS tracker until the stream ends.
///
/// Returns the number of samples accepted into the route. Errors from the
/// stream are reported and do not end the session.
pub async fn feed_positions<S>(tracker: SharedTracker<GpsActivity>, positions: S) -> usize
where
    S: Stream<Item = Result<PositionSample, LocationError>>,
{
    pin_mut!(positions);
    let mut accepted = 0;

    while let Some(update) = positions.next().await {
        let mut tracker = tracker.lock().await;
        match update {
            Ok(sample) => {
                if tracker.handle_position(sample) {
                    accepted += 1;
                }
            }
            Err(e) => tracker.handle_location_error(&e),
        }
    }
    accepted
}

/// Save a shared tracker's workout. The record is built under the lock and
/// persisted after releasing it.
pub async fn save_shared<C: ActivityCapability>(tracker: &Mutex<ActivityTracker<C>>) -> SaveOutcome {
    let (context, prepared) = {
        let mut tracker = tracker.lock().await;
        (tracker.context().clone(), tracker.prepare_workout_data())
    };

    match prepared {
        Ok(record) => persist_workout(&context, record).await,
        Err(e) => {
            tracing::warn!(error = %e, "Could not prepare workout data");
            SaveOutcome::failed(&e)
        }
    }
}
