// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle engine shared by every activity.
//!
//! Handles the core workflow:
//! 1. Start/pause/resume/stop with a drift-free clock
//! 2. Periodic duration ticks and autosave snapshots
//! 3. Final save: remote first, local history + sync queue on failure
//! 4. Restoring an autosaved session after an unexpected restart
//!
//! Activity-specific behaviour plugs in through [`ActivityCapability`].

use crate::config::TrackerConfig;
use crate::db::{self, keys, KeyValueStore};
use crate::error::{Result, StoreError, TrackerError};
use crate::models::{
    ActivityKind, Privacy, SaveOutcome, Session, SessionData, SessionSnapshot, SessionState,
    WorkoutRecord,
};
use crate::services::clock::SessionClock;
use crate::services::events::{ErrorReporter, ErrorSite, EventBus, ListenerId, TrackerEvent};
use crate::services::haptics::{HapticCue, Haptics, NoopHaptics};
use crate::services::sync_queue::SyncQueue;
use crate::services::workout_api::WorkoutApi;
use crate::time_utils::{time_of_day_label, TimeSource};
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

/// Collaborators shared by trackers.
#[derive(Clone)]
pub struct TrackerContext {
    pub config: TrackerConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub api: Arc<dyn WorkoutApi>,
    pub time: Arc<dyn TimeSource>,
    pub haptics: Arc<dyn Haptics>,
    pub errors: ErrorReporter,
    pub sync_queue: SyncQueue,
}

impl TrackerContext {
    pub fn new(
        config: TrackerConfig,
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn WorkoutApi>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let sync_queue = SyncQueue::new(store.clone(), time.clone(), config.max_sync_attempts);
        Self {
            config,
            store,
            api,
            time,
            haptics: Arc::new(NoopHaptics),
            errors: ErrorReporter::new(),
            sync_queue,
        }
    }

    pub fn with_haptics(mut self, haptics: Arc<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    /// Fire a haptic cue, reporting (never propagating) failures.
    pub fn signal(&self, cue: HapticCue) {
        if let Err(e) = self.haptics.signal(cue) {
            self.errors.report(ErrorSite::Haptics, &e);
        }
    }
}

/// View of the tracker handed to capability hooks.
pub struct Hooks<'a> {
    pub session: &'a Session,
    pub context: &'a TrackerContext,
    events: &'a EventBus,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(session: &'a Session, context: &'a TrackerContext, events: &'a EventBus) -> Self {
        Self {
            session,
            context,
            events,
        }
    }

    pub fn emit(&self, event: TrackerEvent) {
        self.events.emit(event);
    }

    pub fn signal(&self, cue: HapticCue) {
        self.context.signal(cue);
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.context.time.now()
    }
}

/// Activity-specific behaviour invoked by the engine at fixed lifecycle points.
pub trait ActivityCapability: Send {
    fn kind(&self) -> ActivityKind;

    /// Called before the session becomes active. An error aborts `start()`.
    fn on_start(&mut self, _hooks: &Hooks<'_>) -> Result<()> {
        Ok(())
    }

    fn on_pause(&mut self, _hooks: &Hooks<'_>, _auto: bool) {}

    fn on_resume(&mut self, _hooks: &Hooks<'_>, _auto: bool) {}

    fn on_stop(&mut self, _hooks: &Hooks<'_>) {}

    /// Called on every timer firing, after the clock has been serviced.
    fn on_timer(&mut self, _hooks: &Hooks<'_>) {}

    /// Release collaborator registrations. Must tolerate repeated calls.
    fn cleanup(&mut self, _context: &TrackerContext) {}

    fn calculate_calories(&self, session: &Session, _config: &TrackerConfig) -> u32 {
        base_calories(session)
    }

    fn enhance_session_data(&self, _data: &mut SessionData, _config: &TrackerConfig) {}

    fn prepare_final_payload(
        &self,
        _data: &SessionData,
        _record: &mut WorkoutRecord,
        _config: &TrackerConfig,
    ) -> Result<()> {
        Ok(())
    }
}

/// Default estimate: `round(minutes * rate)` with the per-activity rate table.
pub fn base_calories(session: &Session) -> u32 {
    (session.duration_minutes() * session.kind.calories_per_minute()).round() as u32
}

/// Capability with no activity-specific metrics (gym, or any untracked sport).
#[derive(Debug, Clone, Copy)]
pub struct BasicActivity {
    kind: ActivityKind,
}

impl BasicActivity {
    pub fn new(kind: ActivityKind) -> Self {
        Self { kind }
    }
}

impl ActivityCapability for BasicActivity {
    fn kind(&self) -> ActivityKind {
        self.kind
    }
}

pub type GymTracker = ActivityTracker<BasicActivity>;

/// Lifecycle engine for one workout session.
pub struct ActivityTracker<C: ActivityCapability> {
    pub(crate) session: Session,
    pub(crate) clock: SessionClock,
    pub(crate) capability: C,
    pub(crate) context: TrackerContext,
    pub(crate) events: EventBus,
    name: Option<String>,
    notes: Option<String>,
    privacy: Privacy,
    cleaned_up: bool,
}

impl GymTracker {
    pub fn gym(user_id: Option<String>, context: TrackerContext) -> Self {
        Self::new(BasicActivity::new(ActivityKind::Gym), user_id, context)
    }
}

impl<C: ActivityCapability> ActivityTracker<C> {
    pub fn new(capability: C, user_id: Option<String>, context: TrackerContext) -> Self {
        let clock = SessionClock::new(
            context.time.clone(),
            context.config.tick_period,
            context.config.autosave_period,
        );
        let events = EventBus::new(context.errors.clone());
        Self {
            session: Session::new(capability.kind(), user_id),
            clock,
            capability,
            context,
            events,
            name: None,
            notes: None,
            privacy: Privacy::default(),
            cleaned_up: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.session_id.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.session.is_paused()
    }

    /// Active seconds, live while the clock runs.
    pub fn duration(&self) -> u64 {
        if self.clock.is_running() {
            self.clock.elapsed()
        } else {
            self.session.duration
        }
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    pub fn context(&self) -> &TrackerContext {
        &self.context
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = Some(notes.into());
    }

    pub fn set_privacy(&mut self, privacy: Privacy) {
        self.privacy = privacy;
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&TrackerEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Copy the live clock value into the session.
    pub(crate) fn sync_duration(&mut self) -> u64 {
        if self.clock.is_running() {
            self.session.duration = self.clock.elapsed();
        }
        self.session.duration
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Start a new session. Returns false if one was already started or the
    /// activity could not be set up (e.g. location permission denied).
    pub fn start(&mut self) -> bool {
        if self.cleaned_up || self.session.state != SessionState::Idle {
            return false;
        }

        let now = self.context.time.now();
        let session_id = generate_id(self.session.kind.as_str(), now);
        self.session.session_id = Some(session_id.clone());
        self.session.start_time = Some(now);
        self.session.end_time = None;
        self.session.duration = 0;

        let hooks = Hooks::new(&self.session, &self.context, &self.events);
        if let Err(e) = self.capability.on_start(&hooks) {
            tracing::warn!(kind = %self.session.kind, error = %e, "Failed to start session");
            self.session.session_id = None;
            self.session.start_time = None;
            return false;
        }

        self.session.state = SessionState::Active;
        self.clock.start();

        tracing::info!(session_id = %session_id, kind = %self.session.kind, "Session started");
        self.events.emit(TrackerEvent::Started { session_id });
        true
    }

    pub fn pause(&mut self) -> bool {
        self.pause_with(false)
    }

    pub fn resume(&mut self) -> bool {
        self.resume_with(false)
    }

    pub(crate) fn pause_with(&mut self, auto: bool) -> bool {
        if self.cleaned_up || self.session.state != SessionState::Active {
            return false;
        }
        self.clock.pause();
        self.session.duration = self.clock.elapsed();
        self.session.state = SessionState::Paused;

        self.context.signal(HapticCue::Pause);
        let hooks = Hooks::new(&self.session, &self.context, &self.events);
        self.capability.on_pause(&hooks, auto);

        tracing::debug!(duration = self.session.duration, auto, "Session paused");
        self.events.emit(TrackerEvent::Paused { auto });
        true
    }

    pub(crate) fn resume_with(&mut self, auto: bool) -> bool {
        if self.cleaned_up || self.session.state != SessionState::Paused {
            return false;
        }
        self.clock.resume();
        self.session.state = SessionState::Active;

        self.context.signal(HapticCue::Resume);
        let hooks = Hooks::new(&self.session, &self.context, &self.events);
        self.capability.on_resume(&hooks, auto);

        tracing::debug!(duration = self.session.duration, auto, "Session resumed");
        self.events.emit(TrackerEvent::Resumed { auto });
        true
    }

    /// Finalize the session. A second call is a no-op returning false.
    pub fn stop(&mut self) -> bool {
        if self.cleaned_up || !self.session.is_active() {
            return false;
        }
        self.session.end_time = Some(self.context.time.now());
        self.clock.stop();
        self.session.duration = self.clock.elapsed();
        self.session.state = SessionState::Stopped;

        self.context.signal(HapticCue::Stop);
        let hooks = Hooks::new(&self.session, &self.context, &self.events);
        self.capability.on_stop(&hooks);

        tracing::info!(
            session_id = self.session_id().unwrap_or_default(),
            duration = self.session.duration,
            "Session stopped"
        );
        self.events.emit(TrackerEvent::Stopped {
            duration: self.session.duration,
        });
        true
    }

    /// Service the clock: duration ticks, autosave, activity timers.
    pub fn on_timer(&mut self) {
        if self.cleaned_up {
            return;
        }

        let poll = self.clock.poll();
        if let Some(seconds) = poll.tick {
            self.session.duration = seconds;
            self.events.emit(TrackerEvent::DurationTick { seconds });
        }
        if poll.autosave && self.session.is_active() {
            self.auto_save();
        }

        let hooks = Hooks::new(&self.session, &self.context, &self.events);
        self.capability.on_timer(&hooks);
    }

    /// Release timers, collaborators and listeners. Safe to call repeatedly,
    /// including on a tracker that was never started.
    pub fn cleanup(&mut self) {
        if self.clock.is_running() {
            self.clock.stop();
        }
        self.capability.cleanup(&self.context);
        self.events.clear();
        if !self.cleaned_up {
            tracing::debug!(session_id = self.session_id().unwrap_or_default(), "Tracker cleaned up");
        }
        self.cleaned_up = true;
    }

    // ─── Persistence ─────────────────────────────────────────────

    /// Write a snapshot for crash recovery. Never fails outward.
    pub fn auto_save(&mut self) -> bool {
        let Some(snapshot) = self.snapshot() else {
            return false;
        };
        let key = keys::active_session(&snapshot.session_id);

        match db::set_json(self.context.store.as_ref(), &key, &snapshot) {
            Ok(()) => {
                tracing::debug!(session_id = %snapshot.session_id, duration = snapshot.duration, "Session autosaved");
                self.events.emit(TrackerEvent::AutoSaved {
                    session_id: snapshot.session_id,
                });
                true
            }
            Err(e) => {
                self.context.errors.report(ErrorSite::AutoSave, &e);
                false
            }
        }
    }

    fn snapshot(&mut self) -> Option<SessionSnapshot> {
        let duration = self.sync_duration();
        let session_id = self.session.session_id.clone()?;
        let start_time = self.session.start_time?;
        Some(SessionSnapshot {
            session_id,
            activity_type: self.session.kind,
            user_id: self.session.user_id.clone(),
            start_time,
            duration,
            calories: base_calories(&self.session),
            is_active: self.session.is_active(),
            is_paused: self.session.is_paused(),
            saved_at: self.context.time.now(),
        })
    }

    /// Reload an autosaved session after an unexpected restart.
    ///
    /// Returns the stored snapshot, or `None` if there is none, it cannot be
    /// resumed, or this tracker is already running or cleaned up. Active
    /// snapshots are resumed with their duration intact and their original
    /// session id.
    pub fn restore_session(&mut self, session_id: &str) -> Option<SessionSnapshot> {
        if self.cleaned_up || self.session.is_active() {
            return None;
        }

        let key = keys::active_session(session_id);
        let snapshot: SessionSnapshot = match db::get_json(self.context.store.as_ref(), &key) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return None,
            Err(e) => {
                self.context.errors.report(ErrorSite::Storage, &e);
                return None;
            }
        };

        if !snapshot.is_active || snapshot.activity_type != self.session.kind {
            return Some(snapshot);
        }

        self.clock.reset();
        if !self.clock.start_from(snapshot.duration) {
            let e = StoreError::Corrupt {
                key,
                message: format!("duration {} out of range", snapshot.duration),
            };
            self.context.errors.report(ErrorSite::Storage, &e);
            return None;
        }

        self.session.session_id = Some(snapshot.session_id.clone());
        self.session.start_time = Some(snapshot.start_time);
        self.session.end_time = None;
        self.session.duration = snapshot.duration;
        if snapshot.user_id.is_some() {
            self.session.user_id = snapshot.user_id.clone();
        }

        let hooks = Hooks::new(&self.session, &self.context, &self.events);
        if let Err(e) = self.capability.on_start(&hooks) {
            self.context.errors.report(ErrorSite::Location, &e);
        }

        if snapshot.is_paused {
            self.clock.pause();
            self.session.state = SessionState::Paused;
        } else {
            self.session.state = SessionState::Active;
        }

        tracing::info!(
            session_id = %snapshot.session_id,
            duration = snapshot.duration,
            paused = snapshot.is_paused,
            "Session restored"
        );
        Some(snapshot)
    }

    // ─── Workout data ────────────────────────────────────────────

    pub fn calculate_calories(&mut self) -> u32 {
        self.sync_duration();
        self.capability
            .calculate_calories(&self.session, &self.context.config)
    }

    /// Session snapshot plus calories and activity metrics.
    pub fn enhance_session_data(&mut self) -> Result<SessionData> {
        if self.session.session_id.is_none() {
            return Err(TrackerError::NotStarted);
        }
        let calories = self.calculate_calories();
        let mut data = SessionData::new(self.session.clone(), calories);
        self.capability
            .enhance_session_data(&mut data, &self.context.config);
        Ok(data)
    }

    /// Build the final workout record. Fails if the session has no owner.
    pub fn prepare_workout_data(&mut self) -> Result<WorkoutRecord> {
        let data = self.enhance_session_data()?;
        let session = &data.session;

        let user_id = session
            .user_id
            .clone()
            .ok_or(TrackerError::MissingField("userId"))?;
        let session_id = session
            .session_id
            .clone()
            .ok_or(TrackerError::NotStarted)?;
        let start_time = session.start_time.ok_or(TrackerError::NotStarted)?;
        let now = self.context.time.now();

        let mut record = WorkoutRecord {
            id: generate_id("workout", now),
            session_id,
            user_id,
            activity_type: session.kind,
            name: self
                .name
                .clone()
                .unwrap_or_else(|| default_workout_name(session.kind, start_time)),
            start_time,
            end_time: session.end_time.unwrap_or(now),
            duration: session.duration,
            calories: data.calories,
            completed: true,
            privacy: self.privacy,
            notes: self.notes.clone(),
            running: None,
            cycling: None,
            swimming: None,
        };

        self.capability
            .prepare_final_payload(&data, &mut record, &self.context.config)?;
        Ok(record)
    }

    /// Persist the finished workout: remote first, local fallback otherwise.
    pub async fn save_workout(&mut self) -> SaveOutcome {
        match self.prepare_workout_data() {
            Ok(record) => persist_workout(&self.context, record).await,
            Err(e) => {
                tracing::warn!(error = %e, "Could not prepare workout data");
                SaveOutcome::failed(&e)
            }
        }
    }
}

/// Save a prepared workout.
///
/// On remote success the workout goes to local history and the autosave
/// snapshot is removed. On remote failure the workout still goes to local
/// history, is queued for a later sync sweep, and the save counts as a
/// success. Only a failure to record it locally is reported as failure.
pub async fn persist_workout(context: &TrackerContext, record: WorkoutRecord) -> SaveOutcome {
    let remote = context
        .api
        .save_workout(record.activity_type, &record)
        .await;

    let store = context.store.as_ref();
    let autosave_key = keys::active_session(&record.session_id);

    match remote {
        Ok(response) if response.success => {
            if let Err(e) = db::append_history(store, &record) {
                context.errors.report(ErrorSite::Storage, &e);
            }
            if let Err(e) = store.remove(&autosave_key) {
                context.errors.report(ErrorSite::Storage, &e);
            }
            tracing::info!(session_id = %record.session_id, "Workout saved");
            SaveOutcome {
                success: true,
                message: response
                    .message
                    .unwrap_or_else(|| "Workout saved successfully".to_string()),
                achievements: response.achievements,
                workout: Some(record),
                synced: true,
            }
        }
        remote => {
            let reason = match remote {
                Err(e) => e.to_string(),
                Ok(response) => response
                    .message
                    .unwrap_or_else(|| "workout rejected".to_string()),
            };
            tracing::warn!(session_id = %record.session_id, error = %reason, "Remote save failed, saving locally");

            if let Err(e) = db::append_history(store, &record) {
                tracing::error!(session_id = %record.session_id, error = %e, "Local save failed");
                return SaveOutcome::failed(&e);
            }
            let message = match context.sync_queue.enqueue(record.clone()).await {
                Ok(()) => "Workout saved locally, will sync when online",
                Err(e) => {
                    tracing::warn!(session_id = %record.session_id, error = %e, "Could not queue workout for sync");
                    context.errors.report(ErrorSite::Storage, &e);
                    "Workout saved locally, but could not be queued for sync"
                }
            };
            if let Err(e) = store.remove(&autosave_key) {
                context.errors.report(ErrorSite::Storage, &e);
            }
            SaveOutcome {
                success: true,
                workout: Some(record),
                achievements: Vec::new(),
                message: message.to_string(),
                synced: false,
            }
        }
    }
}

/// `<prefix>_<millis>_<random hex>`.
pub(crate) fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    let mut bytes = [0u8; 4];
    let suffix = match SystemRandom::new().fill(&mut bytes) {
        Ok(()) => hex::encode(bytes),
        Err(_) => format!("{:08x}", now.timestamp_subsec_nanos()),
    };
    format!("{}_{}_{}", prefix, now.timestamp_millis(), suffix)
}

fn default_workout_name(kind: ActivityKind, start: DateTime<Utc>) -> String {
    format!("{} {}", time_of_day_label(start), kind.display_noun())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_id_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap();
        let id = generate_id("running", now);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "running");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 8);
        assert_ne!(generate_id("running", now), id);
    }

    #[test]
    fn test_base_calories_rate_table() {
        let mut session = Session::new(ActivityKind::Gym, None);
        session.duration = 600;
        assert_eq!(base_calories(&session), 60);

        session.kind = ActivityKind::Running;
        session.duration = 90;
        assert_eq!(base_calories(&session), 18);
    }

    #[test]
    fn test_default_workout_name() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap();
        assert_eq!(default_workout_name(ActivityKind::Cycling, start), "Evening Ride");
    }
}
