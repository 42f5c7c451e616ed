// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle tests.
//!
//! These tests verify that:
//! 1. Duration excludes paused intervals and freezes at stop
//! 2. Lifecycle transitions are idempotent no-ops when invalid
//! 3. Autosave snapshots are written and restorable after a restart
//! 4. Cleanup releases everything and is safe to repeat

mod common;

use stride_tracker::db::{self, keys, KeyValueStore};
use stride_tracker::models::{ActivityKind, SessionSnapshot, SessionState};
use stride_tracker::services::{ErrorSite, GymTracker, HapticCue, TrackerEvent};

#[test]
fn test_duration_excludes_pauses() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());

    assert!(tracker.start());
    h.time.advance_secs(10);
    assert!(tracker.pause());
    h.time.advance_secs(60);
    assert_eq!(tracker.duration(), 10);
    assert!(tracker.resume());
    h.time.advance_secs(5);
    assert!(tracker.stop());

    assert_eq!(tracker.session().duration, 15);
    assert_eq!(tracker.state(), SessionState::Stopped);

    // Frozen after stop
    h.time.advance_secs(100);
    assert_eq!(tracker.duration(), 15);
}

#[test]
fn test_invalid_transitions_are_noops() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());

    assert!(!tracker.pause());
    assert!(!tracker.resume());
    assert!(!tracker.stop());

    assert!(tracker.start());
    assert!(!tracker.start());
    assert!(!tracker.resume());
    assert!(tracker.pause());
    assert!(!tracker.pause());
    assert!(tracker.stop());
    assert!(!tracker.stop());
    assert!(!tracker.start());
}

#[test]
fn test_session_id_format() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    assert!(tracker.session_id().is_none());
    tracker.start();

    let id = tracker.session_id().unwrap().to_string();
    let parts: Vec<&str> = id.split('_').collect();
    assert_eq!(parts[0], "gym");
    assert_eq!(parts[1], common::start_time().timestamp_millis().to_string());
}

#[test]
fn test_ticks_and_haptics() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    let (log, listener) = common::event_log();
    tracker.subscribe(listener);

    tracker.start();
    for _ in 0..3 {
        h.time.advance_secs(1);
        tracker.on_timer();
    }
    tracker.pause();
    h.time.advance_secs(1);
    tracker.on_timer();
    tracker.resume();
    tracker.stop();

    let ticks: Vec<u64> = log
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            TrackerEvent::DurationTick { seconds } => Some(*seconds),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![1, 2, 3]);

    assert_eq!(
        h.haptics.cues(),
        vec![HapticCue::Pause, HapticCue::Resume, HapticCue::Stop]
    );
}

#[test]
fn test_failing_listener_does_not_break_session() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    tracker.subscribe(|_| anyhow::bail!("listener exploded"));
    let (log, listener) = common::event_log();
    tracker.subscribe(listener);

    assert!(tracker.start());
    assert!(tracker.stop());

    assert_eq!(log.lock().unwrap().len(), 2);
    assert_eq!(h.context.errors.count(ErrorSite::Listener), 2);
}

#[test]
fn test_autosave_writes_snapshot() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    tracker.start();
    h.time.advance_secs(30);
    tracker.on_timer();

    let key = keys::active_session(tracker.session_id().unwrap());
    let snapshot: SessionSnapshot = db::get_json(h.store.as_ref(), &key).unwrap().unwrap();
    assert_eq!(snapshot.duration, 30);
    assert!(snapshot.is_active);
    assert!(!snapshot.is_paused);
    assert_eq!(snapshot.calories, 3);
}

#[test]
fn test_autosave_continues_while_paused() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    tracker.start();
    h.time.advance_secs(10);
    tracker.pause();
    h.time.advance_secs(25);
    tracker.on_timer();

    let key = keys::active_session(tracker.session_id().unwrap());
    let snapshot: SessionSnapshot = db::get_json(h.store.as_ref(), &key).unwrap().unwrap();
    assert_eq!(snapshot.duration, 10);
    assert!(snapshot.is_paused);
}

#[test]
fn test_autosave_failure_is_reported() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    tracker.start();
    h.store.set_failing(true);
    h.time.advance_secs(30);
    tracker.on_timer();

    assert!(tracker.is_active());
    assert_eq!(h.context.errors.count(ErrorSite::AutoSave), 1);
}

#[test]
fn test_restore_session_keeps_duration_and_id() {
    let h = common::harness();
    let session_id = {
        let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
        tracker.start();
        h.time.advance_secs(90);
        assert!(tracker.auto_save());
        tracker.session_id().unwrap().to_string()
    };

    // Simulated restart
    h.time.advance_secs(600);
    let mut restored = GymTracker::gym(None, h.context.clone());
    let snapshot = restored.restore_session(&session_id).unwrap();

    assert_eq!(snapshot.duration, 90);
    assert_eq!(restored.session_id(), Some(session_id.as_str()));
    assert_eq!(restored.session().user_id.as_deref(), Some("user-1"));
    assert_eq!(restored.state(), SessionState::Active);
    assert_eq!(restored.duration(), 90);

    h.time.advance_secs(10);
    assert_eq!(restored.duration(), 100);
}

#[test]
fn test_restore_missing_session() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    assert!(tracker.restore_session("gym_1_deadbeef").is_none());
    assert_eq!(tracker.state(), SessionState::Idle);
}

#[test]
fn test_restore_paused_snapshot_stays_paused() {
    let h = common::harness();
    let session_id = {
        let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
        tracker.start();
        h.time.advance_secs(40);
        tracker.pause();
        tracker.auto_save();
        tracker.session_id().unwrap().to_string()
    };

    let mut restored = GymTracker::gym(None, h.context.clone());
    restored.restore_session(&session_id).unwrap();
    assert_eq!(restored.state(), SessionState::Paused);
    h.time.advance_secs(30);
    assert_eq!(restored.duration(), 40);
    assert!(restored.resume());
    h.time.advance_secs(5);
    assert_eq!(restored.duration(), 45);
}

#[test]
fn test_cleanup_is_idempotent() {
    let h = common::harness();
    let mut never_started = GymTracker::gym(None, h.context.clone());
    never_started.cleanup();
    never_started.cleanup();

    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    let (log, listener) = common::event_log();
    tracker.subscribe(listener);
    tracker.start();
    tracker.cleanup();
    tracker.cleanup();

    h.time.advance_secs(60);
    tracker.on_timer();
    assert!(!tracker.pause());
    assert!(!tracker.resume());
    assert!(!tracker.stop());
    assert!(!tracker.start());
    assert_eq!(log.lock().unwrap().len(), 1);
    assert!(h.haptics.cues().is_empty());
    assert_eq!(tracker.state(), SessionState::Active);
}

#[test]
fn test_cleaned_up_tracker_does_not_restore() {
    let h = common::harness();
    let session_id = {
        let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
        tracker.start();
        h.time.advance_secs(30);
        tracker.auto_save();
        tracker.session_id().unwrap().to_string()
    };

    let mut tracker = GymTracker::gym(None, h.context.clone());
    tracker.cleanup();
    assert!(tracker.restore_session(&session_id).is_none());
    assert_eq!(tracker.state(), SessionState::Idle);
}

#[test]
fn test_restore_out_of_range_duration() {
    let h = common::harness();
    let session_id = "gym_1772348400000_0badf00d";
    let snapshot = SessionSnapshot {
        session_id: session_id.to_string(),
        activity_type: ActivityKind::Gym,
        user_id: Some("user-1".to_string()),
        start_time: common::start_time(),
        duration: 10_000_000_000_000_000,
        calories: 0,
        is_active: true,
        is_paused: false,
        saved_at: common::start_time(),
    };
    db::set_json(h.store.as_ref(), &keys::active_session(session_id), &snapshot).unwrap();

    let mut tracker = GymTracker::gym(None, h.context.clone());
    assert!(tracker.restore_session(session_id).is_none());
    assert_eq!(tracker.state(), SessionState::Idle);
    assert!(tracker.session_id().is_none());
    assert_eq!(h.context.errors.count(ErrorSite::Storage), 1);

    // The tracker is still usable
    assert!(tracker.start());
}

#[tokio::test]
async fn test_store_keys_after_save() {
    let h = common::harness();
    let mut tracker = GymTracker::gym(Some("user-1".into()), h.context.clone());
    tracker.start();
    h.time.advance_secs(30);
    tracker.on_timer();
    tracker.stop();

    let outcome = tracker.save_workout().await;
    assert!(outcome.success);

    let key = keys::active_session(tracker.session_id().unwrap());
    assert!(h.store.get(&key).unwrap().is_none());
    assert!(h.store.get(keys::WORKOUT_HISTORY).unwrap().is_some());
}
