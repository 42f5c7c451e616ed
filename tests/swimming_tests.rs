// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swim lap, SWOLF and rest interval tests.

mod common;

use stride_tracker::models::{ActivityKind, StrokeType};
use stride_tracker::services::{HapticCue, SwimmingTracker, TrackerEvent};

fn swimming(h: &common::Harness) -> SwimmingTracker {
    SwimmingTracker::swimming(Some("swimmer-1".into()), 25.0, h.context.clone())
}

#[test]
fn test_lap_swolf() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    assert!(tracker.complete_lap(10).is_none());

    tracker.start();
    h.time.advance_secs(45);
    let lap = tracker.complete_lap(20).unwrap();

    assert_eq!(lap.number, 1);
    assert_eq!(lap.time, 45);
    assert_eq!(lap.stroke_count, 20);
    assert_eq!(lap.swolf, 65);
    assert_eq!(lap.pool_length, 25.0);
    assert_eq!(tracker.swim().total_distance(), 25.0);
    assert_eq!(h.haptics.cues(), vec![HapticCue::LapComplete]);
}

#[test]
fn test_lap_times_are_measured_from_previous_lap() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    tracker.start();

    h.time.advance_secs(40);
    tracker.complete_lap(18);
    h.time.advance_secs(35);
    let second = tracker.complete_lap(17).unwrap();

    assert_eq!(second.number, 2);
    assert_eq!(second.time, 35);
    assert_eq!(second.swolf, 52);
    assert_eq!(tracker.swim().best_swolf(), Some(52));
    assert_eq!(tracker.swim().average_swolf(), Some(55.0));
}

#[test]
fn test_pool_and_stroke_changes_apply_to_later_laps() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    tracker.start();

    h.time.advance_secs(30);
    tracker.complete_lap(15);
    assert!(tracker.set_pool_length(50.0));
    assert!(!tracker.set_pool_length(0.0));
    tracker.set_stroke_type(StrokeType::Breaststroke);
    h.time.advance_secs(60);
    tracker.complete_lap(30);

    let laps = tracker.swim().laps();
    assert_eq!(laps[0].stroke_type, StrokeType::Freestyle);
    assert_eq!(laps[1].stroke_type, StrokeType::Breaststroke);
    assert_eq!(tracker.swim().total_distance(), 75.0);
}

#[test]
fn test_rest_interval() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    let (log, listener) = common::event_log();
    tracker.subscribe(listener);
    tracker.start();

    assert!(!tracker.start_rest(0));
    assert!(tracker.start_rest(30));
    assert!(!tracker.start_rest(30));
    assert_eq!(tracker.rest_remaining(), Some(30));

    h.time.advance_secs(10);
    tracker.on_timer();
    assert_eq!(tracker.rest_remaining(), Some(20));
    assert!(tracker.complete_lap(10).is_none());

    h.time.advance_secs(20);
    tracker.on_timer();
    assert_eq!(tracker.rest_remaining(), None);
    assert!(!tracker.swim().is_resting());

    // Duration keeps running through the rest
    assert_eq!(tracker.duration(), 30);
    assert!(h.haptics.cues().contains(&HapticCue::RestComplete));

    let events = log.lock().unwrap();
    assert!(events.contains(&TrackerEvent::RestTick { remaining: 20 }));
    assert_eq!(events.last(), Some(&TrackerEvent::RestCompleted));
}

#[test]
fn test_skip_rest() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    tracker.start();
    assert!(!tracker.skip_rest());

    tracker.start_rest(60);
    h.time.advance_secs(5);
    assert!(tracker.skip_rest());
    assert!(tracker.complete_lap(12).is_some());
    assert!(!h.haptics.cues().contains(&HapticCue::RestComplete));
}

#[test]
fn test_rest_out_of_range_is_rejected() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    tracker.start();

    assert!(!tracker.start_rest(100_000_000_000_000_000));
    assert!(!tracker.start_rest(u64::MAX));
    assert!(!tracker.swim().is_resting());
    assert_eq!(tracker.rest_remaining(), None);

    assert!(tracker.start_rest(30));
    assert_eq!(tracker.rest_remaining(), Some(30));
}

#[test]
fn test_cleaned_up_tracker_records_nothing() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    tracker.start();
    tracker.cleanup();

    h.time.advance_secs(40);
    assert!(tracker.complete_lap(20).is_none());
    assert!(!tracker.start_rest(30));
    assert!(tracker.swim().laps().is_empty());
    assert!(h.haptics.cues().is_empty());
}

#[test]
fn test_stop_clears_rest() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    tracker.start();
    tracker.start_rest(60);
    tracker.stop();
    assert!(!tracker.swim().is_resting());
}

#[test]
fn test_swim_calories_and_payload() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    tracker.start();
    for strokes in [16, 18, 17, 15] {
        h.time.advance_secs(15);
        tracker.complete_lap(strokes);
    }
    tracker.stop();

    // Average SWOLF 31.5: 1.1 multiplier on 1 min at 10 kcal/min
    assert_eq!(tracker.calculate_calories(), 11);

    let record = tracker.prepare_workout_data().unwrap();
    assert_eq!(record.activity_type, ActivityKind::Swimming);
    assert_eq!(record.name, "Morning Swim");
    let details = record.swimming.unwrap();
    assert_eq!(details.total_distance, 100.0);
    assert_eq!(details.total_strokes, 66);
    assert_eq!(details.best_swolf, Some(30));
    assert_eq!(details.average_swolf, 31.5);
    assert_eq!(details.pace_per_100m, 60.0);
    assert_eq!(details.stroke_breakdown.get("freestyle"), Some(&4));
}

#[test]
fn test_fast_swim_multiplier() {
    let h = common::harness();
    let mut tracker = swimming(&h);
    tracker.start();
    for _ in 0..6 {
        h.time.advance_secs(15);
        tracker.complete_lap(10);
    }
    tracker.stop();

    // SWOLF 25 on every lap: 1.3 multiplier on 1.5 min
    assert_eq!(tracker.calculate_calories(), 20);
}
