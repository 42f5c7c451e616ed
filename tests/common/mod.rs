// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use stride_tracker::config::TrackerConfig;
use stride_tracker::db::MemoryStore;
use stride_tracker::models::PositionSample;
use stride_tracker::services::{
    MockWorkoutApi, RecordingHaptics, StaticLocationProvider, TrackerContext, TrackerEvent,
};
use stride_tracker::time_utils::ManualTimeSource;

/// 0.0009 degrees of latitude, about 100.075 m.
#[allow(dead_code)]
pub const LAT_STEP: f64 = 0.0009;

/// Collaborators behind a test tracker, kept for inspection.
#[allow(dead_code)]
pub struct Harness {
    pub context: TrackerContext,
    pub store: Arc<MemoryStore>,
    pub api: Arc<MockWorkoutApi>,
    pub time: Arc<ManualTimeSource>,
    pub haptics: Arc<RecordingHaptics>,
    pub location: Arc<StaticLocationProvider>,
}

#[allow(dead_code)]
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap()
}

/// Harness with default tracking parameters and an accepting API.
#[allow(dead_code)]
pub fn harness() -> Harness {
    harness_with(TrackerConfig::default(), MockWorkoutApi::accepting())
}

/// Harness whose API fails every save.
#[allow(dead_code)]
pub fn offline_harness() -> Harness {
    harness_with(TrackerConfig::default(), MockWorkoutApi::offline())
}

#[allow(dead_code)]
pub fn harness_with(config: TrackerConfig, api: MockWorkoutApi) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let api = Arc::new(api);
    let time = Arc::new(ManualTimeSource::new(start_time()));
    let haptics = Arc::new(RecordingHaptics::new());
    let location = Arc::new(StaticLocationProvider::granted());

    let context = TrackerContext::new(config, store.clone(), api.clone(), time.clone())
        .with_haptics(haptics.clone());

    Harness {
        context,
        store,
        api,
        time,
        haptics,
        location,
    }
}

/// Sample `steps` latitude steps north of the origin, stamped with the
/// harness clock.
#[allow(dead_code)]
pub fn sample_at(harness: &Harness, steps: u32) -> PositionSample {
    use stride_tracker::time_utils::TimeSource;
    PositionSample::new(37.4 + f64::from(steps) * LAT_STEP, -122.1).at(harness.time.now())
}

/// Listener that records every event into a shared log.
#[allow(dead_code)]
pub fn event_log() -> (
    Arc<Mutex<Vec<TrackerEvent>>>,
    impl Fn(&TrackerEvent) -> anyhow::Result<()> + Send + Sync + 'static,
) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    (log, move |event: &TrackerEvent| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    })
}
