// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPS-tracked activities (running, cycling).
//!
//! Samples are processed strictly in arrival order, each diffed against the
//! last accepted point:
//! 1. Segments shorter than the jitter threshold are dropped entirely
//! 2. Accepted segments add distance and update speed, pace and elevation
//! 3. Crossing the auto-lap distance records an automatic split
//! 4. Speed below the auto-pause threshold pauses the session; recovering
//!    speed resumes it (manual pauses are never auto-resumed)

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::models::{
    ActivityKind, Elevation, GpsDetails, GpsPoint, PositionSample, Session, SessionData, Split,
    SplitKind, WorkoutRecord,
};
use crate::services::events::{ErrorSite, TrackerEvent};
use crate::services::geomath;
use crate::services::haptics::HapticCue;
use crate::services::location::{LocationProvider, WatchId, WatchOptions};
use crate::services::tracker::{
    base_calories, ActivityCapability, ActivityTracker, Hooks, TrackerContext,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub type RunningTracker = ActivityTracker<GpsActivity>;
pub type CyclingTracker = ActivityTracker<GpsActivity>;

/// Instantaneous speed reading kept for charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub timestamp: DateTime<Utc>,
    /// km/h
    pub speed: f64,
}

/// Reference position for the next segment.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
}

/// GPS metrics pipeline.
pub struct GpsActivity {
    kind: ActivityKind,
    location: Arc<dyn LocationProvider>,
    watch: Option<WatchId>,
    anchor: Option<Anchor>,
    points: Vec<GpsPoint>,
    speed_history: Vec<SpeedSample>,
    distance: f64,
    current_speed: f64,
    max_speed: f64,
    average_speed: f64,
    current_pace: f64,
    average_pace: f64,
    elevation: Elevation,
    splits: Vec<Split>,
    lap_distance_baseline: f64,
    lap_gain_baseline: f64,
    paused_due_to_speed: bool,
}

impl GpsActivity {
    pub fn new(kind: ActivityKind, location: Arc<dyn LocationProvider>) -> Self {
        Self {
            kind,
            location,
            watch: None,
            anchor: None,
            points: Vec::new(),
            speed_history: Vec::new(),
            distance: 0.0,
            current_speed: 0.0,
            max_speed: 0.0,
            average_speed: 0.0,
            current_pace: 0.0,
            average_pace: 0.0,
            elevation: Elevation::default(),
            splits: Vec::new(),
            lap_distance_baseline: 0.0,
            lap_gain_baseline: 0.0,
            paused_due_to_speed: false,
        }
    }

    fn reset_metrics(&mut self) {
        let location = self.location.clone();
        let watch = self.watch;
        *self = Self::new(self.kind, location);
        self.watch = watch;
    }

    /// Metres covered.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// km/h
    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn average_speed(&self) -> f64 {
        self.average_speed
    }

    /// min/km
    pub fn current_pace(&self) -> f64 {
        self.current_pace
    }

    pub fn average_pace(&self) -> f64 {
        self.average_pace
    }

    pub fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn gps_points(&self) -> &[GpsPoint] {
        &self.points
    }

    pub fn speed_history(&self) -> &[SpeedSample] {
        &self.speed_history
    }

    pub fn paused_due_to_speed(&self) -> bool {
        self.paused_due_to_speed
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Fastest positive, finite split pace; the average pace if there is none.
    pub fn best_pace(&self) -> f64 {
        self.splits
            .iter()
            .map(|s| s.pace)
            .filter(|p| *p > 0.0 && p.is_finite())
            .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.min(p))))
            .unwrap_or(self.average_pace)
    }

    fn details(&self) -> GpsDetails {
        GpsDetails {
            distance: self.distance,
            average_speed: self.average_speed,
            max_speed: self.max_speed,
            average_pace: self.average_pace,
            best_pace: self.best_pace(),
            elevation: self.elevation,
            splits: self.splits.clone(),
            route: String::new(),
            polyline: String::new(),
            point_count: self.points.len(),
        }
    }

    fn update_averages(&mut self, duration: u64) {
        let hours = duration as f64 / 3600.0;
        self.average_speed = if hours > 0.0 {
            (self.distance / 1000.0) / hours
        } else {
            0.0
        };
        self.average_pace = geomath::pace_from_speed(self.average_speed);
    }

    /// First fix, or first fix after a gap: becomes the new reference point
    /// without adding distance.
    fn accept_origin(&mut self, sample: &PositionSample, timestamp: DateTime<Utc>) -> GpsPoint {
        if let Some(altitude) = sample.altitude {
            self.elevation.rebase(altitude);
        }
        self.push_point(sample, timestamp, 0.0)
    }

    fn accept_segment(
        &mut self,
        sample: &PositionSample,
        timestamp: DateTime<Utc>,
        segment_m: f64,
        speed: f64,
        duration: u64,
    ) -> GpsPoint {
        self.distance += segment_m;
        self.current_speed = speed;
        if speed > self.max_speed {
            self.max_speed = speed;
        }
        self.current_pace = geomath::pace_from_speed(speed);
        self.speed_history.push(SpeedSample { timestamp, speed });

        if let Some(altitude) = sample.altitude {
            self.elevation.record(altitude);
        }

        self.update_averages(duration);
        self.push_point(sample, timestamp, speed)
    }

    fn push_point(&mut self, sample: &PositionSample, timestamp: DateTime<Utc>, speed: f64) -> GpsPoint {
        let point = GpsPoint {
            latitude: sample.latitude,
            longitude: sample.longitude,
            altitude: sample.altitude,
            timestamp,
            speed,
            distance: self.distance,
        };
        self.points.push(point.clone());
        self.anchor = Some(Anchor {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp,
        });
        point
    }

    fn clear_watch(&mut self) {
        if let Some(id) = self.watch.take() {
            self.location.clear_watch(id);
            tracing::debug!(watch = id.0, "Location watch cleared");
        }
    }
}

impl ActivityCapability for GpsActivity {
    fn kind(&self) -> ActivityKind {
        self.kind
    }

    fn on_start(&mut self, hooks: &Hooks<'_>) -> Result<()> {
        self.location
            .request_permission()
            .map_err(|e| TrackerError::Location(e.to_string()))?;
        self.clear_watch();
        let watch = self
            .location
            .watch(WatchOptions::default())
            .map_err(|e| TrackerError::Location(e.to_string()))?;
        self.watch = Some(watch);
        self.reset_metrics();
        tracing::debug!(
            session_id = hooks.session.session_id.as_deref().unwrap_or_default(),
            watch = watch.0,
            "Location watch started"
        );
        Ok(())
    }

    fn on_pause(&mut self, _hooks: &Hooks<'_>, auto: bool) {
        if auto {
            self.paused_due_to_speed = true;
        } else {
            // Movement during a manual pause is never counted.
            self.anchor = None;
        }
        self.current_speed = 0.0;
        self.current_pace = 0.0;
    }

    fn on_resume(&mut self, _hooks: &Hooks<'_>, auto: bool) {
        if !auto {
            self.anchor = None;
        }
        self.paused_due_to_speed = false;
    }

    fn on_stop(&mut self, _hooks: &Hooks<'_>) {
        self.clear_watch();
        self.paused_due_to_speed = false;
    }

    fn cleanup(&mut self, _context: &TrackerContext) {
        self.clear_watch();
    }

    fn calculate_calories(&self, session: &Session, config: &TrackerConfig) -> u32 {
        if self.kind != ActivityKind::Running {
            return base_calories(session);
        }
        let hours = session.duration_hours();
        let speed = if hours > 0.0 {
            (self.distance / 1000.0) / hours
        } else {
            0.0
        };
        (running_met(speed) * config.body_weight_kg * hours).round() as u32
    }

    fn enhance_session_data(&self, data: &mut SessionData, _config: &TrackerConfig) {
        data.gps = Some(self.details());
    }

    fn prepare_final_payload(
        &self,
        data: &SessionData,
        record: &mut WorkoutRecord,
        config: &TrackerConfig,
    ) -> Result<()> {
        let mut details = data.gps.clone().unwrap_or_else(|| self.details());

        let route = geomath::compress_route(&self.points, config.route_max_points);
        details.route = geomath::encode_route(&route);
        details.polyline = match geomath::encode_polyline(&route) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode route polyline");
                String::new()
            }
        };

        match self.kind {
            ActivityKind::Cycling => record.cycling = Some(details),
            _ => record.running = Some(details),
        }
        Ok(())
    }
}

/// MET value for a running speed (km/h).
pub fn running_met(speed_kmh: f64) -> f64 {
    match speed_kmh {
        s if s < 8.0 => 6.0,
        s if s < 9.7 => 8.3,
        s if s < 11.3 => 9.8,
        s if s < 12.9 => 11.0,
        s if s < 16.0 => 11.8,
        _ => 14.5,
    }
}

impl ActivityTracker<GpsActivity> {
    pub fn running(
        user_id: Option<String>,
        location: Arc<dyn LocationProvider>,
        context: TrackerContext,
    ) -> Self {
        Self::new(GpsActivity::new(ActivityKind::Running, location), user_id, context)
    }

    pub fn cycling(
        user_id: Option<String>,
        location: Arc<dyn LocationProvider>,
        context: TrackerContext,
    ) -> Self {
        Self::new(GpsActivity::new(ActivityKind::Cycling, location), user_id, context)
    }

    pub fn metrics(&self) -> &GpsActivity {
        &self.capability
    }

    /// Process one position sample. Returns true if the sample was accepted
    /// into the route.
    pub fn handle_position(&mut self, sample: PositionSample) -> bool {
        if self.is_cleaned_up() || !self.session.is_active() {
            return false;
        }
        if self.session.is_paused() && !self.capability.paused_due_to_speed {
            return false;
        }

        let timestamp = sample.timestamp.unwrap_or_else(|| self.context.time.now());

        let Some(anchor) = self.capability.anchor else {
            let point = self.capability.accept_origin(&sample, timestamp);
            self.events.emit(TrackerEvent::GpsSampleAccepted { point });
            return true;
        };

        let elapsed = (timestamp - anchor.timestamp).num_milliseconds() as f64 / 1000.0;
        if elapsed <= 0.0 {
            tracing::debug!(%timestamp, "Discarding out-of-order position sample");
            return false;
        }

        let segment = geomath::haversine_distance(
            anchor.latitude,
            anchor.longitude,
            sample.latitude,
            sample.longitude,
        );
        if segment < self.context.config.min_segment_m {
            return false;
        }

        let speed = geomath::speed_kmh(segment, elapsed);
        let threshold = self.context.config.auto_pause_speed_kmh;

        if self.session.is_paused() {
            // Auto-paused: only a sample at walking speed or faster resumes.
            if speed < threshold {
                self.capability.anchor = Some(Anchor {
                    latitude: sample.latitude,
                    longitude: sample.longitude,
                    timestamp,
                });
                return false;
            }
            self.resume_with(true);
        }

        let duration = self.sync_duration();
        let point = self
            .capability
            .accept_segment(&sample, timestamp, segment, speed, duration);
        self.events.emit(TrackerEvent::GpsSampleAccepted { point });

        let lap_distance = self.capability.distance - self.capability.lap_distance_baseline;
        if lap_distance >= self.context.config.auto_lap_distance_m {
            self.record_split(SplitKind::Auto);
        }

        if self.context.config.auto_pause_enabled
            && speed < threshold
            && !self.capability.paused_due_to_speed
        {
            tracing::debug!(speed, threshold, "Auto-pausing on low speed");
            self.pause_with(true);
        }
        true
    }

    /// Record a split at the user's request. Shares numbering and the lap
    /// baseline with automatic splits.
    pub fn manual_split(&mut self) -> Option<Split> {
        if self.is_cleaned_up() || !self.session.is_active() {
            return None;
        }
        Some(self.record_split(SplitKind::Manual))
    }

    fn record_split(&mut self, kind: SplitKind) -> Split {
        let duration = self.sync_duration();
        let now = self.context.time.now();
        let metrics = &mut self.capability;

        let distance = metrics.distance - metrics.lap_distance_baseline;
        let prior: u64 = metrics.splits.iter().map(|s| s.time).sum();
        let time = duration.saturating_sub(prior);

        let split = Split {
            number: metrics.splits.len() as u32 + 1,
            distance,
            time,
            pace: geomath::pace_min_per_km(distance, time as f64),
            cumulative_distance: metrics.distance,
            elevation_gain: metrics.elevation.gain - metrics.lap_gain_baseline,
            timestamp: now,
            kind,
        };
        metrics.splits.push(split.clone());
        metrics.lap_distance_baseline = metrics.distance;
        metrics.lap_gain_baseline = metrics.elevation.gain;

        tracing::info!(
            number = split.number,
            kind = ?kind,
            distance = split.distance,
            time = split.time,
            pace = %geomath::format_pace(split.pace),
            "Split recorded"
        );

        self.context.signal(match kind {
            SplitKind::Auto => HapticCue::AutoLap,
            SplitKind::Manual => HapticCue::ManualSplit,
        });
        self.events.emit(TrackerEvent::SplitRecorded {
            split: split.clone(),
        });
        split
    }

    /// Stored route as a GeoJSON feature.
    pub fn route_geojson(&self) -> Option<geojson::Feature> {
        let session_id = self.session.session_id.as_deref()?;
        let route = geomath::compress_route(
            &self.capability.points,
            self.context.config.route_max_points,
        );
        Some(geomath::route_geojson(&route, session_id))
    }

    /// Report a location-services failure without stopping the session.
    pub fn handle_location_error(&self, error: &dyn std::fmt::Display) {
        self.context.errors.report(ErrorSite::Location, error);
    }
}
