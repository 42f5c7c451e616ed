// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pool swimming: manual lap completion, SWOLF scoring and rest intervals.

use crate::config::TrackerConfig;
use crate::models::{
    ActivityKind, Session, SessionData, StrokeType, SwimLap, SwimmingDetails, WorkoutRecord,
};
use crate::error::Result;
use crate::services::events::TrackerEvent;
use crate::services::haptics::HapticCue;
use crate::services::tracker::{ActivityCapability, ActivityTracker, Hooks, TrackerContext};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

pub type SwimmingTracker = ActivityTracker<SwimActivity>;

pub const DEFAULT_POOL_LENGTH_M: f64 = 25.0;

#[derive(Debug, Clone, Copy)]
struct RestInterval {
    ends_at: DateTime<Utc>,
    last_reported: Option<u64>,
}

impl RestInterval {
    fn remaining(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.ends_at - now).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            ((millis + 999) / 1000) as u64
        }
    }
}

/// Swim lap log and rest state.
#[derive(Debug, Clone)]
pub struct SwimActivity {
    pool_length: f64,
    stroke_type: StrokeType,
    laps: Vec<SwimLap>,
    /// Session duration at the last lap boundary
    lap_start_offset: u64,
    rest: Option<RestInterval>,
}

impl Default for SwimActivity {
    fn default() -> Self {
        Self {
            pool_length: DEFAULT_POOL_LENGTH_M,
            stroke_type: StrokeType::default(),
            laps: Vec::new(),
            lap_start_offset: 0,
            rest: None,
        }
    }
}

impl SwimActivity {
    pub fn new(pool_length: f64) -> Self {
        Self {
            pool_length,
            ..Self::default()
        }
    }

    pub fn pool_length(&self) -> f64 {
        self.pool_length
    }

    pub fn stroke_type(&self) -> StrokeType {
        self.stroke_type
    }

    pub fn laps(&self) -> &[SwimLap] {
        &self.laps
    }

    pub fn is_resting(&self) -> bool {
        self.rest.is_some()
    }

    /// Metres swum.
    pub fn total_distance(&self) -> f64 {
        self.laps.iter().map(|l| l.pool_length).sum()
    }

    pub fn total_strokes(&self) -> u32 {
        self.laps.iter().map(|l| l.stroke_count).sum()
    }

    /// Mean SWOLF over completed laps, `None` before the first lap.
    pub fn average_swolf(&self) -> Option<f64> {
        if self.laps.is_empty() {
            return None;
        }
        let total: u64 = self.laps.iter().map(|l| l.swolf).sum();
        Some(total as f64 / self.laps.len() as f64)
    }

    pub fn best_swolf(&self) -> Option<u64> {
        self.laps.iter().map(|l| l.swolf).min()
    }

    /// Calorie multiplier: lower SWOLF means harder, more efficient swimming.
    pub fn intensity_multiplier(&self) -> f64 {
        match self.average_swolf() {
            Some(swolf) if swolf < 30.0 => 1.3,
            Some(swolf) if swolf < 40.0 => 1.1,
            _ => 1.0,
        }
    }

    fn details(&self, duration: u64) -> SwimmingDetails {
        let total_distance = self.total_distance();
        let mut stroke_breakdown = BTreeMap::new();
        for lap in &self.laps {
            *stroke_breakdown
                .entry(lap.stroke_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        SwimmingDetails {
            pool_length: self.pool_length,
            total_distance,
            laps: self.laps.clone(),
            total_strokes: self.total_strokes(),
            average_swolf: self.average_swolf().unwrap_or(0.0),
            best_swolf: self.best_swolf(),
            pace_per_100m: if total_distance > 0.0 {
                duration as f64 / (total_distance / 100.0)
            } else {
                0.0
            },
            stroke_breakdown,
        }
    }
}

impl ActivityCapability for SwimActivity {
    fn kind(&self) -> ActivityKind {
        ActivityKind::Swimming
    }

    fn on_start(&mut self, _hooks: &Hooks<'_>) -> Result<()> {
        self.laps.clear();
        self.lap_start_offset = 0;
        self.rest = None;
        Ok(())
    }

    fn on_stop(&mut self, _hooks: &Hooks<'_>) {
        self.rest = None;
    }

    /// Rest countdown, serviced once per timer firing.
    fn on_timer(&mut self, hooks: &Hooks<'_>) {
        let Some(rest) = self.rest.as_mut() else {
            return;
        };
        let remaining = rest.remaining(hooks.now());

        if remaining == 0 {
            self.rest = None;
            tracing::debug!("Rest interval complete");
            hooks.signal(HapticCue::RestComplete);
            hooks.emit(TrackerEvent::RestCompleted);
        } else if rest.last_reported != Some(remaining) {
            rest.last_reported = Some(remaining);
            hooks.emit(TrackerEvent::RestTick { remaining });
        }
    }

    fn cleanup(&mut self, _context: &TrackerContext) {
        self.rest = None;
    }

    fn calculate_calories(&self, session: &Session, _config: &TrackerConfig) -> u32 {
        let base = session.duration_minutes() * ActivityKind::Swimming.calories_per_minute();
        (base * self.intensity_multiplier()).round() as u32
    }

    fn enhance_session_data(&self, data: &mut SessionData, _config: &TrackerConfig) {
        data.swimming = Some(self.details(data.session.duration));
    }

    fn prepare_final_payload(
        &self,
        data: &SessionData,
        record: &mut WorkoutRecord,
        _config: &TrackerConfig,
    ) -> Result<()> {
        record.swimming = Some(
            data.swimming
                .clone()
                .unwrap_or_else(|| self.details(data.session.duration)),
        );
        Ok(())
    }
}

impl ActivityTracker<SwimActivity> {
    pub fn swimming(user_id: Option<String>, pool_length: f64, context: TrackerContext) -> Self {
        Self::new(SwimActivity::new(pool_length), user_id, context)
    }

    pub fn swim(&self) -> &SwimActivity {
        &self.capability
    }

    /// Change the pool length for subsequent laps.
    pub fn set_pool_length(&mut self, meters: f64) -> bool {
        if !(meters.is_finite() && meters > 0.0) {
            return false;
        }
        self.capability.pool_length = meters;
        true
    }

    /// Change the stroke for subsequent laps.
    pub fn set_stroke_type(&mut self, stroke: StrokeType) {
        self.capability.stroke_type = stroke;
    }

    /// Record a completed pool length.
    ///
    /// Returns `None` when the session is not active or a rest interval is
    /// running.
    pub fn complete_lap(&mut self, stroke_count: u32) -> Option<SwimLap> {
        if self.is_cleaned_up() || !self.session.is_active() || self.capability.is_resting() {
            return None;
        }

        let duration = self.sync_duration();
        let now = self.context.time.now();
        let swim = &mut self.capability;

        let time = duration.saturating_sub(swim.lap_start_offset);
        let lap = SwimLap {
            number: swim.laps.len() as u32 + 1,
            time,
            stroke_type: swim.stroke_type,
            stroke_count,
            pool_length: swim.pool_length,
            swolf: time + u64::from(stroke_count),
            timestamp: now,
        };
        swim.laps.push(lap.clone());
        swim.lap_start_offset = duration;

        tracing::info!(
            number = lap.number,
            time = lap.time,
            strokes = lap.stroke_count,
            swolf = lap.swolf,
            "Lap completed"
        );
        self.context.signal(HapticCue::LapComplete);
        self.events.emit(TrackerEvent::LapCompleted { lap: lap.clone() });
        Some(lap)
    }

    /// Begin a rest countdown. Duration keeps accruing while resting.
    /// Returns false if `seconds` is zero or too large to schedule.
    pub fn start_rest(&mut self, seconds: u64) -> bool {
        if self.is_cleaned_up()
            || !self.session.is_active()
            || seconds == 0
            || self.capability.is_resting()
        {
            return false;
        }
        let now = self.context.time.now();
        let Some(ends_at) = i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|rest| now.checked_add_signed(rest))
        else {
            tracing::debug!(seconds, "Rest interval out of range");
            return false;
        };
        self.capability.rest = Some(RestInterval {
            ends_at,
            last_reported: Some(seconds),
        });
        tracing::debug!(seconds, "Rest interval started");
        self.events.emit(TrackerEvent::RestTick { remaining: seconds });
        true
    }

    /// End the rest interval early.
    pub fn skip_rest(&mut self) -> bool {
        if self.capability.rest.take().is_none() {
            return false;
        }
        tracing::debug!("Rest interval skipped");
        self.events.emit(TrackerEvent::RestCompleted);
        true
    }

    /// Whole seconds left in the current rest interval.
    pub fn rest_remaining(&self) -> Option<u64> {
        self.capability
            .rest
            .map(|rest| rest.remaining(self.context.time.now()))
    }
}
