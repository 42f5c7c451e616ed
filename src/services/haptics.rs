// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fire-and-forget haptic feedback.

use std::sync::Mutex;

/// Moments that produce device feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticCue {
    Pause,
    Resume,
    Stop,
    AutoLap,
    ManualSplit,
    LapComplete,
    RestComplete,
}

/// Device vibration collaborator. Failures are reported and ignored.
pub trait Haptics: Send + Sync {
    fn signal(&self, cue: HapticCue) -> anyhow::Result<()>;
}

/// Haptics that do nothing, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHaptics;

impl Haptics for NoopHaptics {
    fn signal(&self, _cue: HapticCue) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Records every cue, for tests.
#[derive(Debug, Default)]
pub struct RecordingHaptics {
    cues: Mutex<Vec<HapticCue>>,
}

impl RecordingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<HapticCue> {
        self.cues.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Haptics for RecordingHaptics {
    fn signal(&self, cue: HapticCue) -> anyhow::Result<()> {
        self.cues.lock().unwrap_or_else(|e| e.into_inner()).push(cue);
        Ok(())
    }
}
