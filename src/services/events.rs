// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed tracker events and the suppressed-error seam.
//!
//! Listeners are registered once and receive every event the engine emits.
//! A failing or panicking listener is reported and skipped; it never stops
//! the clock or the emitting operation.

use crate::models::{GpsPoint, Split, SwimLap};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// Events published by a tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Started { session_id: String },
    Paused { auto: bool },
    Resumed { auto: bool },
    Stopped { duration: u64 },
    DurationTick { seconds: u64 },
    AutoSaved { session_id: String },
    GpsSampleAccepted { point: GpsPoint },
    SplitRecorded { split: Split },
    LapCompleted { lap: SwimLap },
    RestTick { remaining: u64 },
    RestCompleted,
}

/// Where a suppressed error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSite {
    Listener,
    AutoSave,
    Haptics,
    Location,
    Storage,
}

impl fmt::Display for ErrorSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorSite::Listener => "listener",
            ErrorSite::AutoSave => "autosave",
            ErrorSite::Haptics => "haptics",
            ErrorSite::Location => "location",
            ErrorSite::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Single sink for errors that are logged and swallowed.
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    counts: Arc<Mutex<HashMap<ErrorSite, u64>>>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, site: ErrorSite, error: &dyn fmt::Display) {
        tracing::warn!(site = %site, error = %error, "Suppressed error");
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        *counts.entry(site).or_insert(0) += 1;
    }

    pub fn count(&self, site: ErrorSite) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(&site).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.values().sum()
    }
}

pub type Listener = dyn Fn(&TrackerEvent) -> anyhow::Result<()> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Publish point for tracker events.
pub struct EventBus {
    listeners: Vec<(ListenerId, Arc<Listener>)>,
    next_id: u64,
    errors: ErrorReporter,
}

impl EventBus {
    pub fn new(errors: ErrorReporter) -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            errors,
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&TrackerEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&self, event: TrackerEvent) {
        for (_, listener) in &self.listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.errors.report(ErrorSite::Listener, &e),
                Err(_) => self
                    .errors
                    .report(ErrorSite::Listener, &"listener panicked"),
            }
        }
    }
}
