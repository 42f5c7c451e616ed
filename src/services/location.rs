// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location-services collaborator.
//!
//! The provider pushes samples to the tracker; the tracker only registers and
//! clears its watch.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Requested sampling cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub interval: Duration,
    pub distance_filter_m: f64,
    pub high_accuracy: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            distance_filter_m: 3.0,
            high_accuracy: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location services unavailable: {0}")]
    Unavailable(String),
}

pub trait LocationProvider: Send + Sync {
    fn request_permission(&self) -> Result<(), LocationError>;
    fn watch(&self, options: WatchOptions) -> Result<WatchId, LocationError>;
    fn clear_watch(&self, id: WatchId);
}

/// Provider with a fixed permission answer that tracks active watches.
///
/// Samples are fed to the tracker directly by the caller.
#[derive(Debug)]
pub struct StaticLocationProvider {
    granted: AtomicBool,
    next_id: AtomicU64,
    active: Mutex<Vec<WatchId>>,
}

impl StaticLocationProvider {
    pub fn granted() -> Self {
        Self::new(true)
    }

    pub fn denied() -> Self {
        Self::new(false)
    }

    fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            next_id: AtomicU64::new(1),
            active: Mutex::new(Vec::new()),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn active_watches(&self) -> usize {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl LocationProvider for StaticLocationProvider {
    fn request_permission(&self) -> Result<(), LocationError> {
        if self.granted.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LocationError::PermissionDenied)
        }
    }

    fn watch(&self, _options: WatchOptions) -> Result<WatchId, LocationError> {
        self.request_permission()?;
        let id = WatchId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(id);
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|existing| *existing != id);
    }
}
