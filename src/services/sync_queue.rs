// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable queue of workouts awaiting remote save.
//!
//! The whole queue lives under one store key. Every access (enqueue, sweep,
//! inspection) holds the same async mutex, so a sweep's read-modify-write
//! never interleaves with an enqueue and no entry is lost or synced twice.

use crate::db::{self, keys, KeyValueStore};
use crate::error::StoreError;
use crate::models::{SyncQueueEntry, WorkoutRecord};
use crate::services::workout_api::WorkoutApi;
use crate::time_utils::{format_utc_rfc3339, TimeSource};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries saved remotely and removed.
    pub synced: u32,
    /// Entries whose save attempt failed this pass.
    pub failed: u32,
    /// Failed entries that exhausted their attempts and were dropped.
    pub dropped: u32,
    /// Entries left in the queue.
    pub remaining: u32,
}

impl SyncReport {
    /// Returns true if nothing is left to sync.
    pub fn is_drained(&self) -> bool {
        self.remaining == 0
    }
}

/// Shared handle to the sync queue.
#[derive(Clone)]
pub struct SyncQueue {
    store: Arc<dyn KeyValueStore>,
    time: Arc<dyn TimeSource>,
    max_attempts: u32,
    lock: Arc<Mutex<()>>,
}

impl SyncQueue {
    pub fn new(store: Arc<dyn KeyValueStore>, time: Arc<dyn TimeSource>, max_attempts: u32) -> Self {
        Self {
            store,
            time,
            max_attempts,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append a workout with `needsSync = true` and no attempts.
    pub async fn enqueue(&self, workout: WorkoutRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load()?;
        tracing::info!(session_id = %workout.session_id, queued = entries.len() + 1, "Queued workout for sync");
        entries.push(SyncQueueEntry::new(workout));
        self.persist(&entries)
    }

    /// Current queue contents.
    pub async fn pending(&self) -> Result<Vec<SyncQueueEntry>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load()
    }

    pub async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.pending().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    /// Try to save every queued workout once.
    ///
    /// Synced entries are removed. Failed entries are kept with an
    /// incremented attempt count while below the attempt ceiling and dropped
    /// once they reach it. Safe to call repeatedly; concurrent calls run one
    /// after the other.
    pub async fn sync_pending_workouts(&self, api: &dyn WorkoutApi) -> Result<SyncReport, StoreError> {
        let _guard = self.lock.lock().await;
        let entries = self.load()?;
        if entries.is_empty() {
            return Ok(SyncReport::default());
        }

        tracing::info!(pending = entries.len(), "Starting sync sweep");

        let mut report = SyncReport::default();
        let mut kept = Vec::with_capacity(entries.len());

        for mut entry in entries {
            let result = api
                .save_workout(entry.workout.activity_type, &entry.workout)
                .await;

            match result {
                Ok(response) if response.success => {
                    report.synced += 1;
                    tracing::info!(session_id = %entry.workout.session_id, "Queued workout synced");
                }
                outcome => {
                    let (reason, transient) = match outcome {
                        Err(e) => (e.to_string(), e.is_transient()),
                        Ok(response) => (
                            response
                                .message
                                .unwrap_or_else(|| "workout rejected".to_string()),
                            false,
                        ),
                    };
                    report.failed += 1;
                    entry.sync_attempts += 1;
                    entry.last_sync_attempt = Some(self.time.now());

                    if entry.sync_attempts < self.max_attempts {
                        tracing::debug!(
                            session_id = %entry.workout.session_id,
                            attempts = entry.sync_attempts,
                            transient,
                            error = %reason,
                            "Sync attempt failed, will retry"
                        );
                        kept.push(entry);
                    } else {
                        report.dropped += 1;
                        tracing::warn!(
                            session_id = %entry.workout.session_id,
                            attempts = entry.sync_attempts,
                            started = %format_utc_rfc3339(entry.workout.start_time),
                            transient,
                            error = %reason,
                            "Dropping workout after exhausting sync attempts"
                        );
                    }
                }
            }
        }

        report.remaining = kept.len() as u32;
        self.persist(&kept)?;

        tracing::info!(
            synced = report.synced,
            failed = report.failed,
            dropped = report.dropped,
            remaining = report.remaining,
            "Sync sweep finished"
        );
        Ok(report)
    }

    fn load(&self) -> Result<Vec<SyncQueueEntry>, StoreError> {
        Ok(db::get_json(self.store.as_ref(), keys::SYNC_QUEUE)?.unwrap_or_default())
    }

    fn persist(&self, entries: &[SyncQueueEntry]) -> Result<(), StoreError> {
        db::set_json(self.store.as_ref(), keys::SYNC_QUEUE, entries)
    }
}
