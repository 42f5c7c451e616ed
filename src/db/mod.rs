// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local key-value storage layer.
//!
//! The engine only needs `get`/`set`/`remove` on string values. Typed helpers
//! here handle JSON encoding for the shared keys.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::WorkoutRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Storage key names as constants.
pub mod keys {
    /// Global workout history (JSON array, newest first)
    pub const WORKOUT_HISTORY: &str = "workoutHistory";
    /// Global sync queue (JSON array)
    pub const SYNC_QUEUE: &str = "workout_sync_queue";
    /// Prefix of per-session autosave snapshots
    pub const ACTIVE_SESSION_PREFIX: &str = "active_session_";

    /// Autosave key for a session.
    pub fn active_session(session_id: &str) -> String {
        format!("{}{}", ACTIVE_SESSION_PREFIX, session_id)
    }
}

/// Abstract process-wide key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and decode a JSON value.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, raw)
}

/// Load the local workout history, newest first.
pub fn load_history(store: &dyn KeyValueStore) -> Result<Vec<WorkoutRecord>, StoreError> {
    Ok(get_json(store, keys::WORKOUT_HISTORY)?.unwrap_or_default())
}

/// Prepend a workout to the local history.
pub fn append_history(store: &dyn KeyValueStore, workout: &WorkoutRecord) -> Result<(), StoreError> {
    let mut history = load_history(store)?;
    history.insert(0, workout.clone());
    set_json(store, keys::WORKOUT_HISTORY, &history)
}
