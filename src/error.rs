// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracker error types.

/// Errors surfaced by the tracking engine.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Session has not been started")]
    NotStarted,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Location unavailable: {0}")]
    Location(String),
}

/// Errors from the local key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on key {key}: {message}")]
    Io { key: String, message: String },

    #[error("Corrupt value under key {key}: {message}")]
    Corrupt { key: String, message: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the remote workout-save collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Rejected by server: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Transport(_) => true,
            RemoteError::Status { status, .. } => *status == 429 || *status >= 500,
            RemoteError::Rejected(_) | RemoteError::InvalidResponse(_) => false,
        }
    }
}

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
