// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote workout-save collaborator.
//!
//! `HttpWorkoutApi` talks to the backend over HTTPS; `MockWorkoutApi`
//! replays scripted results for offline use and tests.

use crate::error::RemoteError;
use crate::models::{ActivityKind, RemoteSaveResponse, WorkoutRecord};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Saves a finalized workout on the remote service.
///
/// An `Ok` response always has `success == true`; API-reported failures are
/// mapped to [`RemoteError::Rejected`].
pub trait WorkoutApi: Send + Sync {
    fn save_workout<'a>(
        &'a self,
        kind: ActivityKind,
        workout: &'a WorkoutRecord,
    ) -> BoxFuture<'a, Result<RemoteSaveResponse, RemoteError>>;
}

/// HTTP client for the workout API.
#[derive(Clone)]
pub struct HttpWorkoutApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpWorkoutApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed building HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn post_workout(
        &self,
        kind: ActivityKind,
        workout: &WorkoutRecord,
    ) -> Result<RemoteSaveResponse, RemoteError> {
        let url = format!("{}/workouts/{}", self.base_url, kind.as_str());

        let mut request = self.http.post(&url).json(workout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let body: RemoteSaveResponse = self.check_response_json(response).await?;
        if !body.success {
            return Err(RemoteError::Rejected(
                body.message
                    .unwrap_or_else(|| "workout rejected".to_string()),
            ));
        }

        tracing::debug!(
            session_id = %workout.session_id,
            achievements = body.achievements.len(),
            "Workout saved remotely"
        );
        Ok(body)
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                tracing::warn!("Workout API rate limit hit (429)");
            }
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(format!("JSON parse error: {}", e)))
    }
}

impl WorkoutApi for HttpWorkoutApi {
    fn save_workout<'a>(
        &'a self,
        kind: ActivityKind,
        workout: &'a WorkoutRecord,
    ) -> BoxFuture<'a, Result<RemoteSaveResponse, RemoteError>> {
        self.post_workout(kind, workout).boxed()
    }
}

/// Scripted workout API.
///
/// Queued results are returned in order; once the script runs out the
/// default behaviour applies.
#[derive(Debug, Default)]
pub struct MockWorkoutApi {
    script: Mutex<VecDeque<Result<RemoteSaveResponse, RemoteError>>>,
    offline: bool,
    calls: Mutex<Vec<(ActivityKind, String)>>,
}

impl MockWorkoutApi {
    /// Accepts every workout.
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Fails every workout with a transport error.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn push_result(&self, result: Result<RemoteSaveResponse, RemoteError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    /// Session ids of every save attempt, in call order.
    pub fn calls(&self) -> Vec<(ActivityKind, String)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_result(&self, workout: &WorkoutRecord) -> Result<RemoteSaveResponse, RemoteError> {
        if let Some(result) = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
        {
            return result;
        }
        if self.offline {
            return Err(RemoteError::Transport("network unreachable".to_string()));
        }
        Ok(RemoteSaveResponse {
            success: true,
            workout: serde_json::to_value(workout).ok(),
            achievements: Vec::new(),
            message: Some("Workout saved".to_string()),
        })
    }
}

impl WorkoutApi for MockWorkoutApi {
    fn save_workout<'a>(
        &'a self,
        kind: ActivityKind,
        workout: &'a WorkoutRecord,
    ) -> BoxFuture<'a, Result<RemoteSaveResponse, RemoteError>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((kind, workout.session_id.clone()));
        let result = self.next_result(workout);
        async move { result }.boxed()
    }
}
