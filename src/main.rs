// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stride-Sync
//!
//! Background sweeper that pushes locally queued workouts to the remote
//! workout service until interrupted.

use anyhow::Context;
use std::sync::Arc;
use stride_tracker::{
    config::AppConfig,
    db::{JsonFileStore, KeyValueStore},
    services::{HttpWorkoutApi, SyncQueue},
    time_utils::{SystemTimeSource, TimeSource},
};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        api = %config.api_base_url,
        data_dir = %config.data_dir.display(),
        interval_secs = config.sync_interval.as_secs(),
        "Starting Stride-Sync"
    );

    let store: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(&config.data_dir).context("Failed to open local data directory")?,
    );
    let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let api = HttpWorkoutApi::new(config.api_base_url.clone(), config.api_token.clone())
        .context("Failed to build workout API client")?;

    let queue = SyncQueue::new(store, time, config.tracker.max_sync_attempts);

    let mut interval = tokio::time::interval(config.sync_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match queue.sync_pending_workouts(&api).await {
                    Ok(report) if report.synced + report.failed > 0 => {
                        tracing::info!(
                            synced = report.synced,
                            failed = report.failed,
                            dropped = report.dropped,
                            remaining = report.remaining,
                            "Sweep complete"
                        );
                    }
                    Ok(_) => tracing::debug!("Nothing to sync"),
                    Err(e) => tracing::error!(error = %e, "Sync sweep failed"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["stride_tracker=debug", "stride_sync=debug", "info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry().with(filter).with(format).init();
}
