// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stride-Tracker: workout session engine for running, cycling, swimming and gym
//!
//! This crate drives a single workout session from start to saved record:
//! a drift-free session clock, GPS distance/pace/split tracking, swim laps
//! with SWOLF, and an offline-first save path backed by a durable sync queue.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

pub use error::{Result, TrackerError};
