// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drift-tolerant session clock.
//!
//! Elapsed time is always recomputed from the origin timestamp rather than
//! incremented, so late or skipped timer firings never accumulate error.
//! Pausing freezes the value; resuming shifts the origin forward by the
//! paused interval.

use crate::time_utils::TimeSource;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Notifications due at the time of a [`SessionClock::poll`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockPoll {
    /// Elapsed seconds, when a tick is due (never while paused)
    pub tick: Option<u64>,
    /// Whether an autosave is due (also while paused)
    pub autosave: bool,
}

pub struct SessionClock {
    time: Arc<dyn TimeSource>,
    tick_period: Duration,
    autosave_period: Duration,
    origin: Option<DateTime<Utc>>,
    paused_at: Option<DateTime<Utc>>,
    final_elapsed: Option<u64>,
    next_tick: Option<DateTime<Utc>>,
    next_autosave: Option<DateTime<Utc>>,
}

impl SessionClock {
    pub fn new(
        time: Arc<dyn TimeSource>,
        tick_period: std::time::Duration,
        autosave_period: std::time::Duration,
    ) -> Self {
        Self {
            time,
            tick_period: to_chrono(tick_period),
            autosave_period: to_chrono(autosave_period),
            origin: None,
            paused_at: None,
            final_elapsed: None,
            next_tick: None,
            next_autosave: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.origin.is_some() && self.final_elapsed.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Start from zero. Returns false if already running.
    pub fn start(&mut self) -> bool {
        self.start_from(0)
    }

    /// Start with `elapsed` seconds already on the clock (session restore).
    /// Returns false if already running or `elapsed` lies outside the
    /// representable time range.
    pub fn start_from(&mut self, elapsed: u64) -> bool {
        if self.is_running() {
            return false;
        }
        let now = self.time.now();
        let Some(origin) = i64::try_from(elapsed)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|offset| now.checked_sub_signed(offset))
        else {
            return false;
        };
        self.origin = Some(origin);
        self.paused_at = None;
        self.final_elapsed = None;
        self.next_tick = Some(now + self.tick_period);
        self.next_autosave = Some(now + self.autosave_period);
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.is_running() || self.is_paused() {
            return false;
        }
        self.paused_at = Some(self.time.now());
        true
    }

    pub fn resume(&mut self) -> bool {
        let (Some(paused_at), Some(origin)) = (self.paused_at, self.origin) else {
            return false;
        };
        if !self.is_running() {
            return false;
        }
        let paused_for = self.time.now() - paused_at;
        self.origin = Some(origin + paused_for);
        self.paused_at = None;
        true
    }

    /// Halt notifications and fix the terminal elapsed value.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.final_elapsed = Some(self.elapsed());
        self.paused_at = None;
        self.next_tick = None;
        self.next_autosave = None;
        true
    }

    /// Whole elapsed seconds, excluding paused intervals.
    pub fn elapsed(&self) -> u64 {
        if let Some(elapsed) = self.final_elapsed {
            return elapsed;
        }
        let Some(origin) = self.origin else {
            return 0;
        };
        let reference = self.paused_at.unwrap_or_else(|| self.time.now());
        let millis = (reference - origin).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis / 1000) as u64
        }
    }

    /// Report which notifications are due and schedule the next ones.
    pub fn poll(&mut self) -> ClockPoll {
        if !self.is_running() {
            return ClockPoll::default();
        }
        let now = self.time.now();
        let mut poll = ClockPoll::default();

        if let Some(next) = self.next_tick {
            if now >= next {
                self.next_tick = Some(advance_past(next, self.tick_period, now));
                if !self.is_paused() {
                    poll.tick = Some(self.elapsed());
                }
            }
        }

        if let Some(next) = self.next_autosave {
            if now >= next {
                self.next_autosave = Some(advance_past(next, self.autosave_period, now));
                poll.autosave = true;
            }
        }

        poll
    }

    /// Forget everything; the clock can be started again.
    pub fn reset(&mut self) {
        self.origin = None;
        self.paused_at = None;
        self.final_elapsed = None;
        self.next_tick = None;
        self.next_autosave = None;
    }
}

fn to_chrono(period: std::time::Duration) -> Duration {
    Duration::from_std(period).unwrap_or_else(|_| Duration::seconds(1))
}

/// First deadline strictly after `now` on the `period` grid starting at `next`.
fn advance_past(next: DateTime<Utc>, period: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    if period <= Duration::zero() {
        return now;
    }
    let behind = (now - next).num_milliseconds();
    let step = period.num_milliseconds().max(1);
    next + Duration::milliseconds((behind / step + 1) * step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::ManualTimeSource;
    use chrono::TimeZone;

    fn clock() -> (Arc<ManualTimeSource>, SessionClock) {
        let time = Arc::new(ManualTimeSource::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap(),
        ));
        let clock = SessionClock::new(
            time.clone(),
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(30),
        );
        (time, clock)
    }

    #[test]
    fn test_start_twice_fails() {
        let (_, mut clock) = clock();
        assert!(clock.start());
        assert!(!clock.start());
    }

    #[test]
    fn test_start_from_out_of_range_is_rejected() {
        let (_, mut clock) = clock();
        assert!(!clock.start_from(10_000_000_000_000_000));
        assert!(!clock.start_from(u64::MAX));
        assert!(!clock.is_running());
        assert!(clock.start_from(90));
        assert_eq!(clock.elapsed(), 90);
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let (time, mut clock) = clock();
        clock.start();
        time.advance_secs(10);
        assert!(clock.pause());
        assert!(!clock.pause());
        time.advance_secs(100);
        assert_eq!(clock.elapsed(), 10);
        assert!(clock.resume());
        assert!(!clock.resume());
        time.advance_secs(5);
        assert_eq!(clock.elapsed(), 15);
    }

    #[test]
    fn test_elapsed_floors_partial_seconds() {
        let (time, mut clock) = clock();
        clock.start();
        time.advance(Duration::milliseconds(2_999));
        assert_eq!(clock.elapsed(), 2);
    }

    #[test]
    fn test_stop_fixes_value() {
        let (time, mut clock) = clock();
        assert!(!clock.stop());
        clock.start();
        time.advance_secs(42);
        assert!(clock.stop());
        time.advance_secs(42);
        assert_eq!(clock.elapsed(), 42);
        assert_eq!(clock.poll(), ClockPoll::default());
    }

    #[test]
    fn test_poll_ticks_and_autosaves() {
        let (time, mut clock) = clock();
        clock.start();
        assert_eq!(clock.poll().tick, None);

        time.advance_secs(1);
        assert_eq!(clock.poll().tick, Some(1));
        assert_eq!(clock.poll().tick, None);

        // A late poll reports the recomputed value once
        time.advance_secs(5);
        assert_eq!(clock.poll().tick, Some(6));

        time.advance_secs(24);
        let poll = clock.poll();
        assert_eq!(poll.tick, Some(30));
        assert!(poll.autosave);
    }

    #[test]
    fn test_autosave_due_while_paused() {
        let (time, mut clock) = clock();
        clock.start();
        clock.pause();
        time.advance_secs(30);
        let poll = clock.poll();
        assert_eq!(poll.tick, None);
        assert!(poll.autosave);
    }
}
