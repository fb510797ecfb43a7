//! Arrival Scheduler
//!
//! Fixed-rate pacing for the arrival queue: each tick lets exactly one queued
//! node into the store. Purely cosmetic; correctness never depends on it
//! because completion drains the queue in one go.
//!
//! The interval is created lazily on the first `tick` so the scheduler can be
//! built outside a runtime, and the first tick fires one full period after
//! that.

use std::future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Periodic promotion timer
#[derive(Debug)]
pub struct ArrivalScheduler {
    period: Duration,
    interval: Option<Interval>,
    stopped: bool,
}

impl ArrivalScheduler {
    /// Create a scheduler ticking every `period`
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
            stopped: false,
        }
    }

    /// Tick period
    #[inline]
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next tick; never completes once stopped
    pub async fn tick(&mut self) -> Instant {
        if self.stopped {
            return future::pending().await;
        }
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await
    }

    /// Stop ticking; pending `tick` calls never complete
    pub fn stop(&mut self) {
        self.stopped = true;
        self.interval = None;
    }

    /// Resume ticking with a fresh period
    pub fn resume(&mut self) {
        self.stopped = false;
        self.interval = None;
    }

    /// Whether the scheduler is stopped
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
