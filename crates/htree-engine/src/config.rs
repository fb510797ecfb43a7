//! Pacing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timer periods of the ingestion loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Milliseconds between two queued nodes appearing
    pub arrival_interval_ms: u64,
    /// Milliseconds per render frame; layout requests inside one frame coalesce
    pub frame_interval_ms: u64,
}

impl PacingConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With arrival interval
    #[inline]
    #[must_use]
    pub fn with_arrival_interval(mut self, interval: Duration) -> Self {
        self.arrival_interval_ms = duration_ms(interval);
        self
    }

    /// With frame interval
    #[inline]
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval_ms = duration_ms(interval);
        self
    }

    /// Arrival interval, at least 1ms
    #[inline]
    #[must_use]
    pub fn arrival_interval(&self) -> Duration {
        Duration::from_millis(self.arrival_interval_ms.max(1))
    }

    /// Frame interval, at least 1ms
    #[inline]
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            arrival_interval_ms: 250,
            frame_interval_ms: 16,
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
