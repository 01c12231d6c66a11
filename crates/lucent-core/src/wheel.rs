//! Ctrl + mouse wheel opacity adjustment.

use std::time::{Duration, Instant};

use crate::config::WheelConfig;

/// One detent of a standard mouse wheel.
pub const WHEEL_DELTA: i32 = 120;

/// Drops wheel events that arrive faster than the configured interval.
#[derive(Debug, Clone)]
pub struct WheelThrottle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl WheelThrottle {
    pub fn new(config: &WheelConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(config.min_interval_ms),
            last: None,
        }
    }

    /// Returns `true` if an event at `now` should be handled.
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last
            && now.saturating_duration_since(last) < self.min_interval
        {
            return false;
        }
        self.last = Some(now);
        true
    }
}

/// Converts a raw wheel delta into a signed opacity change.
///
/// High-resolution wheels report fractions of a detent; any non-zero
/// delta counts as at least one step.
pub fn opacity_delta(wheel_delta: i32, step: u8) -> i32 {
    let notches = if wheel_delta.abs() >= WHEEL_DELTA {
        wheel_delta / WHEEL_DELTA
    } else {
        wheel_delta.signum()
    };
    notches * i32::from(step)
}
