//! Growth clock: elapsed wall-clock time to multiplier.
//!
//! The multiplier is a pure function of elapsed time, `max(1, e^(k*t))`, so
//! a delayed or dropped tick never causes drift — it only samples the same
//! continuous curve more coarsely.

use std::time::Duration;

/// Default exponential growth rate. Tuned for a slow, readable climb:
/// ~5.8s to 2x, ~13.4s to 5x.
pub const DEFAULT_GROWTH_RATE: f64 = 0.12;

/// Converts elapsed time since round start into the current multiplier.
#[derive(Debug, Clone, Copy)]
pub struct GrowthClock {
    growth_rate: f64,
}

impl GrowthClock {
    pub fn new(growth_rate: f64) -> Self {
        assert!(growth_rate > 0.0, "growth rate must be positive");
        Self { growth_rate }
    }

    /// Multiplier after `elapsed` time, always at least 1.00 and monotonic
    /// in `elapsed`.
    pub fn multiplier_at(&self, elapsed: Duration) -> f64 {
        (self.growth_rate * elapsed.as_secs_f64()).exp().max(1.0)
    }

    /// Inverse of [`multiplier_at`](Self::multiplier_at): how long a round
    /// must run to reach `multiplier`. Used by schedulers and tests.
    pub fn time_to_reach(&self, multiplier: f64) -> Duration {
        if multiplier <= 1.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(multiplier.ln() / self.growth_rate)
    }
}

impl Default for GrowthClock {
    fn default() -> Self {
        Self::new(DEFAULT_GROWTH_RATE)
    }
}
