//! Virtual clock for discrete-event simulation.
//!
//! The [`SimClock`] tracks simulation time independently of wall-clock time,
//! advancing only when events are processed. Time is kept as integer
//! microseconds so event ordering and replays are exact for a given seed.

use serde::{Deserialize, Serialize};

const US_PER_SEC: f64 = 1_000_000.0;

/// Convert seconds to whole microseconds, rounding to nearest.
///
/// Negative and non-finite inputs map to zero.
pub fn secs_to_us(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * US_PER_SEC).round() as u64
}

/// Convert microseconds to seconds.
pub fn us_to_secs(us: u64) -> f64 {
    us as f64 / US_PER_SEC
}

/// Virtual simulation clock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    /// Current simulation time in microseconds.
    current_us: u64,
}

impl SimClock {
    /// Create a new clock starting at time zero.
    pub fn new() -> Self {
        Self { current_us: 0 }
    }

    /// Current time in microseconds.
    pub fn now_us(&self) -> u64 {
        self.current_us
    }

    /// Current time in seconds.
    pub fn now_secs(&self) -> f64 {
        us_to_secs(self.current_us)
    }

    /// Advance the clock to a specific time in microseconds.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `us` is in the past.
    pub fn advance_to_us(&mut self, us: u64) {
        debug_assert!(
            us >= self.current_us,
            "Cannot move clock backwards: current={}us, target={}us",
            self.current_us,
            us,
        );
        self.current_us = us;
    }

    /// Time `delay_secs` from now, in microseconds.
    pub fn after_secs(&self, delay_secs: f64) -> u64 {
        self.current_us.saturating_add(secs_to_us(delay_secs))
    }
}
