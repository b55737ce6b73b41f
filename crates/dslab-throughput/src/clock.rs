//! Time sources for the admission loop.
//!
//! Time is measured in seconds since the clock was created, like simulation time in dslab.

use std::cell::Cell;
use std::time::{Duration, Instant};

pub trait Clock {
    /// Seconds elapsed since the clock was started.
    fn time(&self) -> f64;

    /// Blocks for `duration` seconds. Non-positive durations return immediately.
    fn sleep(&self, duration: f64);
}

/// Real time backed by [`Instant`] and [`std::thread::sleep`].
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn sleep(&self, duration: f64) {
        if duration > 0. {
            std::thread::sleep(Duration::try_from_secs_f64(duration).unwrap_or(Duration::MAX));
        }
    }
}

/// Virtual time: sleeping advances the clock instantly.
///
/// Used for dry runs against the simulated cluster and in tests.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Cell<f64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0.) }
    }

    pub fn set_time(&self, time: f64) {
        self.now.set(time);
    }

    pub fn advance(&self, delta: f64) {
        if delta > 0. {
            self.now.set(self.now.get() + delta);
        }
    }
}

impl Clock for VirtualClock {
    fn time(&self) -> f64 {
        self.now.get()
    }

    fn sleep(&self, duration: f64) {
        self.advance(duration);
    }
}
