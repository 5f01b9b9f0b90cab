// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Animation clock port.
//!
//! The driver samples the clock exactly once per tick and passes the value
//! down; nothing in the scene reads time on its own.

use std::time::Instant;

/// Source of elapsed time in seconds.
pub trait Clock {
    /// Seconds since the clock's origin. Must not decrease between calls
    /// unless the owner seeks explicitly.
    fn elapsed_seconds(&self) -> f64;
}

/// Monotonic wall clock anchored at construction.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    /// Starts counting from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn elapsed_seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. Used by tests and for seeking.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualClock {
    now: f64,
}

impl ManualClock {
    /// Clock reading `t` seconds.
    pub const fn at(t: f64) -> Self {
        Self { now: t }
    }

    /// Jumps to `t`.
    pub fn set(&mut self, t: f64) {
        self.now = t;
    }

    /// Moves forward by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.now += dt;
    }
}

impl Clock for ManualClock {
    fn elapsed_seconds(&self) -> f64 {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let mut clock = ManualClock::at(1.0);
        assert_eq!(clock.elapsed_seconds(), 1.0);
        clock.advance(0.5);
        assert_eq!(clock.elapsed_seconds(), 1.5);
        clock.set(0.0);
        assert_eq!(clock.elapsed_seconds(), 0.0);
    }

    #[test]
    fn wall_clock_is_monotonic() {
        let clock = WallClock::new();
        let a = clock.elapsed_seconds();
        let b = clock.elapsed_seconds();
        assert!(b >= a);
    }
}
