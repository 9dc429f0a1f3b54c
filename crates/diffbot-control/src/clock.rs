//! Monotonic time as seen by the control loop.
//!
//! Components never read a system clock themselves. The caller samples a
//! [`Clock`] once per poll and hands the [`Instant`] down, so a whole tick
//! works on one consistent timestamp and tests can step time by hand.

use std::cell::Cell;
use std::fmt;
use std::ops::Add;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A monotonic timestamp with microsecond resolution.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant {
    micros: u64,
}

impl Instant {
    /// The clock's origin.
    pub const ZERO: Instant = Instant { micros: 0 };

    pub const fn from_micros(micros: u64) -> Self {
        Instant { micros }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Instant { micros: millis * 1_000 }
    }

    pub const fn as_micros(self) -> u64 {
        self.micros
    }

    pub const fn as_millis(self) -> u64 {
        self.micros / 1_000
    }

    pub fn as_secs_f64(self) -> f64 {
        self.micros as f64 * 1e-6
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        Duration::from_micros(self.micros.saturating_sub(earlier.micros))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Instant::from_micros(self.micros.saturating_add(micros))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

/// Source of monotonic timestamps.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        ManualClock { now: Cell::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Instant) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Fires at most once per `period`, reporting the real time elapsed since it
/// last fired.
#[derive(Debug, Clone)]
pub struct PeriodicGate {
    period: Duration,
    last: Instant,
}

impl PeriodicGate {
    /// A gate whose first firing is one period after `start`.
    pub fn new(period: Duration, start: Instant) -> Self {
        PeriodicGate { period, last: start }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns the elapsed time if at least one period has passed since the
    /// last firing, and re-arms the gate at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.last);
        if elapsed >= self.period {
            self.last = now;
            Some(elapsed)
        } else {
            None
        }
    }

    /// Restarts the period at `now` without firing.
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_waits_a_full_period() {
        let mut gate = PeriodicGate::new(Duration::from_millis(5), Instant::ZERO);
        assert_eq!(gate.poll(Instant::from_micros(4_999)), None);
        assert_eq!(gate.poll(Instant::from_millis(5)), Some(Duration::from_millis(5)));
        assert_eq!(gate.poll(Instant::from_millis(6)), None);
    }

    #[test]
    fn gate_reports_late_elapsed_time() {
        let mut gate = PeriodicGate::new(Duration::from_millis(15), Instant::ZERO);
        assert_eq!(gate.poll(Instant::from_millis(22)), Some(Duration::from_millis(22)));
        // re-armed at the late firing, not on the nominal grid
        assert_eq!(gate.poll(Instant::from_millis(36)), None);
        assert_eq!(gate.poll(Instant::from_millis(37)), Some(Duration::from_millis(15)));
    }

    #[test]
    fn gate_ignores_time_going_backwards() {
        let mut gate = PeriodicGate::new(Duration::from_millis(5), Instant::from_millis(10));
        assert_eq!(gate.poll(Instant::from_millis(3)), None);
    }

    #[test]
    fn manual_clock_steps() {
        let clock = ManualClock::new(Instant::from_millis(1));
        clock.advance(Duration::from_micros(2_500));
        assert_eq!(clock.now(), Instant::from_micros(3_500));
        let by_ref = &clock;
        assert_eq!(by_ref.now().as_millis(), 3);
    }
}
