//! Rate-limited snapshots of the control state for external plotting.

use std::time::Duration;

use diffbot_kinematics::{Pose, WheelSpeeds};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::clock::{Instant, PeriodicGate};
use crate::phase::ControlPhase;

/// One telemetry sample.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub stamp: Instant,
    pub pose: Pose,
    pub goal: Pose,
    pub phase: ControlPhase,
    /// Wheel speed targets handed to the regulator.
    pub targets: WheelSpeeds,
    /// Filtered wheel speeds measured by the regulator.
    pub speeds: WheelSpeeds,
    /// Trajectory progress `s`.
    pub progress: f64,
}

impl Telemetry {
    /// Named scalar channels, in a fixed order.
    pub fn channels(&self) -> [(&'static str, f64); 12] {
        [
            ("x", self.pose.x),
            ("y", self.pose.y),
            ("theta", self.pose.theta),
            ("goal_x", self.goal.x),
            ("goal_y", self.goal.y),
            ("goal_theta", self.goal.theta),
            ("phase", f64::from(self.phase.code())),
            ("target_l", self.targets.omega_l),
            ("target_r", self.targets.omega_r),
            ("speed_l", self.speeds.omega_l),
            ("speed_r", self.speeds.omega_r),
            ("s", self.progress),
        ]
    }
}

/// Lets at most one frame through per period.
#[derive(Debug, Clone)]
pub struct TelemetryThrottle {
    gate: PeriodicGate,
    emitted: u64,
}

impl TelemetryThrottle {
    pub fn new(period: Duration, start: Instant) -> Self {
        TelemetryThrottle { gate: PeriodicGate::new(period, start), emitted: 0 }
    }

    /// Builds a frame with `make` only when one is due.
    pub fn sample(&mut self, now: Instant, make: impl FnOnce() -> Telemetry) -> Option<Telemetry> {
        self.gate.poll(now)?;
        self.emitted += 1;
        Some(make())
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
