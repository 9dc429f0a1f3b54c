//! The cooperative control loop.
//!
//! [`MotionLoop::poll`] is meant to be called far more often than the fastest
//! period. It never blocks: the wheel regulator runs when its period has
//! elapsed, and the pose controller runs nested inside a regulator tick when
//! its own, longer period has elapsed too.

use diffbot_kinematics::{Pose, WheelSpeeds};
use diffbot_motor::{EncoderSource, WheelDrive, WheelId};

use crate::clock::{Clock, PeriodicGate};
use crate::error::ControlError;
use crate::fusion::ExternalUpdate;
use crate::motion::{MotionCore, UpdateOutcome};
use crate::params::Params;
use crate::telemetry::{Telemetry, TelemetryThrottle};
use crate::wheels::WheelRegulator;

/// Counters for how often each stage actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    pub polls: u64,
    pub regulator_ticks: u64,
    pub control_ticks: u64,
}

pub struct MotionLoop<E, D, C> {
    clock: C,
    regulator: WheelRegulator<E, D>,
    core: MotionCore,
    control_gate: PeriodicGate,
    telemetry: TelemetryThrottle,
    stats: LoopStats,
}

impl<E, D, C> MotionLoop<E, D, C>
where
    E: EncoderSource,
    D: WheelDrive,
    C: Clock,
{
    pub fn new(
        encoders: E,
        drive: D,
        clock: C,
        params: &Params,
        initial_pose: Pose,
    ) -> Result<Self, ControlError> {
        let now = clock.now();
        let core = MotionCore::new(params, initial_pose, now)?;
        Ok(MotionLoop {
            regulator: WheelRegulator::new(encoders, drive, params.regulator.clone(), now),
            core,
            control_gate: PeriodicGate::new(params.control.period(), now),
            telemetry: TelemetryThrottle::new(params.telemetry_period(), now),
            stats: LoopStats::default(),
            clock,
        })
    }

    pub fn core(&self) -> &MotionCore {
        &self.core
    }

    pub fn regulator(&self) -> &WheelRegulator<E, D> {
        &self.regulator
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Filtered wheel speeds as currently measured.
    pub fn wheel_speeds(&self) -> WheelSpeeds {
        WheelSpeeds::new(
            self.regulator.filtered_speed(WheelId::Left),
            self.regulator.filtered_speed(WheelId::Right),
        )
    }

    /// Runs whatever is due and returns a telemetry frame when one is due.
    pub fn poll(&mut self) -> Option<Telemetry> {
        let now = self.clock.now();
        self.stats.polls += 1;

        if self.regulator.tick(now) {
            self.stats.regulator_ticks += 1;

            if let Some(elapsed) = self.control_gate.poll(now) {
                self.stats.control_ticks += 1;
                let speeds = self.wheel_speeds();
                let targets = self.core.control_step(speeds, elapsed.as_secs_f64(), now);
                self.regulator.set_target_speed(WheelId::Left, targets.omega_l);
                self.regulator.set_target_speed(WheelId::Right, targets.omega_r);
            }
        }

        let (core, speeds) = (&self.core, self.wheel_speeds());
        self.telemetry.sample(now, || Telemetry {
            stamp: now,
            pose: core.pose(),
            goal: core.goal(),
            phase: core.phase(),
            targets: core.targets(),
            speeds,
            progress: core.trajectory().progress().s,
        })
    }

    /// Commits an external pose/goal update between ticks.
    pub fn apply(&mut self, update: ExternalUpdate) -> UpdateOutcome {
        let now = self.clock.now();
        self.core.apply(update, now)
    }
}
