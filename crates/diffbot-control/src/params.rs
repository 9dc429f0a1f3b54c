//! Tunable constants of the motion stack.
//!
//! Field names carry their unit as a suffix. Defaults are the values the
//! robot was tuned with.

use std::time::Duration;

use diffbot_kinematics::{DifferentialDrive, OffCenterPoint};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ControlError;
use crate::pid::PidGains;

/// All parameters of the motion stack.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// Wheel radius `r`.
    pub wheel_radius_m: f64,
    /// Distance between the wheel contact points `d`.
    pub axle_length_m: f64,
    /// Distance `b` of the controlled point ahead of the axle center.
    pub offset_m: f64,
    /// Wheel velocity regulator.
    pub regulator: RegulatorParams,
    /// Pose controller and trajectory.
    pub control: ControlParams,
    /// Hysteresis on external pose and goal updates.
    pub fusion: FusionParams,
    /// Minimum spacing between two telemetry frames.
    pub telemetry_period_ms: u64,
}

/// Per-wheel speed filter and PI loop.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct RegulatorParams {
    pub period_ms: u64,
    /// Moving-average length, in samples.
    pub window: usize,
    pub resolution_rad_per_tick: f64,
    pub gains: PidGains,
    pub max_voltage_v: f64,
    /// Targets are clamped to this before reaching the PI loop.
    pub max_wheel_speed_rads: f64,
}

/// Trajectory limits, controller gains and phase tolerances.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ControlParams {
    pub period_ms: u64,
    /// Gains shared by the x and y position loops.
    pub position_gains: PidGains,
    /// Output clamp of each position loop.
    pub position_output_limit_mps: f64,
    pub orientation_gains: PidGains,
    pub v_max_mps: f64,
    pub a_max_mps2: f64,
    pub omega_max_rads: f64,
    pub position_tolerance_m: f64,
    pub orientation_tolerance_rad: f64,
}

/// Deadbands applied by the fusion gate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    /// A pose correction must move the estimate by more than this.
    pub pose_threshold_m: f64,
    /// A new goal must move the goal position by more than this.
    pub goal_position_threshold_m: f64,
    /// Heading change that alone is enough to accept a goal.
    pub goal_heading_threshold_rad: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            wheel_radius_m: 0.055,
            axle_length_m: 0.245,
            offset_m: 0.02,
            regulator: RegulatorParams::default(),
            control: ControlParams::default(),
            fusion: FusionParams::default(),
            telemetry_period_ms: 100,
        }
    }
}

impl Default for RegulatorParams {
    fn default() -> Self {
        Self {
            period_ms: 5,
            window: 200,
            resolution_rad_per_tick: 0.0057,
            gains: PidGains::new(1.5, 15.0, 0.0),
            max_voltage_v: 12.0,
            max_wheel_speed_rads: 20.0,
        }
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            period_ms: 15,
            position_gains: PidGains::new(1.0, 0.0, 0.0),
            // Motors top out around 200 RPM, roughly 25 rad/s at the wheel.
            position_output_limit_mps: 25.0 * 0.055,
            orientation_gains: PidGains::new(1.5, 0.0, 0.0),
            v_max_mps: 0.18,
            a_max_mps2: 0.08,
            omega_max_rads: 0.6,
            position_tolerance_m: 0.035,
            orientation_tolerance_rad: 0.035,
        }
    }
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            pose_threshold_m: 0.02,
            goal_position_threshold_m: 0.025,
            goal_heading_threshold_rad: 0.05,
        }
    }
}

fn positive(value: f64, what: &'static str) -> Result<(), ControlError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ControlError::InvalidParam(what))
    }
}

fn non_negative(value: f64, what: &'static str) -> Result<(), ControlError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ControlError::InvalidParam(what))
    }
}

impl Params {
    /// Checks every field and returns the first problem found.
    pub fn validate(&self) -> Result<(), ControlError> {
        self.drive()?;
        self.offset_point()?;
        self.regulator.validate()?;
        self.control.validate()?;
        self.fusion.validate()?;
        // The axle center settles `b` short of the goal.
        if self.offset_m >= self.control.position_tolerance_m {
            return Err(ControlError::InvalidParam("offset must be below the position tolerance"));
        }
        if self.telemetry_period_ms == 0 {
            return Err(ControlError::InvalidParam("telemetry period must be positive"));
        }
        Ok(())
    }

    /// Wheel kinematics built from `r` and `d`.
    pub fn drive(&self) -> Result<DifferentialDrive, ControlError> {
        Ok(DifferentialDrive::new(self.wheel_radius_m, self.axle_length_m)?)
    }

    /// The controlled point `b` ahead of the axle.
    pub fn offset_point(&self) -> Result<OffCenterPoint, ControlError> {
        Ok(OffCenterPoint::new(self.offset_m)?)
    }

    pub fn telemetry_period(&self) -> Duration {
        Duration::from_millis(self.telemetry_period_ms)
    }
}

impl RegulatorParams {
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.period_ms == 0 {
            return Err(ControlError::InvalidParam("regulator period must be positive"));
        }
        if self.window == 0 {
            return Err(ControlError::InvalidParam("speed filter window must be positive"));
        }
        positive(self.resolution_rad_per_tick, "encoder resolution must be positive")?;
        self.gains.validate()?;
        positive(self.max_voltage_v, "max voltage must be positive")?;
        positive(self.max_wheel_speed_rads, "max wheel speed must be positive")
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl ControlParams {
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.period_ms == 0 {
            return Err(ControlError::InvalidParam("control period must be positive"));
        }
        self.position_gains.validate()?;
        self.orientation_gains.validate()?;
        positive(self.position_output_limit_mps, "position output limit must be positive")?;
        positive(self.v_max_mps, "v_max must be positive")?;
        positive(self.a_max_mps2, "a_max must be positive")?;
        positive(self.omega_max_rads, "omega_max must be positive")?;
        positive(self.position_tolerance_m, "position tolerance must be positive")?;
        positive(self.orientation_tolerance_rad, "orientation tolerance must be positive")
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl FusionParams {
    pub fn validate(&self) -> Result<(), ControlError> {
        non_negative(self.pose_threshold_m, "pose threshold must not be negative")?;
        non_negative(self.goal_position_threshold_m, "goal position threshold must not be negative")?;
        non_negative(self.goal_heading_threshold_rad, "goal heading threshold must not be negative")
    }
}
