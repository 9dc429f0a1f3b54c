//! Cascaded pose controller.
//!
//! Position control regulates the point `b` ahead of the axle with two
//! independent Cartesian PID loops plus trajectory feedforward, then maps the
//! result to `(v, ω)` through [`OffCenterPoint::to_chassis_speeds`] and on to
//! wheel speeds through [`DifferentialDrive::inverse_kinematics`]. Orientation
//! control turns in place on the heading error alone.

use diffbot_kinematics::{
    ChassisSpeeds, DifferentialDrive, OffCenterPoint, Point, Pose, WheelSpeeds, angle_diff,
};

use crate::error::ControlError;
use crate::params::Params;
use crate::pid::{Pid, PidMode};
use crate::trajectory::Trajectory;

pub struct PoseController {
    drive: DifferentialDrive,
    point: OffCenterPoint,
    pid_x: Pid,
    pid_y: Pid,
    pid_theta: Pid,
    v_max: f64,
    omega_max: f64,
    last_command: ChassisSpeeds,
}

impl PoseController {
    /// Builds both sub-controllers. They start disabled.
    pub fn new(params: &Params) -> Result<Self, ControlError> {
        let control = &params.control;
        let sample_time = control.period().as_secs_f64();
        let position = Pid::new(control.position_gains, sample_time, control.position_output_limit_mps);
        let mut controller = PoseController {
            drive: params.drive()?,
            point: params.offset_point()?,
            pid_x: position.clone(),
            pid_y: position,
            pid_theta: Pid::new(control.orientation_gains, sample_time, control.omega_max_rads),
            v_max: control.v_max_mps,
            omega_max: control.omega_max_rads,
            last_command: ChassisSpeeds::default(),
        };
        controller.enable_position(false);
        controller.enable_orientation(false);
        Ok(controller)
    }

    pub fn drive(&self) -> &DifferentialDrive {
        &self.drive
    }

    pub fn reference_point(&self, pose: &Pose) -> Point {
        self.point.reference_point(pose)
    }

    /// Unicycle command produced by the last step, after saturation.
    pub fn last_command(&self) -> ChassisSpeeds {
        self.last_command
    }

    pub fn enable_position(&mut self, enabled: bool) {
        let mode = if enabled { PidMode::Automatic } else { PidMode::Manual };
        self.pid_x.set_mode(mode);
        self.pid_y.set_mode(mode);
    }

    pub fn enable_orientation(&mut self, enabled: bool) {
        let mode = if enabled { PidMode::Automatic } else { PidMode::Manual };
        self.pid_theta.set_mode(mode);
    }

    pub fn reset_position(&mut self) {
        self.pid_x.reset();
        self.pid_y.reset();
    }

    pub fn reset_orientation(&mut self) {
        self.pid_theta.reset();
    }

    pub fn position_enabled(&self) -> bool {
        self.pid_x.is_enabled()
    }

    pub fn orientation_enabled(&self) -> bool {
        self.pid_theta.is_enabled()
    }

    /// Tracks the trajectory's desired position with the off-center point.
    ///
    /// The trajectory must already have been advanced for this tick.
    pub fn compute_position_step(&mut self, pose: &Pose, trajectory: &Trajectory) -> WheelSpeeds {
        let feedback = self.point.reference_point(pose);
        let desired = trajectory.desired_position();
        let (ff_x, ff_y) = trajectory.feedforward();

        let ux = self.pid_x.step(feedback.x, desired.x) + ff_x;
        let uy = self.pid_y.step(feedback.y, desired.y) + ff_y;

        let command = self
            .point
            .to_chassis_speeds(pose.theta, ux, uy)
            .saturate(self.v_max, self.omega_max);
        self.last_command = command;
        self.drive.inverse_kinematics(command)
    }

    /// Turns in place toward `goal_heading`.
    pub fn compute_orientation_step(&mut self, pose: &Pose, goal_heading: f64) -> WheelSpeeds {
        let error = angle_diff(pose.theta, goal_heading);
        // measurement −error against setpoint 0 keeps error = setpoint − measurement
        let omega = self.pid_theta.step(-error, 0.0);
        let command = ChassisSpeeds::new(0.0, omega).saturate(self.v_max, self.omega_max);
        self.last_command = command;
        self.drive.inverse_kinematics(command)
    }

    /// Records that the wheels were told to stop.
    pub fn hold(&mut self) -> WheelSpeeds {
        self.last_command = ChassisSpeeds::default();
        WheelSpeeds::ZERO
    }
}
