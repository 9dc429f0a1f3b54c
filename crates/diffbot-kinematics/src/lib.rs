#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for 2D differential-drive robot kinematics."]
#![doc = ""]
#![doc = "This crate provides structures and functions for robot pose, forward and inverse"]
#![doc = "wheel kinematics, exact-arc odometric integration and off-center point decoupling."]

use core::fmt;
use libm::{cos, fabs, sin, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod angle;
pub mod error;
pub mod offset;

pub use angle::{angle_diff, angle_diff_min, normalize_angle};
pub use error::KinematicsError;
pub use offset::OffCenterPoint;

/// Below this angular speed (rad/s) odometry integrates a straight Euler step
/// instead of the closed-form arc, whose `v/ω` radius is singular at `ω = 0`.
pub const STRAIGHT_LINE_THRESHOLD: f64 = 1e-4;

/// A point in the world frame, in meters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// World‑frame x position (m).
    pub x: f64,
    /// World‑frame y position (m).
    pub y: f64,
}

impl Point {
    /// Construct a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        sqrt(dx * dx + dy * dy)
    }
}

/// A 2‑D pose `(x, y, θ)` in meters and radians (θ measured counter‑clockwise
/// from the x‑axis in the world frame).
///
/// The heading is not wrapped: odometry keeps adding to it and every heading
/// comparison goes through [`angle_diff`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World‑frame x position (m).
    pub x: f64,
    /// World‑frame y position (m).
    pub y: f64,
    /// Heading (rad), unbounded.
    pub theta: f64,
}

impl Pose {
    /// Construct a new pose.
    ///
    /// # Arguments
    ///
    /// * `x`: World-frame x position in meters.
    /// * `y`: World-frame y position in meters.
    /// * `theta`: Heading in radians.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// The position part of the pose.
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Euclidean distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        self.position().distance_to(&other.position())
    }

    /// Signed minimal rotation from this pose's heading to `other`'s.
    pub fn heading_error_to(&self, other: &Pose) -> f64 {
        angle_diff(self.theta, other.theta)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x: {:.3}, y: {:.3}, θ: {:.3} rad)",
            self.x,
            self.y,
            normalize_angle(self.theta)
        )
    }
}

/// Left and right wheel angular velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    /// Left wheel angular velocity (rad/s).
    pub omega_l: f64,
    /// Right wheel angular velocity (rad/s).
    pub omega_r: f64,
}

impl WheelSpeeds {
    /// Both wheels stopped.
    pub const ZERO: WheelSpeeds = WheelSpeeds::new(0.0, 0.0);

    /// Construct wheel speeds.
    ///
    /// # Arguments
    ///
    /// * `omega_l`: Left wheel angular velocity (rad/s).
    /// * `omega_r`: Right wheel angular velocity (rad/s).
    pub const fn new(omega_l: f64, omega_r: f64) -> Self {
        WheelSpeeds { omega_l, omega_r }
    }

    /// Clamp both wheels to `±max` rad/s.
    pub fn saturate(self, max: f64) -> Self {
        WheelSpeeds::new(self.omega_l.clamp(-max, max), self.omega_r.clamp(-max, max))
    }
}

impl fmt::Display for WheelSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(ωL: {:.2} rad/s, ωR: {:.2} rad/s)", self.omega_l, self.omega_r)
    }
}

/// Linear and angular chassis velocities, the unicycle command `(v, ω)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSpeeds {
    /// Linear speed of the chassis center (m/s).
    pub v: f64,
    /// Angular speed of the chassis (rad/s).
    pub omega: f64,
}

impl ChassisSpeeds {
    /// Construct chassis speeds.
    ///
    /// # Arguments
    ///
    /// * `v`: Linear speed of the chassis center (m/s).
    /// * `omega`: Angular speed of the chassis (rad/s).
    pub const fn new(v: f64, omega: f64) -> Self {
        ChassisSpeeds { v, omega }
    }

    /// Clamp `v` to `±v_max` and `ω` to `±omega_max`.
    pub fn saturate(self, v_max: f64, omega_max: f64) -> Self {
        ChassisSpeeds::new(self.v.clamp(-v_max, v_max), self.omega.clamp(-omega_max, omega_max))
    }
}

impl fmt::Display for ChassisSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v: {:.2} m/s, ω: {:.2} rad/s)", self.v, self.omega)
    }
}

/// Differential‑drive kinematics helper.
///
/// This struct encapsulates the physical parameters of a differential-drive robot
/// (wheel radius and wheel separation) and provides methods for kinematic calculations.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    /// Wheel radius (m).
    wheel_radius: f64,
    /// Distance between the two wheel contact points (m).
    axle_length: f64,
}

impl DifferentialDrive {
    /// Construct a new differential‑drive kinematics helper.
    ///
    /// # Arguments
    ///
    /// * `wheel_radius`: The radius of the robot's wheels in meters.
    /// * `axle_length`: The distance between the centers of the two drive wheels in meters.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidWheelRadius)` if `wheel_radius` is not positive.
    /// Returns `Err(KinematicsError::InvalidAxleLength)` if `axle_length` is not positive.
    pub const fn new(wheel_radius: f64, axle_length: f64) -> Result<Self, KinematicsError> {
        // Written as negated comparisons so NaN is rejected too
        if !(wheel_radius > 0.0) {
            return Err(KinematicsError::InvalidWheelRadius("must be positive"));
        }
        if !(axle_length > 0.0) {
            return Err(KinematicsError::InvalidAxleLength("must be positive"));
        }
        Ok(DifferentialDrive {
            wheel_radius,
            axle_length,
        })
    }

    /// Returns the wheel radius.
    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    /// Returns the axle length.
    pub fn axle_length(&self) -> f64 {
        self.axle_length
    }

    /// Calculates the robot's chassis speeds (linear and angular velocity)
    /// from the wheel speeds. This is the forward kinematics problem.
    ///
    /// `v = r·(ωL + ωR)/2`, `ω = r·(ωR − ωL)/d`.
    pub fn forward_kinematics(&self, wheel_speeds: WheelSpeeds) -> ChassisSpeeds {
        let v_l = wheel_speeds.omega_l * self.wheel_radius;
        let v_r = wheel_speeds.omega_r * self.wheel_radius;

        let v = (v_r + v_l) / 2.0;
        let omega = (v_r - v_l) / self.axle_length;

        ChassisSpeeds::new(v, omega)
    }

    /// Calculates the required wheel speeds to achieve the given chassis speeds.
    /// This is the inverse kinematics problem.
    ///
    /// `ωR = v/r + ω·d/(2r)`, `ωL = v/r − ω·d/(2r)`.
    pub fn inverse_kinematics(&self, chassis_speeds: ChassisSpeeds) -> WheelSpeeds {
        let v_r = chassis_speeds.v + chassis_speeds.omega * (self.axle_length / 2.0);
        let v_l = chassis_speeds.v - chassis_speeds.omega * (self.axle_length / 2.0);

        let omega_r = v_r / self.wheel_radius;
        let omega_l = v_l / self.wheel_radius;

        WheelSpeeds::new(omega_l, omega_r)
    }

    /// Integrates constant chassis speeds over `dt` seconds starting from `current_pose`.
    ///
    /// The heading always advances by `ω·dt`. When `|ω|` is at most
    /// [`STRAIGHT_LINE_THRESHOLD`] the position takes an Euler step along the old
    /// heading; otherwise the robot is on an arc of radius `v/ω` and the position is
    /// integrated in closed form. A negative or NaN `dt` integrates nothing.
    pub fn update_pose(&self, current_pose: Pose, chassis_speeds: ChassisSpeeds, dt: f64) -> Pose {
        let dt = if dt > 0.0 { dt } else { 0.0 };
        let ChassisSpeeds { v, omega } = chassis_speeds;

        let theta = current_pose.theta + omega * dt;

        if fabs(omega) <= STRAIGHT_LINE_THRESHOLD {
            Pose {
                x: current_pose.x + v * dt * cos(current_pose.theta),
                y: current_pose.y + v * dt * sin(current_pose.theta),
                theta,
            }
        } else {
            let radius = v / omega;
            Pose {
                x: current_pose.x + radius * (sin(theta) - sin(current_pose.theta)),
                y: current_pose.y - radius * (cos(theta) - cos(current_pose.theta)),
                theta,
            }
        }
    }

    /// Convenience function to update pose directly from wheel speeds and dt.
    ///
    /// This method first calculates chassis speeds using `forward_kinematics` and then
    /// calls `update_pose`.
    pub fn update_pose_from_wheel_speeds(
        &self,
        current_pose: Pose,
        wheel_speeds: WheelSpeeds,
        dt: f64,
    ) -> Pose {
        let chassis_speeds = self.forward_kinematics(wheel_speeds);
        self.update_pose(current_pose, chassis_speeds, dt)
    }
}

impl fmt::Display for DifferentialDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DifferentialDrive (r: {:.3} m, d: {:.3} m)", self.wheel_radius, self.axle_length)
    }
}
