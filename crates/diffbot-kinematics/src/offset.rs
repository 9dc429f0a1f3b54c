//! Off-center point decoupling.
//!
//! A differential-drive robot cannot move sideways, so a Cartesian controller
//! acting on its wheel-axis center is singular. A point `b` meters ahead of the
//! center along the heading has no such problem: its planar velocity maps
//! one-to-one onto the unicycle command `(v, ω)` for any `b != 0`.

use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ChassisSpeeds, KinematicsError, Point, Pose};

/// A reference point fixed `offset` meters ahead of the robot's rotation center.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffCenterPoint {
    offset: f64,
}

impl OffCenterPoint {
    /// Construct the reference point.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidOffset)` if `offset` is zero or not finite.
    pub fn new(offset: f64) -> Result<Self, KinematicsError> {
        if !offset.is_finite() {
            return Err(KinematicsError::InvalidOffset("must be finite"));
        }
        if offset == 0.0 {
            return Err(KinematicsError::InvalidOffset("must be non-zero"));
        }
        Ok(OffCenterPoint { offset })
    }

    /// Returns the offset `b` in meters.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// World position of the reference point for the given pose.
    pub fn reference_point(&self, pose: &Pose) -> Point {
        Point::new(
            pose.x + self.offset * cos(pose.theta),
            pose.y + self.offset * sin(pose.theta),
        )
    }

    /// Map a planar velocity `(ux, uy)` of the reference point onto unicycle speeds.
    ///
    /// `v = cosθ·ux + sinθ·uy`, `ω = (−sinθ·ux + cosθ·uy) / b`. The result is not
    /// saturated; callers clamp it to their own limits.
    pub fn to_chassis_speeds(&self, theta: f64, ux: f64, uy: f64) -> ChassisSpeeds {
        let (s, c) = (sin(theta), cos(theta));
        ChassisSpeeds::new(c * ux + s * uy, (-s * ux + c * uy) / self.offset)
    }

    /// Planar velocity of the reference point produced by the given unicycle speeds.
    pub fn from_chassis_speeds(&self, theta: f64, speeds: ChassisSpeeds) -> (f64, f64) {
        let (s, c) = (sin(theta), cos(theta));
        let bw = self.offset * speeds.omega;
        (c * speeds.v - s * bw, s * speeds.v + c * bw)
    }
}
