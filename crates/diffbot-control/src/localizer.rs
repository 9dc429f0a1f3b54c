use diffbot_kinematics::{DifferentialDrive, Pose, WheelSpeeds};

use crate::clock::Instant;

/// Dead-reckoning pose estimate.
///
/// Integrates the filtered wheel speeds with the exact-arc update of
/// [`DifferentialDrive::update_pose_from_wheel_speeds`]. The fusion gate may
/// overwrite the estimate through [`Localizer::correct`].
#[derive(Debug, Clone)]
pub struct Localizer {
    drive: DifferentialDrive,
    pose: Pose,
    stamp: Instant,
}

impl Localizer {
    pub fn new(drive: DifferentialDrive, initial: Pose, now: Instant) -> Self {
        Localizer { drive, pose: initial, stamp: now }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// When the estimate was last updated or corrected.
    pub fn stamp(&self) -> Instant {
        self.stamp
    }

    /// Advances the estimate by `dt` seconds at the given wheel speeds.
    pub fn update(&mut self, wheels: WheelSpeeds, dt: f64, now: Instant) -> Pose {
        self.pose = self.drive.update_pose_from_wheel_speeds(self.pose, wheels, dt);
        self.stamp = now;
        self.pose
    }

    /// Replaces the estimate with an external measurement.
    pub fn correct(&mut self, pose: Pose, now: Instant) {
        self.pose = pose;
        self.stamp = now;
    }
}
