//! Error types for the kinematics library.
//!
//! Only construction of the kinematic helpers can fail. Every update and
//! transform afterwards is a total function of its inputs.

use core::fmt;

/// Errors that can occur when building kinematic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KinematicsError {
    /// Error for invalid wheel radius.
    /// This variant is returned when a wheel radius is provided that is not positive.
    InvalidWheelRadius(&'static str),
    /// Error for invalid axle length.
    /// This variant is returned when the wheel separation is not positive.
    InvalidAxleLength(&'static str),
    /// Error for an invalid off-center distance.
    /// The offset is used as a divisor when decoupling, so it must be non-zero and finite.
    InvalidOffset(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidWheelRadius(msg) => write!(f, "Invalid wheel radius: {}", msg),
            KinematicsError::InvalidAxleLength(msg) => write!(f, "Invalid axle length: {}", msg),
            KinematicsError::InvalidOffset(msg) => write!(f, "Invalid off-center offset: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
