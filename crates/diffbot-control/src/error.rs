use core::fmt;

use diffbot_kinematics::KinematicsError;

/// Errors raised while building the control stack from [`crate::Params`].
///
/// Ticks themselves never fail; everything past construction is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// The robot geometry was rejected by the kinematics layer.
    Kinematics(KinematicsError),
    /// A gain, limit, tolerance or period is out of range.
    InvalidParam(&'static str),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::Kinematics(err) => write!(f, "invalid geometry: {err}"),
            ControlError::InvalidParam(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControlError::Kinematics(err) => Some(err),
            ControlError::InvalidParam(_) => None,
        }
    }
}

impl From<KinematicsError> for ControlError {
    fn from(err: KinematicsError) -> Self {
        ControlError::Kinematics(err)
    }
}
