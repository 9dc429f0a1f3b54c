#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
//! Actuation boundary of the diffbot drivetrain.
//!
//! The control stack talks to hardware through two narrow interfaces defined in
//! [`traits::wheel`]: [`WheelDrive`] takes a signed voltage per wheel and
//! [`EncoderSource`] hands back raw tick counters. [`devices`] implements the
//! drive side for a pair of H-bridge motors on embedded-hal pins, with the
//! motor deadzone compensated by [`deadzone::DeadzoneMap`].

pub mod deadzone;
pub mod devices;
pub mod traits;

pub use deadzone::DeadzoneMap;
pub use devices::drivetrain::DriveTrain;
pub use devices::motor::{HBridgeMotor, MotorError};
pub use traits::motor::{MotorControl, MotorState, SpeedControl, VoltageControl};
pub use traits::wheel::{EncoderSource, WheelDrive, WheelId};
