//! Concrete drivers built on embedded-hal pins.

pub mod drivetrain;
pub mod motor;
