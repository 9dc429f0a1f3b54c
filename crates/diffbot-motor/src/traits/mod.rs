//! Driver-agnostic motor and wheel interfaces.

pub mod motor;
pub mod wheel;
