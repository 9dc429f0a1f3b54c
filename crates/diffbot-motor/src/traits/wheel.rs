//! Per-wheel interfaces consumed by the velocity regulator.

use core::fmt;

/// One of the two drive wheels.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelId {
    /// Left wheel, looking along the robot's heading.
    Left,
    /// Right wheel, looking along the robot's heading.
    Right,
}

impl WheelId {
    /// Both wheels, left first.
    pub const ALL: [WheelId; 2] = [WheelId::Left, WheelId::Right];

    /// Stable array index for per-wheel storage.
    pub const fn index(self) -> usize {
        match self {
            WheelId::Left => 0,
            WheelId::Right => 1,
        }
    }
}

impl fmt::Display for WheelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WheelId::Left => write!(f, "left"),
            WheelId::Right => write!(f, "right"),
        }
    }
}

/// Voltage actuation for both wheels: `drive(wheel_id, voltage)`.
pub trait WheelDrive {
    /// Error raised by the motor driver.
    type Error: fmt::Debug;

    /// Apply a signed voltage to one wheel's motor.
    fn drive(&mut self, wheel: WheelId, voltage: f32) -> Result<(), Self::Error>;
}

/// Raw encoder tick counters.
///
/// Counters are free-running signed integers. Consumers difference successive
/// readings with wrapping subtraction, so overflow is harmless as long as fewer
/// than `i32::MAX` ticks pass between two reads.
pub trait EncoderSource {
    /// Current tick count of the given wheel's encoder.
    fn ticks(&mut self, wheel: WheelId) -> i32;
}
