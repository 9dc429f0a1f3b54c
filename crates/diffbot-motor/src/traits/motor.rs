/// Represents the state of a single motor driver.
///
/// This structure is a snapshot of what was last commanded to the driver,
/// which lets tests and telemetry inspect the actuation layer without
/// touching the hardware.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorState {
    /// Whether the motor is enabled and receiving power.
    pub enabled: bool,
    /// The current direction of the motor rotation.
    /// - `true` represents forward rotation
    /// - `false` represents reverse rotation
    pub direction: bool,
    /// The current duty cycle of the motor.
    pub duty_cycle: u16,
    /// Maximum possible duty cycle value.
    /// This is hardware specific and helps interpret the duty_cycle field.
    pub max_duty_cycle: u16,
    /// The last voltage requested through [`VoltageControl::set_voltage`].
    pub voltage: f32,
}

/// Core trait defining the interface for motor control
pub trait MotorControl {
    /// Error raised by the underlying pins or timers.
    type Error;
    /// Snapshot type returned by [`MotorControl::get_state`].
    type State;

    /// Start the motor
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Stop the motor
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Set the motor direction
    /// - true for forward
    /// - false for reverse
    fn set_direction(&mut self, forward: bool) -> Result<(), Self::Error>;

    /// Get the current state of the motor
    fn get_state(&self) -> Self::State;
}

/// Extended trait for motors that support speed control
pub trait SpeedControl: MotorControl {
    /// Set the motor speed using duty cycle
    fn set_speed(&mut self, duty_cycle: u16) -> Result<(), Self::Error>;

    /// Set the motor speed as a percentage (0-100)
    fn set_speed_percent(&mut self, percent: u8) -> Result<(), Self::Error>;
}

/// Motors that accept a signed voltage command.
///
/// The sign selects the direction and the magnitude is converted into a duty
/// cycle, including whatever deadzone compensation the driver applies.
pub trait VoltageControl: SpeedControl {
    /// Drive the motor with `volts`, saturated to the driver's supply range.
    fn set_voltage(&mut self, volts: f32) -> Result<(), Self::Error>;
}
