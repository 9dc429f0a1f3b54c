//! Brushed DC motor behind a dual-input H-bridge (L298N style).

use core::fmt;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use crate::deadzone::DeadzoneMap;
use crate::traits::motor::{MotorControl, MotorState, SpeedControl, VoltageControl};

/// Errors raised by [`HBridgeMotor`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorError {
    /// A direction pin refused the new level.
    Pin(digital::ErrorKind),
    /// The PWM channel refused the new duty cycle.
    Pwm(pwm::ErrorKind),
    /// Speed or voltage was commanded while the motor is stopped.
    InvalidState,
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::Pin(kind) => write!(f, "direction pin error: {kind:?}"),
            MotorError::Pwm(kind) => write!(f, "pwm error: {kind:?}"),
            MotorError::InvalidState => write!(f, "motor is not started"),
        }
    }
}

impl core::error::Error for MotorError {}

/// A motor driven by two direction inputs and one PWM enable line.
///
/// `in_a` high with `in_b` low turns the wheel forward, the opposite levels
/// reverse it. Both low lets the motor coast.
pub struct HBridgeMotor<A, B, P> {
    in_a: A,
    in_b: B,
    pwm: P,
    deadzone: DeadzoneMap,
    enabled: bool,
    direction: bool,
    duty: u16,
    voltage: f32,
}

impl<A, B, P> HBridgeMotor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    /// Takes ownership of the pins and parks the bridge in coast.
    pub fn new(in_a: A, in_b: B, pwm: P, deadzone: DeadzoneMap) -> Result<Self, MotorError> {
        let mut motor = Self {
            in_a,
            in_b,
            pwm,
            deadzone,
            enabled: false,
            direction: true,
            duty: 0,
            voltage: 0.0,
        };
        motor.coast()?;
        Ok(motor)
    }

    /// Gives the pins back.
    pub fn release(self) -> (A, B, P) {
        (self.in_a, self.in_b, self.pwm)
    }

    fn coast(&mut self) -> Result<(), MotorError> {
        self.pwm.set_duty_cycle_fully_off().map_err(pwm_err)?;
        self.in_a.set_low().map_err(pin_err)?;
        self.in_b.set_low().map_err(pin_err)?;
        self.duty = 0;
        Ok(())
    }

    fn write_direction(&mut self, forward: bool) -> Result<(), MotorError> {
        if forward {
            self.in_b.set_low().map_err(pin_err)?;
            self.in_a.set_high().map_err(pin_err)?;
        } else {
            self.in_a.set_low().map_err(pin_err)?;
            self.in_b.set_high().map_err(pin_err)?;
        }
        Ok(())
    }
}

fn pin_err<E: digital::Error>(err: E) -> MotorError {
    MotorError::Pin(err.kind())
}

fn pwm_err<E: pwm::Error>(err: E) -> MotorError {
    MotorError::Pwm(err.kind())
}

impl<A, B, P> MotorControl for HBridgeMotor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    type Error = MotorError;
    type State = MotorState;

    fn start(&mut self) -> Result<(), Self::Error> {
        self.write_direction(self.direction)?;
        self.enabled = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.coast()?;
        self.enabled = false;
        self.voltage = 0.0;
        Ok(())
    }

    fn set_direction(&mut self, forward: bool) -> Result<(), Self::Error> {
        if self.enabled {
            self.write_direction(forward)?;
        }
        self.direction = forward;
        Ok(())
    }

    fn get_state(&self) -> Self::State {
        MotorState {
            enabled: self.enabled,
            direction: self.direction,
            duty_cycle: self.duty,
            max_duty_cycle: self.pwm.max_duty_cycle(),
            voltage: self.voltage,
        }
    }
}

impl<A, B, P> SpeedControl for HBridgeMotor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    fn set_speed(&mut self, duty_cycle: u16) -> Result<(), Self::Error> {
        if !self.enabled {
            return Err(MotorError::InvalidState);
        }
        let duty = duty_cycle.min(self.pwm.max_duty_cycle());
        self.pwm.set_duty_cycle(duty).map_err(pwm_err)?;
        self.duty = duty;
        Ok(())
    }

    fn set_speed_percent(&mut self, percent: u8) -> Result<(), Self::Error> {
        let max_duty = u32::from(self.pwm.max_duty_cycle());
        let duty = (u32::from(percent.min(100)) * max_duty) / 100;
        self.set_speed(duty as u16)
    }
}

impl<A, B, P> VoltageControl for HBridgeMotor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    fn set_voltage(&mut self, volts: f32) -> Result<(), Self::Error> {
        if !self.enabled {
            return Err(MotorError::InvalidState);
        }
        let volts = self.deadzone.saturate(volts);
        let (forward, duty) = self.deadzone.duty_for(volts, self.pwm.max_duty_cycle());
        if forward != self.direction {
            // Drop the duty before flipping so the bridge never shoots through.
            self.pwm.set_duty_cycle_fully_off().map_err(pwm_err)?;
            self.duty = 0;
            self.set_direction(forward)?;
        }
        self.set_speed(duty)?;
        self.voltage = volts;
        Ok(())
    }
}
