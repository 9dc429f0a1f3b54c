//! Left/right motor pair exposed as a [`WheelDrive`].

use core::fmt::Debug;

use crate::traits::motor::{MotorState, VoltageControl};
use crate::traits::wheel::{WheelDrive, WheelId};

/// Routes `drive(wheel, voltage)` to one of two voltage-controlled motors.
pub struct DriveTrain<L, R> {
    left: L,
    right: R,
}

impl<L, R, E> DriveTrain<L, R>
where
    L: VoltageControl<Error = E, State = MotorState>,
    R: VoltageControl<Error = E, State = MotorState>,
    E: Debug,
{
    /// Starts both motors and wraps them.
    pub fn new(mut left: L, mut right: R) -> Result<Self, E> {
        left.start()?;
        right.start()?;
        Ok(Self { left, right })
    }

    /// Coasts both motors. Both are attempted even if the first fails.
    pub fn stop(&mut self) -> Result<(), E> {
        let left = self.left.stop();
        let right = self.right.stop();
        left.and(right)
    }

    /// Last commanded state of one motor.
    pub fn state(&self, wheel: WheelId) -> MotorState {
        match wheel {
            WheelId::Left => self.left.get_state(),
            WheelId::Right => self.right.get_state(),
        }
    }
}

impl<L, R, E> WheelDrive for DriveTrain<L, R>
where
    L: VoltageControl<Error = E, State = MotorState>,
    R: VoltageControl<Error = E, State = MotorState>,
    E: Debug,
{
    type Error = E;

    fn drive(&mut self, wheel: WheelId, voltage: f32) -> Result<(), Self::Error> {
        match wheel {
            WheelId::Left => self.left.set_voltage(voltage),
            WheelId::Right => self.right.set_voltage(voltage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::motor::{MotorControl, SpeedControl};

    #[derive(Default)]
    struct RecordingMotor {
        started: bool,
        volts: f32,
    }

    impl MotorControl for RecordingMotor {
        type Error = ();
        type State = MotorState;

        fn start(&mut self) -> Result<(), ()> {
            self.started = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ()> {
            self.started = false;
            self.volts = 0.0;
            Ok(())
        }

        fn set_direction(&mut self, _forward: bool) -> Result<(), ()> {
            Ok(())
        }

        fn get_state(&self) -> MotorState {
            MotorState {
                enabled: self.started,
                direction: self.volts >= 0.0,
                duty_cycle: 0,
                max_duty_cycle: 0,
                voltage: self.volts,
            }
        }
    }

    impl SpeedControl for RecordingMotor {
        fn set_speed(&mut self, _duty_cycle: u16) -> Result<(), ()> {
            Ok(())
        }

        fn set_speed_percent(&mut self, _percent: u8) -> Result<(), ()> {
            Ok(())
        }
    }

    impl VoltageControl for RecordingMotor {
        fn set_voltage(&mut self, volts: f32) -> Result<(), ()> {
            if !self.started {
                return Err(());
            }
            self.volts = volts;
            Ok(())
        }
    }

    #[test]
    fn routes_voltage_to_the_named_wheel() {
        let mut train = DriveTrain::new(RecordingMotor::default(), RecordingMotor::default()).unwrap();
        train.drive(WheelId::Left, 3.5).unwrap();
        train.drive(WheelId::Right, -1.25).unwrap();
        assert_eq!(train.state(WheelId::Left).voltage, 3.5);
        assert_eq!(train.state(WheelId::Right).voltage, -1.25);
    }

    #[test]
    fn stop_disables_both() {
        let mut train = DriveTrain::new(RecordingMotor::default(), RecordingMotor::default()).unwrap();
        train.drive(WheelId::Left, 2.0).unwrap();
        train.stop().unwrap();
        for wheel in WheelId::ALL {
            assert!(!train.state(wheel).enabled);
        }
        assert!(train.drive(WheelId::Right, 1.0).is_err());
    }
}
