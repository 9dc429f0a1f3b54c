//! Simulated drivetrain for running without hardware.
//!
//! The H-bridge drivers are the real ones from `diffbot-motor`; only the pins
//! and PWM channels are fake. They write into a shared [`Plant`] which turns
//! pin levels and duty into an effective voltage through the same deadzone
//! map, integrates a first-order motor per wheel and counts encoder ticks.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use diffbot_motor::{DeadzoneMap, DriveTrain, EncoderSource, HBridgeMotor, MotorError, WheelId};
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use parking_lot::Mutex;

use crate::settings::SimSettings;

/// Integration step of the motor model.
const MAX_STEP: Duration = Duration::from_micros(250);

#[derive(Debug, Clone, Copy, Default)]
struct Wheel {
    in_a: bool,
    in_b: bool,
    duty: u16,
    speed: f64,
    angle: f64,
}

/// Two DC motors: `dω/dt = (K·V_eff − ω) / τ`.
#[derive(Debug, Clone)]
pub struct Plant {
    wheels: [Wheel; 2],
    gain: f64,
    tau: f64,
    resolution: f64,
    max_duty: u16,
    deadzone: DeadzoneMap,
}

pub type SharedPlant = Arc<Mutex<Plant>>;

impl Plant {
    pub fn new(settings: &SimSettings, resolution: f64, deadzone: DeadzoneMap) -> Self {
        Plant {
            wheels: [Wheel::default(); 2],
            gain: settings.motor_gain_rads_per_v,
            tau: settings.time_constant_s,
            resolution,
            max_duty: settings.max_duty,
            deadzone,
        }
    }

    pub fn shared(self) -> SharedPlant {
        Arc::new(Mutex::new(self))
    }

    /// Voltage the motor actually sees. Both pins low or both high brakes to zero.
    pub fn effective_voltage(&self, wheel: WheelId) -> f64 {
        let w = &self.wheels[wheel.index()];
        let forward = match (w.in_a, w.in_b) {
            (true, false) => true,
            (false, true) => false,
            _ => return 0.0,
        };
        f64::from(self.deadzone.effective_voltage(forward, w.duty, self.max_duty))
    }

    pub fn speed(&self, wheel: WheelId) -> f64 {
        self.wheels[wheel.index()].speed
    }

    /// Encoder count, wrapping like a hardware counter.
    pub fn ticks(&self, wheel: WheelId) -> i32 {
        let count = (self.wheels[wheel.index()].angle / self.resolution).floor() as i64;
        count as i32
    }

    pub fn advance(&mut self, dt: Duration) {
        let mut remaining = dt;
        while !remaining.is_zero() {
            let step = remaining.min(MAX_STEP);
            remaining -= step;
            let h = step.as_secs_f64();
            for wheel in WheelId::ALL {
                let volts = self.effective_voltage(wheel);
                let w = &mut self.wheels[wheel.index()];
                w.speed += h * (self.gain * volts - w.speed) / self.tau;
                w.angle += h * w.speed;
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PinRole {
    A,
    B,
}

/// One H-bridge direction input.
pub struct SimPin {
    plant: SharedPlant,
    wheel: WheelId,
    role: PinRole,
}

impl SimPin {
    fn write(&mut self, level: bool) {
        let mut plant = self.plant.lock();
        let w = &mut plant.wheels[self.wheel.index()];
        match self.role {
            PinRole::A => w.in_a = level,
            PinRole::B => w.in_b = level,
        }
    }
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

/// One PWM channel driving a wheel's enable input.
pub struct SimPwm {
    plant: SharedPlant,
    wheel: WheelId,
}

impl pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.plant.lock().max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let mut plant = self.plant.lock();
        let max = plant.max_duty;
        plant.wheels[self.wheel.index()].duty = duty.min(max);
        Ok(())
    }
}

/// Reads the plant's encoder counts.
pub struct SimEncoders {
    plant: SharedPlant,
}

impl SimEncoders {
    pub fn new(plant: &SharedPlant) -> Self {
        SimEncoders { plant: plant.clone() }
    }
}

impl EncoderSource for SimEncoders {
    fn ticks(&mut self, wheel: WheelId) -> i32 {
        self.plant.lock().ticks(wheel)
    }
}

pub type SimMotor = HBridgeMotor<SimPin, SimPin, SimPwm>;

fn motor(plant: &SharedPlant, wheel: WheelId, deadzone: DeadzoneMap) -> Result<SimMotor, MotorError> {
    let pin = |role| SimPin { plant: plant.clone(), wheel, role };
    HBridgeMotor::new(
        pin(PinRole::A),
        pin(PinRole::B),
        SimPwm { plant: plant.clone(), wheel },
        deadzone,
    )
}

/// Both H-bridges wired to the plant and started.
pub fn drivetrain(
    plant: &SharedPlant,
    deadzone: DeadzoneMap,
) -> Result<DriveTrain<SimMotor, SimMotor>, MotorError> {
    let left = motor(plant, WheelId::Left, deadzone)?;
    let right = motor(plant, WheelId::Right, deadzone)?;
    DriveTrain::new(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffbot_motor::WheelDrive;

    fn rig() -> (SharedPlant, DriveTrain<SimMotor, SimMotor>) {
        let deadzone = DeadzoneMap::default();
        let plant = Plant::new(&SimSettings::default(), 0.0057, deadzone).shared();
        let drive = drivetrain(&plant, deadzone).unwrap();
        (plant, drive)
    }

    #[test]
    fn voltage_survives_the_deadzone_round_trip() {
        let (plant, mut drive) = rig();
        drive.drive(WheelId::Left, 6.0).unwrap();
        drive.drive(WheelId::Right, -3.0).unwrap();
        let plant = plant.lock();
        assert!((plant.effective_voltage(WheelId::Left) - 6.0).abs() < 0.1);
        assert!((plant.effective_voltage(WheelId::Right) + 3.0).abs() < 0.1);
    }

    #[test]
    fn coasting_motor_feels_nothing() {
        let (plant, mut drive) = rig();
        drive.drive(WheelId::Left, 0.0).unwrap();
        assert_eq!(plant.lock().effective_voltage(WheelId::Left), 0.0);
        drive.stop().unwrap();
        assert_eq!(plant.lock().effective_voltage(WheelId::Right), 0.0);
    }

    #[test]
    fn wheels_settle_at_gain_times_voltage() {
        let (plant, mut drive) = rig();
        drive.drive(WheelId::Left, 6.0).unwrap();
        drive.drive(WheelId::Right, -6.0).unwrap();
        let mut encoders = SimEncoders::new(&plant);
        plant.lock().advance(Duration::from_secs(1));

        let expected = 6.0 * SimSettings::default().motor_gain_rads_per_v;
        let p = plant.lock();
        assert!((p.speed(WheelId::Left) - expected).abs() < 0.2);
        assert!((p.speed(WheelId::Right) + expected).abs() < 0.2);
        drop(p);
        assert!(encoders.ticks(WheelId::Left) > 1_000);
        assert!(encoders.ticks(WheelId::Right) < -1_000);
    }

    #[test]
    fn motion_loop_drives_the_plant_toward_a_goal() {
        use diffbot_control::{ControlPhase, ExternalUpdate, Instant, ManualClock, MotionLoop, Params};
        use diffbot_kinematics::Pose;

        let (plant, drive) = rig();
        let mut params = Params::default();
        params.regulator.window = 20;
        let clock = ManualClock::new(Instant::ZERO);
        let mut motion =
            MotionLoop::new(SimEncoders::new(&plant), drive, &clock, &params, Pose::default()).unwrap();
        motion.apply(ExternalUpdate { robot: None, target: Some(Pose::new(0.5, 0.0, 0.0)) });

        for _ in 0..3_000 {
            plant.lock().advance(Duration::from_millis(1));
            clock.advance(Duration::from_millis(1));
            motion.poll();
        }

        let pose = motion.core().pose();
        assert_eq!(motion.core().phase(), ControlPhase::Position);
        assert!(pose.x > 0.1, "barely moved: {pose}");
        assert!(pose.y.abs() < 0.02);
    }
}
