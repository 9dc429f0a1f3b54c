//! Per-wheel velocity regulation.
//!
//! Every regulator period the encoder counters are differenced into an
//! instantaneous angular speed, smoothed by a moving average, and fed to a PI
//! loop whose voltage output goes to the motor driver.

use diffbot_motor::{EncoderSource, WheelDrive, WheelId};
use tracing::{debug, warn};

use crate::clock::{Instant, PeriodicGate};
use crate::filter::MovingAverage;
use crate::params::RegulatorParams;
use crate::pid::Pid;

#[derive(Debug, Clone)]
struct WheelState {
    last_ticks: i32,
    filter: MovingAverage,
    speed: f64,
    target: f64,
    pid: Pid,
    voltage: f64,
}

impl WheelState {
    fn new(ticks: i32, params: &RegulatorParams) -> Self {
        let sample_time = params.period().as_secs_f64();
        WheelState {
            last_ticks: ticks,
            filter: MovingAverage::new(params.window),
            speed: 0.0,
            target: 0.0,
            pid: Pid::new(params.gains, sample_time, params.max_voltage_v),
            voltage: 0.0,
        }
    }
}

/// Closes the speed loop of both wheels.
///
/// Owns the encoder source and the drive. The filtered speeds and last
/// voltages are only written here.
pub struct WheelRegulator<E, D> {
    encoders: E,
    drive: D,
    params: RegulatorParams,
    gate: PeriodicGate,
    wheels: [WheelState; 2],
    drive_faults: u64,
}

impl<E, D> WheelRegulator<E, D>
where
    E: EncoderSource,
    D: WheelDrive,
{
    /// Latches the current encoder counts as the first reference.
    pub fn new(mut encoders: E, drive: D, params: RegulatorParams, now: Instant) -> Self {
        let wheels = WheelId::ALL.map(|wheel| WheelState::new(encoders.ticks(wheel), &params));
        WheelRegulator {
            gate: PeriodicGate::new(params.period(), now),
            encoders,
            drive,
            params,
            wheels,
            drive_faults: 0,
        }
    }

    /// Sets the desired angular speed, clamped to the wheel's rated maximum.
    pub fn set_target_speed(&mut self, wheel: WheelId, omega: f64) {
        let max = self.params.max_wheel_speed_rads;
        let omega = if omega.is_nan() { 0.0 } else { omega.clamp(-max, max) };
        self.wheels[wheel.index()].target = omega;
    }

    pub fn target_speed(&self, wheel: WheelId) -> f64 {
        self.wheels[wheel.index()].target
    }

    /// Moving-average angular speed in rad/s.
    pub fn filtered_speed(&self, wheel: WheelId) -> f64 {
        self.wheels[wheel.index()].speed
    }

    /// Last voltage sent to the wheel's motor.
    pub fn voltage(&self, wheel: WheelId) -> f64 {
        self.wheels[wheel.index()].voltage
    }

    /// Number of `drive` calls the motor driver has refused.
    pub fn drive_faults(&self) -> u64 {
        self.drive_faults
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    /// Samples the encoders and drives the motors if a period has elapsed.
    ///
    /// Returns `true` when a sample was taken.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(elapsed) = self.gate.poll(now) else {
            return false;
        };
        let dt = elapsed.as_secs_f64();

        for wheel in WheelId::ALL {
            let ticks = self.encoders.ticks(wheel);
            let state = &mut self.wheels[wheel.index()];
            let delta = ticks.wrapping_sub(state.last_ticks);
            state.last_ticks = ticks;

            let raw = f64::from(delta) * self.params.resolution_rad_per_tick / dt;
            state.speed = state.filter.push(raw);
            state.voltage = state.pid.step(state.speed, state.target);

            if let Err(err) = self.drive.drive(wheel, state.voltage as f32) {
                self.drive_faults += 1;
                warn!(%wheel, ?err, "motor driver rejected voltage command");
            }
        }

        debug!(
            left = self.wheels[0].speed,
            right = self.wheels[1].speed,
            v_left = self.wheels[0].voltage,
            v_right = self.wheels[1].voltage,
            "wheel sample"
        );
        true
    }
}
