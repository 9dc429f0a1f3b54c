//! Fixed-rate PID controller.
//!
//! Proportional on error, derivative on measurement (no kick when the setpoint
//! jumps), and conditional integration: the integral only accumulates while
//! the output is not pushed further into saturation. Gains are given per second
//! and scaled by the sample time once, at construction.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Proportional, integral and derivative gains.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        PidGains { kp, ki, kd }
    }

    pub fn validate(&self) -> Result<(), ControlError> {
        let all_finite = self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite();
        if !all_finite || self.kp < 0.0 || self.ki < 0.0 || self.kd < 0.0 {
            return Err(ControlError::InvalidParam("PID gains must be finite and non-negative"));
        }
        Ok(())
    }
}

/// Whether the controller computes an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidMode {
    /// Outputs zero and keeps no history.
    Manual,
    Automatic,
}

#[derive(Debug, Clone)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    out_min: f64,
    out_max: f64,
    mode: PidMode,
    integral: f64,
    last_measurement: Option<f64>,
    output: f64,
}

impl Pid {
    /// Creates an automatic controller with symmetric output limits `±limit`.
    pub fn new(gains: PidGains, sample_time_s: f64, limit: f64) -> Self {
        let limit = limit.abs();
        Pid {
            kp: gains.kp,
            ki: gains.ki * sample_time_s,
            kd: if sample_time_s > 0.0 { gains.kd / sample_time_s } else { 0.0 },
            out_min: -limit,
            out_max: limit,
            mode: PidMode::Automatic,
            integral: 0.0,
            last_measurement: None,
            output: 0.0,
        }
    }

    /// Clears the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_measurement = None;
        self.output = 0.0;
    }

    /// Switching from manual to automatic starts from a clean state.
    pub fn set_mode(&mut self, mode: PidMode) {
        if mode != self.mode {
            self.reset();
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> PidMode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.mode == PidMode::Automatic
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Output of the last [`Pid::step`].
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Runs one sample and returns the clamped output.
    pub fn step(&mut self, measurement: f64, setpoint: f64) -> f64 {
        if self.mode == PidMode::Manual {
            return 0.0;
        }

        let error = setpoint - measurement;
        let d_measurement = measurement - self.last_measurement.unwrap_or(measurement);
        self.last_measurement = Some(measurement);

        let p_term = self.kp * error;
        let d_term = -self.kd * d_measurement;
        let i_step = self.ki * error;

        let candidate = p_term + self.integral + i_step + d_term;
        let winding_up = (candidate > self.out_max && i_step > 0.0)
            || (candidate < self.out_min && i_step < 0.0);
        if !winding_up {
            self.integral = (self.integral + i_step).clamp(self.out_min, self.out_max);
        }

        self.output = (p_term + self.integral + d_term).clamp(self.out_min, self.out_max);
        self.output
    }
}
