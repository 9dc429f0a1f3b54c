//! Voltage to duty-cycle mapping with motor deadzone compensation.
//!
//! Small DC gearmotors do not turn until the duty cycle crosses a start
//! threshold. The map stretches the commanded voltage range `(0, max_voltage]`
//! over `[start_ratio, 1]` of the PWM range so the regulator sees a roughly
//! linear plant from the first millivolt.

use libm::{fabsf, roundf};

/// Default supply voltage seen by the H-bridge.
pub const DEFAULT_MAX_VOLTAGE: f32 = 12.0;
/// Default start duty as a fraction of full scale (78 of 255 on an 8-bit timer).
pub const DEFAULT_START_RATIO: f32 = 78.0 / 255.0;

/// Linear deadzone compensation between volts and duty cycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadzoneMap {
    /// Voltage that maps onto full duty.
    pub max_voltage: f32,
    /// Fraction of full duty at which the motor starts to turn.
    pub start_ratio: f32,
}

impl Default for DeadzoneMap {
    fn default() -> Self {
        Self {
            max_voltage: DEFAULT_MAX_VOLTAGE,
            start_ratio: DEFAULT_START_RATIO,
        }
    }
}

impl DeadzoneMap {
    /// Creates a map, clamping `start_ratio` into `[0, 1)`.
    pub fn new(max_voltage: f32, start_ratio: f32) -> Self {
        Self {
            max_voltage: fabsf(max_voltage),
            start_ratio: start_ratio.clamp(0.0, 0.999),
        }
    }

    /// Clamps a voltage command to the supply range.
    pub fn saturate(&self, volts: f32) -> f32 {
        if volts.is_nan() {
            return 0.0;
        }
        volts.clamp(-self.max_voltage, self.max_voltage)
    }

    /// Converts a signed voltage into `(forward, duty)` for a timer whose full
    /// scale is `max_duty`.
    ///
    /// Zero volts yields zero duty. Any other magnitude lands in
    /// `[start_ratio * max_duty, max_duty]`.
    pub fn duty_for(&self, volts: f32, max_duty: u16) -> (bool, u16) {
        let volts = self.saturate(volts);
        let forward = volts >= 0.0;
        if volts == 0.0 || self.max_voltage == 0.0 {
            return (forward, 0);
        }

        let level = fabsf(volts) / self.max_voltage;
        let fraction = self.start_ratio + (1.0 - self.start_ratio) * level;
        let duty = roundf(fraction * f32::from(max_duty));
        (forward, (duty as u16).min(max_duty))
    }

    /// Voltage that makes it past the deadzone for a given duty and direction.
    ///
    /// This is the inverse of [`DeadzoneMap::duty_for`] up to duty quantization,
    /// and models what the motor actually feels: duties below the start
    /// threshold produce nothing.
    pub fn effective_voltage(&self, forward: bool, duty: u16, max_duty: u16) -> f32 {
        if max_duty == 0 {
            return 0.0;
        }
        let fraction = f32::from(duty.min(max_duty)) / f32::from(max_duty);
        if fraction <= self.start_ratio {
            return 0.0;
        }
        let level = (fraction - self.start_ratio) / (1.0 - self.start_ratio);
        let volts = level * self.max_voltage;
        if forward { volts } else { -volts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_DUTY: u16 = 255;

    #[test]
    fn zero_volts_gives_zero_duty() {
        let map = DeadzoneMap::default();
        assert_eq!(map.duty_for(0.0, MAX_DUTY), (true, 0));
        assert_eq!(map.duty_for(-0.0, MAX_DUTY).1, 0);
    }

    #[test]
    fn smallest_command_jumps_to_start_duty() {
        let map = DeadzoneMap::default();
        let (forward, duty) = map.duty_for(0.001, MAX_DUTY);
        assert!(forward);
        assert_eq!(duty, 78);
    }

    #[test]
    fn full_voltage_gives_full_duty_and_saturates() {
        let map = DeadzoneMap::default();
        assert_eq!(map.duty_for(12.0, MAX_DUTY), (true, MAX_DUTY));
        assert_eq!(map.duty_for(40.0, MAX_DUTY), (true, MAX_DUTY));
        assert_eq!(map.duty_for(-40.0, MAX_DUTY), (false, MAX_DUTY));
    }

    #[test]
    fn sign_selects_direction() {
        let map = DeadzoneMap::default();
        let (fwd, duty_f) = map.duty_for(6.0, MAX_DUTY);
        let (rev, duty_r) = map.duty_for(-6.0, MAX_DUTY);
        assert!(fwd);
        assert!(!rev);
        assert_eq!(duty_f, duty_r);
    }

    #[test]
    fn nan_is_treated_as_stop() {
        let map = DeadzoneMap::default();
        assert_eq!(map.duty_for(f32::NAN, MAX_DUTY).1, 0);
    }

    #[test]
    fn effective_voltage_inverts_mapping() {
        let map = DeadzoneMap::default();
        for volts in [-11.0_f32, -3.0, 0.5, 4.0, 9.5] {
            let (forward, duty) = map.duty_for(volts, 10_000);
            let back = map.effective_voltage(forward, duty, 10_000);
            assert!((back - volts).abs() < 0.01, "{volts} -> {back}");
        }
    }

    #[test]
    fn duty_below_start_does_nothing() {
        let map = DeadzoneMap::default();
        assert_eq!(map.effective_voltage(true, 50, MAX_DUTY), 0.0);
        assert_eq!(map.effective_voltage(false, 0, MAX_DUTY), 0.0);
    }
}
