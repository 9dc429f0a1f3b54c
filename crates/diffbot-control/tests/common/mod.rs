#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use diffbot_control::{ControlPhase, Instant, MotionCore, Params};
use diffbot_kinematics::{Pose, WheelSpeeds};
use diffbot_motor::{EncoderSource, WheelDrive, WheelId};

pub const DT: f64 = 0.015;
pub const EPSILON: f64 = 1e-9;

/// A motion core whose wheels track their targets perfectly, one tick late.
pub struct IdealRig {
    pub core: MotionCore,
    pub wheels: WheelSpeeds,
    tick: u64,
}

impl IdealRig {
    pub fn new(pose: Pose) -> Self {
        IdealRig {
            core: MotionCore::new(&Params::default(), pose, Instant::ZERO).unwrap(),
            wheels: WheelSpeeds::ZERO,
            tick: 0,
        }
    }

    pub fn now(&self) -> Instant {
        Instant::from_micros(self.tick * 15_000)
    }

    /// Runs `ticks` control steps and returns the phase after each.
    pub fn run(&mut self, ticks: usize) -> Vec<ControlPhase> {
        let mut phases = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            self.tick += 1;
            self.wheels = self.core.control_step(self.wheels, DT, self.now());
            phases.push(self.core.phase());
        }
        phases
    }

    pub fn distance_to_goal(&self) -> f64 {
        self.core.pose().distance_to(&self.core.goal())
    }
}

/// Collapses runs of the same phase.
pub fn transitions(initial: ControlPhase, phases: &[ControlPhase]) -> Vec<ControlPhase> {
    let mut out = vec![initial];
    for &phase in phases {
        if out.last() != Some(&phase) {
            out.push(phase);
        }
    }
    out
}

/// Two first-order DC motors with quantized encoders.
pub struct Plant {
    speed: [f64; 2],
    angle: [f64; 2],
    voltage: [f64; 2],
    /// Steady-state rad/s per volt.
    gain: f64,
    /// Mechanical time constant in seconds.
    tau: f64,
    resolution: f64,
}

impl Plant {
    pub fn new(resolution: f64) -> Self {
        Plant {
            speed: [0.0; 2],
            angle: [0.0; 2],
            voltage: [0.0; 2],
            gain: 20.0 / 12.0,
            tau: 0.1,
            resolution,
        }
    }

    pub fn advance(&mut self, dt: f64) {
        let steps = 4;
        let h = dt / steps as f64;
        for wheel in 0..2 {
            for _ in 0..steps {
                self.speed[wheel] += h * (self.gain * self.voltage[wheel] - self.speed[wheel]) / self.tau;
                self.angle[wheel] += self.speed[wheel] * h;
            }
        }
    }

    pub fn speed(&self, wheel: WheelId) -> f64 {
        self.speed[wheel.index()]
    }
}

#[derive(Clone)]
pub struct PlantHandle(pub Rc<RefCell<Plant>>);

impl EncoderSource for PlantHandle {
    fn ticks(&mut self, wheel: WheelId) -> i32 {
        let plant = self.0.borrow();
        (plant.angle[wheel.index()] / plant.resolution).floor() as i32
    }
}

impl WheelDrive for PlantHandle {
    type Error = Infallible;

    fn drive(&mut self, wheel: WheelId, voltage: f32) -> Result<(), Self::Error> {
        self.0.borrow_mut().voltage[wheel.index()] = f64::from(voltage);
        Ok(())
    }
}
