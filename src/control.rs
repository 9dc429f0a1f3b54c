//! The control thread: owns the motion loop and the simulated drivetrain.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use diffbot_control::{Clock, ExternalUpdate, MotionLoop, Telemetry};
use diffbot_kinematics::Pose;
use diffbot_motor::{DeadzoneMap, EncoderSource, WheelDrive};
use spin_sleep::SpinSleeper;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{info, warn};

use crate::blackboard::{Blackboard, raise_fault, record_frame, record_update};
use crate::bus::Topic;
use crate::clock::StdClock;
use crate::settings::Settings;
use crate::sim::{self, Plant, SharedPlant};

/// Spin accuracy handed to `SpinSleeper`, in nanoseconds.
const SPIN_ACCURACY_NS: u32 = 100_000;

pub fn spawn(
    settings: Settings,
    updates: mpsc::Receiver<ExternalUpdate>,
    telemetry: Topic<Telemetry>,
    bb: Blackboard,
) -> anyhow::Result<JoinHandle<()>> {
    let robot = &settings.robot;
    let deadzone = DeadzoneMap::new(robot.regulator.max_voltage_v as f32, settings.sim.start_ratio);
    let plant = Plant::new(&settings.sim, robot.regulator.resolution_rad_per_tick, deadzone).shared();
    let drive = sim::drivetrain(&plant, deadzone).context("wiring simulated drivetrain")?;
    let motion = MotionLoop::new(
        sim::SimEncoders::new(&plant),
        drive,
        StdClock::new(),
        robot,
        Pose::default(),
    )
    .context("building motion loop")?;
    let period = Duration::from_micros(settings.sim.poll_period_us.max(1));

    let handle = thread::Builder::new().name("control".into()).spawn(move || {
        info!(?period, "Control thread started.");
        run(motion, plant, updates, telemetry, bb, period);
        info!("Control thread stopped.");
    })?;
    Ok(handle)
}

fn run<E, D>(
    mut motion: MotionLoop<E, D, StdClock>,
    plant: SharedPlant,
    mut updates: mpsc::Receiver<ExternalUpdate>,
    telemetry: Topic<Telemetry>,
    bb: Blackboard,
    period: Duration,
) where
    E: EncoderSource,
    D: WheelDrive,
{
    let sleeper = SpinSleeper::new(SPIN_ACCURACY_NS);
    let mut last = motion.clock().now();
    let mut faults = 0;

    loop {
        // Commit every pending update before this tick reads pose or goal.
        loop {
            match updates.try_recv() {
                Ok(update) => record_update(&bb, motion.apply(update)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        let now = motion.clock().now();
        plant.lock().advance(now.saturating_duration_since(last));
        last = now;

        if let Some(frame) = motion.poll() {
            record_frame(&bb, &frame);
            telemetry.publish(frame);
        }

        let drive_faults = motion.regulator().drive_faults();
        if drive_faults > faults {
            faults = drive_faults;
            warn!(drive_faults, "wheel drive rejected a command");
            raise_fault(&bb, "wheel drive fault");
        }

        sleeper.sleep(period);
    }
}
