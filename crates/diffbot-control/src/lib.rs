//! Motion control for a two-wheeled differential-drive robot.
//!
//! Encoder counts come in through [`diffbot_motor::EncoderSource`], get turned
//! into filtered wheel speeds by the [`WheelRegulator`], integrated into a pose
//! by the [`Localizer`], and drive the [`PoseController`] along a trapezoidal
//! [`Trajectory`] toward the goal. A [`PhaseMachine`] sequences approach,
//! final re-orientation and idle hold; a [`FusionGate`] filters external pose
//! and goal updates before they reach any of it.
//!
//! [`MotionCore`] owns all of the control state and is stepped with explicit
//! wheel speeds and `dt`, which makes it easy to drive from tests.
//! [`MotionLoop`] adds the clock, the wheel regulator and the nested periods.

pub mod clock;
pub mod controller;
pub mod error;
pub mod filter;
pub mod fusion;
pub mod localizer;
pub mod motion;
pub mod params;
pub mod phase;
pub mod pid;
pub mod runtime;
pub mod telemetry;
pub mod trajectory;
pub mod wheels;

pub use clock::{Clock, Instant, ManualClock, PeriodicGate};
pub use controller::PoseController;
pub use error::ControlError;
pub use filter::MovingAverage;
pub use fusion::{ExternalUpdate, FusionGate, GoalChange};
pub use localizer::Localizer;
pub use motion::{MotionCore, UpdateOutcome};
pub use params::{ControlParams, FusionParams, Params, RegulatorParams};
pub use phase::{ControlPhase, PhaseMachine, Tolerances};
pub use pid::{Pid, PidGains, PidMode};
pub use runtime::{LoopStats, MotionLoop};
pub use telemetry::{Telemetry, TelemetryThrottle};
pub use trajectory::{ProfileLimits, Progress, Trajectory};
pub use wheels::WheelRegulator;
