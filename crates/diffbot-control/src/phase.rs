//! Sequencing of position approach, final re-orientation and idle hold.

use core::fmt;

use diffbot_kinematics::Pose;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The active stage of a move.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControlPhase {
    /// Wheels held at zero, both controllers disabled.
    #[default]
    Idle,
    /// One tick: reset position loops and restart the trajectory.
    InitPosition,
    /// Following the trajectory toward the goal position.
    Position,
    /// One tick: reset the heading loop.
    InitOrientFinal,
    /// Turning in place toward the goal heading.
    OrientFinal,
}

impl ControlPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            ControlPhase::Idle => "idle",
            ControlPhase::InitPosition => "init_position",
            ControlPhase::Position => "position",
            ControlPhase::InitOrientFinal => "init_orient_final",
            ControlPhase::OrientFinal => "orient_final",
        }
    }

    /// Numeric code for plotting.
    pub const fn code(self) -> u8 {
        match self {
            ControlPhase::Idle => 0,
            ControlPhase::InitPosition => 1,
            ControlPhase::Position => 2,
            ControlPhase::InitOrientFinal => 3,
            ControlPhase::OrientFinal => 4,
        }
    }
}

impl fmt::Display for ControlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a move counts as arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub position: f64,
    pub orientation: f64,
}

/// Edge-triggered phase transitions, evaluated once per control tick.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: ControlPhase,
    tolerances: Tolerances,
    forced: bool,
}

impl PhaseMachine {
    pub fn new(tolerances: Tolerances) -> Self {
        PhaseMachine { phase: ControlPhase::Idle, tolerances, forced: false }
    }

    pub fn phase(&self) -> ControlPhase {
        self.phase
    }

    pub fn tolerances(&self) -> Tolerances {
        self.tolerances
    }

    /// Jumps straight to `phase`. The next [`PhaseMachine::advance`] runs it
    /// as-is instead of evaluating a transition out of it.
    pub fn force(&mut self, phase: ControlPhase) {
        self.phase = phase;
        self.forced = true;
    }

    /// Picks the phase to run this tick from the current pose and goal.
    ///
    /// Returns the previous phase when a transition happened.
    pub fn advance(&mut self, pose: &Pose, goal: &Pose) -> Option<ControlPhase> {
        if self.forced {
            self.forced = false;
            return None;
        }

        let distance = pose.distance_to(goal);
        let heading_error = pose.heading_error_to(goal).abs();
        let Tolerances { position, orientation } = self.tolerances;

        let next = match self.phase {
            ControlPhase::Idle if distance > position => ControlPhase::InitPosition,
            ControlPhase::Idle if heading_error > orientation => ControlPhase::InitOrientFinal,
            ControlPhase::Idle => ControlPhase::Idle,
            ControlPhase::InitPosition => ControlPhase::Position,
            ControlPhase::Position if distance <= position => ControlPhase::InitOrientFinal,
            ControlPhase::Position => ControlPhase::Position,
            ControlPhase::InitOrientFinal => ControlPhase::OrientFinal,
            ControlPhase::OrientFinal if heading_error <= orientation => ControlPhase::Idle,
            ControlPhase::OrientFinal => ControlPhase::OrientFinal,
        };

        if next == self.phase {
            return None;
        }
        let previous = self.phase;
        self.phase = next;
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Tolerances = Tolerances { position: 0.035, orientation: 0.035 };

    fn run(machine: &mut PhaseMachine, pose: Pose, goal: Pose) -> ControlPhase {
        machine.advance(&pose, &goal);
        machine.phase()
    }

    #[test]
    fn idle_stays_idle_at_goal() {
        let mut m = PhaseMachine::new(TOL);
        let here = Pose::new(1.0, 1.0, 0.5);
        assert_eq!(run(&mut m, here, Pose::new(1.01, 1.0, 0.52)), ControlPhase::Idle);
    }

    #[test]
    fn full_cycle() {
        let mut m = PhaseMachine::new(TOL);
        let start = Pose::default();
        let goal = Pose::new(0.5, 0.0, 1.0);

        assert_eq!(run(&mut m, start, goal), ControlPhase::InitPosition);
        assert_eq!(run(&mut m, start, goal), ControlPhase::Position);
        assert_eq!(run(&mut m, Pose::new(0.3, 0.0, 0.0), goal), ControlPhase::Position);
        assert_eq!(run(&mut m, Pose::new(0.48, 0.0, 0.0), goal), ControlPhase::InitOrientFinal);
        assert_eq!(run(&mut m, Pose::new(0.48, 0.0, 0.0), goal), ControlPhase::OrientFinal);
        assert_eq!(run(&mut m, Pose::new(0.48, 0.0, 0.5), goal), ControlPhase::OrientFinal);
        assert_eq!(run(&mut m, Pose::new(0.48, 0.0, 0.99), goal), ControlPhase::Idle);
        assert_eq!(run(&mut m, Pose::new(0.48, 0.0, 0.99), goal), ControlPhase::Idle);
    }

    #[test]
    fn idle_with_heading_error_only_reorients() {
        let mut m = PhaseMachine::new(TOL);
        let pose = Pose::default();
        let goal = Pose::new(0.0, 0.0, -0.4);
        assert_eq!(run(&mut m, pose, goal), ControlPhase::InitOrientFinal);
        assert_eq!(run(&mut m, pose, goal), ControlPhase::OrientFinal);
    }

    #[test]
    fn heading_check_wraps() {
        let mut m = PhaseMachine::new(TOL);
        let pose = Pose::new(0.0, 0.0, 4.0 * core::f64::consts::PI + 0.01);
        assert_eq!(run(&mut m, pose, Pose::default()), ControlPhase::Idle);
    }

    #[test]
    fn transition_reports_previous_phase() {
        let mut m = PhaseMachine::new(TOL);
        let goal = Pose::new(1.0, 0.0, 0.0);
        assert_eq!(m.advance(&Pose::default(), &goal), Some(ControlPhase::Idle));
        assert_eq!(m.advance(&Pose::default(), &goal), Some(ControlPhase::InitPosition));
        assert_eq!(m.advance(&Pose::default(), &goal), None);
    }

    #[test]
    fn forced_phase_runs_once_before_transitioning() {
        let mut m = PhaseMachine::new(TOL);
        m.force(ControlPhase::InitPosition);
        let goal = Pose::new(1.0, 0.0, 0.0);
        assert_eq!(m.advance(&Pose::default(), &goal), None);
        assert_eq!(m.phase(), ControlPhase::InitPosition);
        assert_eq!(run(&mut m, Pose::default(), goal), ControlPhase::Position);
    }

    #[test]
    fn display_names() {
        assert_eq!(ControlPhase::InitOrientFinal.to_string(), "init_orient_final");
        assert_eq!(ControlPhase::default(), ControlPhase::Idle);
        assert_eq!(ControlPhase::OrientFinal.code(), 4);
    }
}
