//! The owned control context: localizer, trajectory, controller, phase
//! machine and fusion gate, stepped together once per control period.

use diffbot_kinematics::{Pose, WheelSpeeds};
use tracing::{debug, info};

use crate::clock::Instant;
use crate::controller::PoseController;
use crate::error::ControlError;
use crate::fusion::{ExternalUpdate, FusionGate, GoalChange};
use crate::localizer::Localizer;
use crate::params::Params;
use crate::phase::{ControlPhase, PhaseMachine, Tolerances};
use crate::trajectory::{ProfileLimits, Trajectory};

/// What happened to an [`ExternalUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub pose_accepted: bool,
    pub goal_change: Option<GoalChange>,
}

/// Every piece of mutable control state, with a single writer per field.
///
/// Nothing here reads a clock or touches hardware: the caller passes in the
/// measured wheel speeds and the elapsed time and gets wheel targets back.
pub struct MotionCore {
    localizer: Localizer,
    trajectory: Trajectory,
    controller: PoseController,
    phases: PhaseMachine,
    fusion: FusionGate,
    targets: WheelSpeeds,
    max_wheel_speed: f64,
}

impl MotionCore {
    /// Starts idle, with the goal equal to `initial_pose`.
    pub fn new(params: &Params, initial_pose: Pose, now: Instant) -> Result<Self, ControlError> {
        params.validate()?;
        let control = &params.control;
        let limits = ProfileLimits { v_max: control.v_max_mps, a_max: control.a_max_mps2 };
        let tolerances = Tolerances {
            position: control.position_tolerance_m,
            orientation: control.orientation_tolerance_rad,
        };
        Ok(MotionCore {
            localizer: Localizer::new(params.drive()?, initial_pose, now),
            trajectory: Trajectory::new(initial_pose, initial_pose, limits),
            controller: PoseController::new(params)?,
            phases: PhaseMachine::new(tolerances),
            fusion: FusionGate::new(params.fusion, initial_pose),
            targets: WheelSpeeds::ZERO,
            max_wheel_speed: params.regulator.max_wheel_speed_rads,
        })
    }

    pub fn pose(&self) -> Pose {
        self.localizer.pose()
    }

    pub fn goal(&self) -> Pose {
        self.fusion.goal()
    }

    pub fn phase(&self) -> ControlPhase {
        self.phases.phase()
    }

    /// Wheel targets produced by the last control step.
    pub fn targets(&self) -> WheelSpeeds {
        self.targets
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn controller(&self) -> &PoseController {
        &self.controller
    }

    pub fn fusion(&self) -> &FusionGate {
        &self.fusion
    }

    /// One control period: localize, pick the phase, run it.
    ///
    /// `wheels` are the filtered wheel speeds and `dt` the seconds elapsed
    /// since the previous step.
    pub fn control_step(&mut self, wheels: WheelSpeeds, dt: f64, now: Instant) -> WheelSpeeds {
        let pose = self.localizer.update(wheels, dt, now);
        let goal = self.fusion.goal();

        if let Some(previous) = self.phases.advance(&pose, &goal) {
            info!(from = %previous, to = %self.phases.phase(), %pose, "phase transition");
        }

        let targets = match self.phases.phase() {
            ControlPhase::Idle => {
                self.controller.enable_position(false);
                self.controller.enable_orientation(false);
                self.controller.hold()
            }
            ControlPhase::InitPosition => {
                self.controller.reset_position();
                self.plan(&pose, goal);
                self.controller.enable_orientation(false);
                self.controller.enable_position(true);
                debug!(
                    length = self.trajectory.length(),
                    duration = self.trajectory.duration(),
                    "trajectory started"
                );
                self.controller.hold()
            }
            ControlPhase::Position => {
                self.trajectory.advance(dt);
                self.controller.compute_position_step(&pose, &self.trajectory)
            }
            ControlPhase::InitOrientFinal => {
                self.controller.reset_orientation();
                self.controller.enable_position(false);
                self.controller.enable_orientation(true);
                self.controller.hold()
            }
            ControlPhase::OrientFinal => self.controller.compute_orientation_step(&pose, goal.theta),
        };

        self.targets = targets.saturate(self.max_wheel_speed);
        debug!(
            x = pose.x,
            y = pose.y,
            theta = pose.theta,
            phase = self.phases.phase().as_str(),
            s = self.trajectory.progress().s,
            omega_l = self.targets.omega_l,
            omega_r = self.targets.omega_r,
            "control step"
        );
        self.targets
    }

    /// Lays the path from the controlled point, not the axle center, so the
    /// position loops see zero error on the first tick.
    fn plan(&mut self, pose: &Pose, goal: Pose) {
        let start = self.controller.reference_point(pose);
        self.trajectory.restart(Pose::new(start.x, start.y, pose.theta), goal);
    }

    /// Applies a pose correction if it clears the fusion deadband.
    pub fn offer_pose(&mut self, candidate: Pose, now: Instant) -> bool {
        let current = self.localizer.pose();
        if !self.fusion.admit_pose(&current, &candidate) {
            debug!(%candidate, %current, "pose correction inside deadband");
            return false;
        }
        self.localizer.correct(candidate, now);
        info!(from = %current, to = %candidate, "pose corrected");
        true
    }

    /// Commits a new goal if it clears the fusion deadband and re-plans.
    pub fn offer_goal(&mut self, candidate: Pose) -> Option<GoalChange> {
        let change = self.fusion.offer_goal(candidate);
        match change {
            Some(GoalChange::Position) => {
                let (pose, goal) = (self.localizer.pose(), self.fusion.goal());
                self.plan(&pose, goal);
                self.phases.force(ControlPhase::InitPosition);
                info!(%goal, "new goal");
            }
            Some(GoalChange::Heading) => {
                let phase = self.phases.phase();
                if !matches!(phase, ControlPhase::InitPosition | ControlPhase::Position) {
                    self.phases.force(ControlPhase::InitOrientFinal);
                }
                info!(theta = self.fusion.goal().theta, %phase, "new goal heading");
            }
            None => debug!(%candidate, "goal inside deadband"),
        }
        change
    }

    /// Commits both halves of an inbound message, pose first.
    pub fn apply(&mut self, update: ExternalUpdate, now: Instant) -> UpdateOutcome {
        let pose_accepted = match update.robot {
            Some(pose) => self.offer_pose(pose, now),
            None => false,
        };
        let goal_change = update.target.and_then(|goal| self.offer_goal(goal));
        UpdateOutcome { pose_accepted, goal_change }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.015;

    fn core() -> MotionCore {
        MotionCore::new(&Params::default(), Pose::default(), Instant::ZERO).unwrap()
    }

    fn step(core: &mut MotionCore, wheels: WheelSpeeds, tick: u64) -> WheelSpeeds {
        core.control_step(wheels, DT, Instant::from_millis(15 * tick))
    }

    #[test]
    fn starts_idle_and_stays_without_goal() {
        let mut core = core();
        for tick in 1..10 {
            assert_eq!(step(&mut core, WheelSpeeds::ZERO, tick), WheelSpeeds::ZERO);
        }
        assert_eq!(core.phase(), ControlPhase::Idle);
    }

    #[test]
    fn new_goal_runs_init_position_for_one_tick() {
        let mut core = core();
        assert_eq!(core.offer_goal(Pose::new(0.5, 0.0, 0.0)), Some(GoalChange::Position));
        assert_eq!(core.phase(), ControlPhase::InitPosition);

        let out = step(&mut core, WheelSpeeds::ZERO, 1);
        assert_eq!(out, WheelSpeeds::ZERO);
        assert_eq!(core.phase(), ControlPhase::InitPosition);
        assert!(core.controller().position_enabled());

        let out = step(&mut core, WheelSpeeds::ZERO, 2);
        assert_eq!(core.phase(), ControlPhase::Position);
        assert!(out.omega_l != 0.0 || out.omega_r != 0.0);
    }

    #[test]
    fn path_starts_at_the_controlled_point() {
        let mut core = core();
        core.offer_goal(Pose::new(0.5, 0.0, 0.0));
        assert!((core.trajectory().start().x - 0.02).abs() < 1e-12);
        assert!((core.trajectory().length() - 0.48).abs() < 1e-12);

        step(&mut core, WheelSpeeds::ZERO, 1);
        let out = step(&mut core, WheelSpeeds::ZERO, 2);
        assert_eq!(core.phase(), ControlPhase::Position);
        assert!(out.omega_l > 0.0 && out.omega_r > 0.0, "first move must be forward: {out:?}");
    }

    #[test]
    fn rejected_goal_changes_nothing() {
        let mut core = core();
        assert_eq!(core.offer_goal(Pose::new(0.01, 0.0, 0.0)), None);
        assert_eq!(core.goal(), Pose::default());
        step(&mut core, WheelSpeeds::ZERO, 1);
        assert_eq!(core.phase(), ControlPhase::Idle);
    }

    #[test]
    fn heading_goal_while_idle_reorients() {
        let mut core = core();
        assert_eq!(core.offer_goal(Pose::new(0.0, 0.0, 1.0)), Some(GoalChange::Heading));
        assert_eq!(core.phase(), ControlPhase::InitOrientFinal);
        step(&mut core, WheelSpeeds::ZERO, 1);
        assert!(core.controller().orientation_enabled());
        assert!(!core.controller().position_enabled());
        let out = step(&mut core, WheelSpeeds::ZERO, 2);
        assert_eq!(core.phase(), ControlPhase::OrientFinal);
        assert!(out.omega_r > 0.0 && out.omega_l < 0.0);
    }

    #[test]
    fn heading_goal_does_not_interrupt_position() {
        let mut core = core();
        core.offer_goal(Pose::new(0.5, 0.0, 0.0));
        step(&mut core, WheelSpeeds::ZERO, 1);
        step(&mut core, WheelSpeeds::ZERO, 2);
        assert_eq!(core.offer_goal(Pose::new(0.5, 0.0, 0.5)), Some(GoalChange::Heading));
        assert_eq!(core.phase(), ControlPhase::Position);
        assert_eq!(core.goal(), Pose::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn pose_correction_moves_estimate() {
        let mut core = core();
        let update = ExternalUpdate { robot: Some(Pose::new(0.3, 0.1, 0.2)), target: None };
        let outcome = core.apply(update, Instant::from_millis(3));
        assert!(outcome.pose_accepted);
        assert_eq!(outcome.goal_change, None);
        assert_eq!(core.pose(), Pose::new(0.3, 0.1, 0.2));

        // now the robot is away from its goal and starts moving back
        step(&mut core, WheelSpeeds::ZERO, 1);
        assert_eq!(core.phase(), ControlPhase::InitPosition);
    }

    #[test]
    fn wheel_targets_are_clamped() {
        let mut params = Params::default();
        params.regulator.max_wheel_speed_rads = 1.0;
        let mut core = MotionCore::new(&params, Pose::default(), Instant::ZERO).unwrap();
        core.offer_goal(Pose::new(2.0, 0.0, 0.0));
        for tick in 1..200 {
            let out = step(&mut core, WheelSpeeds::ZERO, tick);
            assert!(out.omega_l.abs() <= 1.0 && out.omega_r.abs() <= 1.0);
        }
    }

    #[test]
    fn rejects_invalid_params() {
        let params = Params { offset_m: 0.0, ..Params::default() };
        assert!(MotionCore::new(&params, Pose::default(), Instant::ZERO).is_err());
    }
}
