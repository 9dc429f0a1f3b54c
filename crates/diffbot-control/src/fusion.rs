//! Hysteresis on externally supplied pose corrections and goals.
//!
//! Updates that move things by less than the configured deadbands are dropped,
//! so sensor jitter from an external tracker cannot restart a converged move.

use diffbot_kinematics::{Pose, angle_diff};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::params::FusionParams;

/// One inbound message: a pose correction, a new goal, or both.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExternalUpdate {
    /// Measured pose of the robot.
    pub robot: Option<Pose>,
    /// Requested goal pose.
    pub target: Option<Pose>,
}

impl ExternalUpdate {
    pub fn is_empty(&self) -> bool {
        self.robot.is_none() && self.target.is_none()
    }
}

/// What an accepted goal changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalChange {
    /// The goal position moved; a new trajectory is needed.
    Position,
    /// Only the goal heading changed.
    Heading,
}

/// Owns the committed goal and decides which updates get through.
#[derive(Debug, Clone)]
pub struct FusionGate {
    thresholds: FusionParams,
    goal: Pose,
    rejected_poses: u64,
    rejected_goals: u64,
}

impl FusionGate {
    pub fn new(thresholds: FusionParams, initial_goal: Pose) -> Self {
        FusionGate { thresholds, goal: initial_goal, rejected_poses: 0, rejected_goals: 0 }
    }

    /// The committed goal.
    pub fn goal(&self) -> Pose {
        self.goal
    }

    pub fn rejected_poses(&self) -> u64 {
        self.rejected_poses
    }

    pub fn rejected_goals(&self) -> u64 {
        self.rejected_goals
    }

    /// Whether a pose correction is far enough from the current estimate to
    /// be worth applying.
    pub fn admit_pose(&mut self, current: &Pose, candidate: &Pose) -> bool {
        if !is_finite(candidate) {
            self.rejected_poses += 1;
            return false;
        }
        let accepted = current.distance_to(candidate) > self.thresholds.pose_threshold_m;
        if !accepted {
            self.rejected_poses += 1;
        }
        accepted
    }

    /// Commits `candidate` as the goal if it differs enough from the current one.
    ///
    /// A goal whose position stays inside the deadband but whose heading moves
    /// past the heading threshold only updates the committed heading.
    pub fn offer_goal(&mut self, candidate: Pose) -> Option<GoalChange> {
        if !is_finite(&candidate) {
            self.rejected_goals += 1;
            return None;
        }
        if self.goal.distance_to(&candidate) > self.thresholds.goal_position_threshold_m {
            self.goal = candidate;
            return Some(GoalChange::Position);
        }
        if angle_diff(self.goal.theta, candidate.theta).abs() > self.thresholds.goal_heading_threshold_rad {
            self.goal.theta = candidate.theta;
            return Some(GoalChange::Heading);
        }
        self.rejected_goals += 1;
        None
    }
}

fn is_finite(pose: &Pose) -> bool {
    pose.x.is_finite() && pose.y.is_finite() && pose.theta.is_finite()
}
