use parking_lot::RwLock;
use std::{sync::Arc, time::Instant};

use diffbot_control::{ControlPhase, Telemetry, UpdateOutcome};
use diffbot_kinematics::Pose;

/// Latest known state of the robot, shared between the control thread and
/// the async tasks. Only the control thread writes the motion fields.
#[derive(Clone, Debug)]
pub struct State {
    pub pose: Pose,
    pub goal: Pose,
    pub phase: ControlPhase,
    pub last_update_ts: Option<Instant>,
    pub accepted_poses: u64,
    pub accepted_goals: u64,
    pub dropped_messages: u64,
    pub faults: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        State {
            pose: Pose::default(),
            goal: Pose::default(),
            phase: ControlPhase::Idle,
            last_update_ts: None,
            accepted_poses: 0,
            accepted_goals: 0,
            dropped_messages: 0,
            faults: Vec::new(),
        }
    }
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

pub fn record_frame(bb: &Blackboard, frame: &Telemetry) {
    let mut g = bb.write();
    g.pose = frame.pose;
    g.goal = frame.goal;
    g.phase = frame.phase;
}

pub fn record_update(bb: &Blackboard, outcome: UpdateOutcome) {
    let mut g = bb.write();
    g.last_update_ts = Some(Instant::now());
    g.accepted_poses += u64::from(outcome.pose_accepted);
    g.accepted_goals += u64::from(outcome.goal_change.is_some());
}

pub fn count_dropped(bb: &Blackboard) {
    bb.write().dropped_messages += 1;
}

pub fn raise_fault(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if !g.faults.iter().any(|s| s == msg) {
        g.faults.push(msg.to_string());
    }
}
