//! Straight-line trajectories with a trapezoidal speed profile.
//!
//! Progress `s` runs from 0 at the start pose to 1 at the goal. With
//! acceleration limit `A`, speed limit `V` and path length `L`, the ramp lasts
//! `Ts = V/A` and the whole move `T = (L·A + V²)/(V·A)`. Moves shorter than
//! `V²/A` never reach cruise speed and use a triangular profile with
//! `Ts = sqrt(L/A)` and `T = 2·Ts` instead.

use diffbot_kinematics::{Point, Pose};

/// Paths shorter than this are treated as already complete.
const MIN_LENGTH: f64 = 1e-9;

/// Speed and acceleration limits along the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileLimits {
    /// Cruise speed along the path, in m/s.
    pub v_max: f64,
    /// Acceleration and deceleration, in m/s².
    pub a_max: f64,
}

/// Progress along the path and its rate of change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    /// Fraction of the path covered, in `[0, 1]`.
    pub s: f64,
    /// `ds/dt`, in 1/s.
    pub s_dot: f64,
}

impl Progress {
    /// At the goal and no longer moving.
    pub const DONE: Progress = Progress { s: 1.0, s_dot: 0.0 };
}

/// A planned move from `start` to `goal` and its own elapsed-time clock.
///
/// Only the positions are interpolated. The headings of both poses are
/// carried along but never used by the profile.
#[derive(Debug, Clone)]
pub struct Trajectory {
    limits: ProfileLimits,
    start: Pose,
    goal: Pose,
    length: f64,
    ramp_time: f64,
    duration: f64,
    elapsed: f64,
    progress: Progress,
}

impl Trajectory {
    /// Plans the first move right away. Passing `start == goal` gives a
    /// trajectory that is already complete.
    pub fn new(start: Pose, goal: Pose, limits: ProfileLimits) -> Self {
        let mut trajectory = Trajectory {
            limits,
            start,
            goal,
            length: 0.0,
            ramp_time: 0.0,
            duration: 0.0,
            elapsed: 0.0,
            progress: Progress::default(),
        };
        trajectory.restart(start, goal);
        trajectory
    }

    /// Starts a fresh move from `start` to `goal` with zero elapsed time.
    pub fn restart(&mut self, start: Pose, goal: Pose) {
        let ProfileLimits { v_max, a_max } = self.limits;
        let length = start.distance_to(&goal);

        self.start = start;
        self.goal = goal;
        self.length = length;
        self.elapsed = 0.0;

        if length <= MIN_LENGTH {
            self.ramp_time = 0.0;
            self.duration = 0.0;
            self.progress = Progress::DONE;
        } else if length < v_max * v_max / a_max {
            self.ramp_time = (length / a_max).sqrt();
            self.duration = 2.0 * self.ramp_time;
            self.progress = Progress::default();
        } else {
            self.ramp_time = v_max / a_max;
            self.duration = (length * a_max + v_max * v_max) / (v_max * a_max);
            self.progress = Progress::default();
        }
    }

    /// Progress at `t` seconds after the start. Pure; does not move the
    /// trajectory's own clock.
    pub fn sample(&self, t: f64) -> Progress {
        let (l, a, ts, total) = (self.length, self.limits.a_max, self.ramp_time, self.duration);
        if l <= MIN_LENGTH || t >= total {
            return Progress::DONE;
        }
        if t <= 0.0 {
            return Progress::default();
        }

        if t <= ts {
            Progress { s: a * t * t / (2.0 * l), s_dot: a * t / l }
        } else if t <= total - ts {
            Progress {
                s: a * ts * (t - ts) / l + a * ts * ts / (2.0 * l),
                s_dot: a * ts / l,
            }
        } else {
            let remaining = total - t;
            Progress {
                s: 1.0 - a * remaining * remaining / (2.0 * l),
                s_dot: a * remaining / l,
            }
        }
    }

    /// Moves the trajectory clock forward by `dt` seconds.
    pub fn advance(&mut self, dt: f64) -> Progress {
        if dt > 0.0 {
            self.elapsed += dt;
        }
        self.progress = self.sample(self.elapsed);
        self.progress
    }

    /// Progress as of the last [`advance`](Self::advance) or restart.
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Where the robot should be now: `start + s·(goal − start)`.
    pub fn desired_position(&self) -> Point {
        let s = self.progress.s;
        Point::new(
            self.start.x + s * (self.goal.x - self.start.x),
            self.start.y + s * (self.goal.y - self.start.y),
        )
    }

    /// Planned velocity of the desired position, `(goal − start)·ṡ`.
    pub fn feedforward(&self) -> (f64, f64) {
        let s_dot = self.progress.s_dot;
        (
            (self.goal.x - self.start.x) * s_dot,
            (self.goal.y - self.start.y) * s_dot,
        )
    }

    /// True once the clock has run past the profile's duration.
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn start(&self) -> Pose {
        self.start
    }

    pub fn goal(&self) -> Pose {
        self.goal
    }

    /// Straight-line distance `L` between start and goal, in meters.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Duration `Ts` of each ramp, in seconds.
    pub fn ramp_time(&self) -> f64 {
        self.ramp_time
    }

    /// Total time `T` of the move, in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Seconds on the trajectory clock since the last restart.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;
    const LIMITS: ProfileLimits = ProfileLimits { v_max: 0.18, a_max: 0.08 };

    fn line(length: f64) -> Trajectory {
        Trajectory::new(Pose::default(), Pose::new(length, 0.0, 0.0), LIMITS)
    }

    #[test]
    fn timing_of_one_meter_move() {
        let traj = line(1.0);
        assert!((traj.ramp_time() - 2.25).abs() < EPSILON);
        // (1·0.08 + 0.0324) / (0.18·0.08)
        assert!((traj.duration() - 7.805555555555555).abs() < EPSILON);
    }

    #[test]
    fn endpoints() {
        let traj = line(1.0);
        let begin = traj.sample(0.0);
        let end = traj.sample(traj.duration());
        assert_eq!(begin, Progress::default());
        assert!((end.s - 1.0).abs() < EPSILON);
        assert_eq!(end.s_dot, 0.0);
        assert_eq!(traj.sample(100.0), Progress::DONE);
    }

    #[test]
    fn continuous_at_phase_boundaries() {
        let traj = line(1.0);
        let ts = traj.ramp_time();
        let total = traj.duration();
        for boundary in [ts, total - ts] {
            let before = traj.sample(boundary - 1e-7);
            let after = traj.sample(boundary + 1e-7);
            assert!((before.s - after.s).abs() < 1e-6, "s jumps at {boundary}");
            assert!((before.s_dot - after.s_dot).abs() < 1e-6, "s_dot jumps at {boundary}");
        }
        let near_end = traj.sample(total - 1e-7);
        assert!((near_end.s - 1.0).abs() < 1e-6);
        assert!(near_end.s_dot < 1e-6);
    }

    #[test]
    fn monotonic_and_bounded() {
        for length in [1.0, 0.5, 0.2, 0.05, 0.001] {
            let traj = line(length);
            let mut last = 0.0;
            let steps = 10_000;
            for i in 0..=steps {
                let t = traj.duration() * 1.1 * i as f64 / steps as f64;
                let p = traj.sample(t);
                assert!(p.s >= last - 1e-12, "L={length}: s fell at t={t}");
                assert!((0.0..=1.0 + 1e-12).contains(&p.s));
                assert!(p.s_dot >= 0.0);
                last = p.s;
            }
        }
    }

    #[test]
    fn cruise_speed_matches_limit() {
        let traj = line(1.0);
        let mid = traj.sample(traj.duration() / 2.0);
        // path speed L·ṡ equals V_MAX while cruising
        assert!((mid.s_dot * traj.length() - 0.18).abs() < EPSILON);
    }

    #[test]
    fn short_move_uses_triangular_profile() {
        // V²/A = 0.405 m, so 0.1 m never reaches cruise
        let traj = line(0.1);
        let ts = (0.1_f64 / 0.08).sqrt();
        assert!((traj.ramp_time() - ts).abs() < EPSILON);
        assert!((traj.duration() - 2.0 * ts).abs() < EPSILON);

        let peak = traj.sample(ts);
        assert!((peak.s - 0.5).abs() < EPSILON);
        assert!(peak.s_dot * traj.length() <= 0.18);
        let just_after = traj.sample(ts + 1e-7);
        assert!((just_after.s - peak.s).abs() < 1e-6);
    }

    #[test]
    fn zero_length_is_done_immediately() {
        let mut traj = Trajectory::new(Pose::new(1.0, 1.0, 0.0), Pose::new(1.0, 1.0, 2.0), LIMITS);
        assert!(traj.is_complete());
        assert_eq!(traj.progress(), Progress::DONE);
        assert_eq!(traj.advance(0.015), Progress::DONE);
        let (fx, fy) = traj.feedforward();
        assert_eq!((fx, fy), (0.0, 0.0));
        assert_eq!(traj.desired_position(), Point::new(1.0, 1.0));
    }

    #[test]
    fn advance_and_interpolation() {
        let mut traj = Trajectory::new(Pose::new(1.0, 2.0, 0.0), Pose::new(1.0, 3.0, 0.0), LIMITS);
        let mut last = 0.0;
        while !traj.is_complete() {
            let p = traj.advance(0.015);
            assert!(p.s >= last);
            last = p.s;
            let desired = traj.desired_position();
            assert!((desired.x - 1.0).abs() < EPSILON);
            assert!((desired.y - (2.0 + p.s)).abs() < EPSILON);
            let (fx, fy) = traj.feedforward();
            assert_eq!(fx, 0.0);
            assert!((fy - p.s_dot).abs() < EPSILON);
        }
        assert_eq!(traj.progress(), Progress::DONE);
        assert!(traj.elapsed() >= traj.duration());
    }

    #[test]
    fn restart_resets_clock() {
        let mut traj = line(0.5);
        traj.advance(3.0);
        assert!(traj.progress().s > 0.0);
        traj.restart(Pose::new(0.3, 0.0, 0.0), Pose::new(0.5, 0.0, 0.0));
        assert_eq!(traj.elapsed(), 0.0);
        assert_eq!(traj.progress(), Progress::default());
        assert!((traj.start().x - 0.3).abs() < EPSILON);
        assert!((traj.length() - 0.2).abs() < EPSILON);
    }
}
