//! # Motion profiles
//!
//! One dimensional trapezoidal motion profiles, used to generate position/velocity setpoints
//! that take an axis from its current state to a goal position while respecting velocity and
//! acceleration constraints.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::epsilon_eq;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used when comparing motion states.
const STATE_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The kinematic state of an axis at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionState {
    /// Units: seconds
    pub t: f64,
    /// Units: meters
    pub pos: f64,
    /// Units: meters/second
    pub vel: f64,
    /// Units: meters/second^2
    pub acc: f64
}

/// Velocity and acceleration limits of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfileConstraints {
    /// Units: meters/second
    pub max_abs_vel: f64,
    /// Units: meters/second^2
    pub max_abs_acc: f64
}

/// The goal of a profile.
///
/// Goals always allow overshoot: if the axis cannot stop at the goal it stops past it and the
/// profile comes back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionProfileGoal {
    /// Units: meters
    pub pos: f64,
    /// Maximum speed allowed when at the goal, zero to stop there.
    ///
    /// Units: meters/second
    pub max_abs_vel: f64,
    /// Units: meters
    pub pos_tolerance: f64,
    /// Units: meters/second
    pub vel_tolerance: f64
}

/// A segment of constant acceleration.
#[derive(Debug, Clone, Copy)]
struct MotionSegment {
    start: MotionState,
    end: MotionState
}

/// A sequence of constant acceleration segments.
#[derive(Debug, Clone)]
pub struct MotionProfile {
    start: MotionState,
    segments: Vec<MotionSegment>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionState {
    pub fn new(t: f64, pos: f64, vel: f64, acc: f64) -> Self {
        Self { t, pos, vel, acc }
    }

    /// Propagate this state forward (or backward) to time `t` using this state's acceleration.
    pub fn extrapolate(&self, t: f64) -> Self {
        let dt = t - self.t;

        Self {
            t,
            pos: self.pos + self.vel * dt + 0.5 * self.acc * dt * dt,
            vel: self.vel + self.acc * dt,
            acc: self.acc
        }
    }

    fn flipped(&self) -> Self {
        Self::new(self.t, -self.pos, -self.vel, -self.acc)
    }

    fn approx_eq(&self, other: &Self) -> bool {
        epsilon_eq(self.t, other.t, STATE_EPSILON)
            && epsilon_eq(self.pos, other.pos, STATE_EPSILON)
            && epsilon_eq(self.vel, other.vel, STATE_EPSILON)
    }
}

impl MotionProfileGoal {
    /// A goal of stopping at `pos` within the given tolerances.
    pub fn new(pos: f64, pos_tolerance: f64, vel_tolerance: f64) -> Self {
        Self {
            pos,
            max_abs_vel: 0.0,
            pos_tolerance,
            vel_tolerance
        }
    }

    pub fn at_goal_pos(&self, pos: f64) -> bool {
        epsilon_eq(pos, self.pos, self.pos_tolerance)
    }

    /// True if the state is within the position tolerance of the goal and is not moving faster
    /// than the goal allows.
    pub fn at_goal_state(&self, state: &MotionState) -> bool {
        self.at_goal_pos(state.pos)
            && state.vel.abs() < self.max_abs_vel + self.vel_tolerance
    }

    fn flipped(&self) -> Self {
        Self {
            pos: -self.pos,
            ..*self
        }
    }
}

impl MotionProfile {
    fn new(start: MotionState) -> Self {
        Self {
            start,
            segments: Vec::new()
        }
    }

    /// Generate a profile from `prev_state` to `goal`.
    pub fn generate(
        constraints: &MotionProfileConstraints,
        goal: &MotionProfileGoal,
        prev_state: &MotionState
    ) -> Self {
        let delta_pos = goal.pos - prev_state.pos;

        // Always solve for positive motion, flipping the problem if the goal is behind us.
        if delta_pos < 0.0 || (delta_pos == 0.0 && prev_state.vel < 0.0) {
            return Self::generate(constraints, &goal.flipped(), &prev_state.flipped())
                .flipped();
        }

        let max_acc = constraints.max_abs_acc;

        // Clamp the start state to the constraints
        let start = MotionState::new(
            prev_state.t,
            prev_state.pos,
            prev_state.vel.signum() * prev_state.vel.abs().min(constraints.max_abs_vel),
            prev_state.acc.signum() * prev_state.acc.abs().min(max_acc)
        );
        let mut profile = Self::new(start);

        // If we're heading away from the goal stop first
        if profile.end_state().vel < 0.0 {
            let stopping_time_s = (profile.end_state().vel / max_acc).abs();
            profile.append_control(max_acc, stopping_time_s);
        }
        let delta_pos = goal.pos - profile.end_state().pos;
        let start_vel = profile.end_state().vel;

        let min_abs_vel_at_goal_sqr = start_vel.powi(2) - 2.0 * max_acc * delta_pos;
        let max_abs_vel_at_goal = (start_vel.powi(2) + 2.0 * max_acc * delta_pos).sqrt();

        // Overshoot is unavoidable, stop past the goal then come back to it.
        if min_abs_vel_at_goal_sqr > 0.0
            && min_abs_vel_at_goal_sqr.sqrt() > goal.max_abs_vel + goal.vel_tolerance
        {
            let stopping_time_s = (start_vel / max_acc).abs();
            profile.append_control(-max_acc, stopping_time_s);

            let back = Self::generate(constraints, goal, &profile.end_state());
            profile.segments.extend(back.segments);

            return profile;
        }

        let goal_vel = goal.max_abs_vel.min(max_abs_vel_at_goal);

        // Peak velocity is where the acceleration curve from the start meets the deceleration
        // curve into the goal, limited by the cruise velocity.
        let v_max = constraints.max_abs_vel.min(
            ((start_vel.powi(2) + goal_vel.powi(2)) / 2.0 + delta_pos * max_acc).sqrt()
        );

        if v_max > start_vel {
            profile.append_control(max_acc, (v_max - start_vel) / max_acc);
        }

        let end = profile.end_state();
        let dist_decel_m = ((end.vel.powi(2) - goal_vel.powi(2)) / (2.0 * max_acc)).max(0.0);
        let dist_cruise_m = (goal.pos - end.pos - dist_decel_m).max(0.0);

        if dist_cruise_m > 0.0 && end.vel > 0.0 {
            profile.append_control(0.0, dist_cruise_m / end.vel);
        }

        if dist_decel_m > 0.0 {
            let vel = profile.end_state().vel;
            profile.append_control(-max_acc, (vel - goal_vel) / max_acc);
        }

        profile
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn start_state(&self) -> MotionState {
        self.start
    }

    pub fn end_state(&self) -> MotionState {
        self.segments.last()
            .map(|s| s.end)
            .unwrap_or(self.start)
    }

    pub fn start_time(&self) -> f64 {
        self.start.t
    }

    pub fn end_time(&self) -> f64 {
        self.end_state().t
    }

    /// Get the state at time `t`, or `None` if `t` lies outside the profile.
    pub fn state_by_time(&self, t: f64) -> Option<MotionState> {
        if t < self.start_time() - STATE_EPSILON || t > self.end_time() + STATE_EPSILON {
            return None
        }

        match self.segments.iter().find(|s| t <= s.end.t) {
            Some(segment) => Some(segment.start.extrapolate(t)),
            None => Some(self.end_state())
        }
    }

    /// Get the state at time `t`, clamped to the start and end of the profile.
    pub fn state_by_time_clamped(&self, t: f64) -> MotionState {
        if t <= self.start_time() {
            self.start_state()
        }
        else if t >= self.end_time() {
            self.end_state()
        }
        else {
            self.state_by_time(t).unwrap_or_else(|| self.end_state())
        }
    }

    /// Append a segment of constant `acc` lasting `duration_s`.
    fn append_control(&mut self, acc: f64, duration_s: f64) {
        if !(duration_s > 0.0) {
            return
        }

        let end = self.end_state();
        let start = MotionState::new(end.t, end.pos, end.vel, acc);

        self.segments.push(MotionSegment {
            start,
            end: start.extrapolate(start.t + duration_s)
        });
    }

    fn flipped(self) -> Self {
        Self {
            start: self.start.flipped(),
            segments: self.segments
                .into_iter()
                .map(|s| MotionSegment {
                    start: s.start.flipped(),
                    end: s.end.flipped()
                })
                .collect()
        }
    }
}

/// Caches a profile and samples setpoints from it, regenerating only when the goal or
/// constraints change or the axis departs from the cached profile.
#[derive(Debug, Clone, Default)]
pub struct SetpointGenerator {
    constraints: Option<MotionProfileConstraints>,
    goal: Option<MotionProfileGoal>,
    profile: Option<MotionProfile>
}

/// A setpoint sampled from a profile.
#[derive(Debug, Clone, Copy)]
pub struct Setpoint {
    pub motion_state: MotionState,

    /// True if this is the last setpoint of the profile.
    pub final_setpoint: bool
}

impl SetpointGenerator {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Get the setpoint at time `t` of a profile starting from `prev_state`.
    pub fn get_setpoint(
        &mut self,
        constraints: &MotionProfileConstraints,
        goal: &MotionProfileGoal,
        prev_state: &MotionState,
        t: f64
    ) -> Setpoint {
        let regenerate = match (&self.constraints, &self.goal, &self.profile) {
            (Some(c), Some(g), Some(p)) => {
                c != constraints
                    || g != goal
                    || (!p.is_empty() && !p.state_by_time(prev_state.t)
                        .map(|s| s.approx_eq(prev_state))
                        .unwrap_or(false))
            },
            _ => true
        };

        if regenerate {
            self.constraints = Some(*constraints);
            self.goal = Some(*goal);
            self.profile = Some(MotionProfile::generate(constraints, goal, prev_state));
        }

        let setpoint = match self.profile {
            Some(ref p) if !p.is_empty() => {
                let state = p.state_by_time_clamped(t);
                Setpoint {
                    motion_state: state,
                    final_setpoint: t >= p.end_time() || goal.at_goal_state(&state)
                }
            },
            // Nothing to do, hold the previous state
            _ => Setpoint {
                motion_state: *prev_state,
                final_setpoint: true
            }
        };

        if setpoint.final_setpoint {
            // Make sure the final setpoint lands exactly on the goal
            let state = setpoint.motion_state;
            Setpoint {
                motion_state: MotionState::new(
                    state.t,
                    goal.pos,
                    state.vel.signum() * goal.max_abs_vel.max(state.vel.abs()),
                    0.0
                ),
                final_setpoint: true
            }
        }
        else {
            setpoint
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const CONSTRAINTS: MotionProfileConstraints = MotionProfileConstraints {
        max_abs_vel: 2.0,
        max_abs_acc: 4.0
    };

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn test_trapezoid() {
        let goal = MotionProfileGoal::new(3.0, 0.01, 0.05);
        let profile = MotionProfile::generate(
            &CONSTRAINTS, &goal, &MotionState::new(0.0, 0.0, 0.0, 0.0)
        );

        // Accelerate 0.5 s (0.5 m), cruise 1.0 s (2 m), decelerate 0.5 s (0.5 m)
        assert_close(profile.end_time(), 2.0);
        assert_close(profile.end_state().pos, 3.0);
        assert_close(profile.end_state().vel, 0.0);

        let mid = profile.state_by_time_clamped(1.0);
        assert_close(mid.vel, 2.0);
        assert_close(mid.pos, 1.5);

        assert!(profile.state_by_time(2.5).is_none());
        assert_close(profile.state_by_time_clamped(2.5).pos, 3.0);
    }

    #[test]
    fn test_triangle_backwards() {
        let goal = MotionProfileGoal::new(-1.0, 0.01, 0.05);
        let profile = MotionProfile::generate(
            &CONSTRAINTS, &goal, &MotionState::new(1.0, 0.0, 0.0, 0.0)
        );

        // Peak velocity sqrt(4) = 2 is reached exactly at the midpoint, no cruise
        assert_close(profile.end_time(), 2.0);
        assert_close(profile.end_state().pos, -1.0);
        assert_close(profile.state_by_time_clamped(1.5).vel, -2.0);
    }

    #[test]
    fn test_overshoot() {
        // Moving too fast to stop before the goal, so stop past it and come back
        let goal = MotionProfileGoal::new(0.1, 0.01, 0.05);
        let profile = MotionProfile::generate(
            &CONSTRAINTS, &goal, &MotionState::new(0.0, 0.0, 2.0, 0.0)
        );

        let peak = profile.state_by_time_clamped(0.5);
        assert_close(peak.vel, 0.0);
        assert_close(peak.pos, 0.5);
        assert_close(profile.end_state().pos, 0.1);
        assert!(profile.end_time() > 0.5);
    }

    #[test]
    fn test_setpoint_at_goal() {
        let mut gen = SetpointGenerator::default();
        let goal = MotionProfileGoal::new(2.0, 0.08, 0.05);
        let sp = gen.get_setpoint(
            &CONSTRAINTS, &goal, &MotionState::new(0.0, 2.0, 0.0, 0.0), 0.02
        );

        assert!(sp.final_setpoint);
        assert_eq!(sp.motion_state.pos, 2.0);
        assert_eq!(sp.motion_state.vel, 0.0);
        assert!(goal.at_goal_state(&MotionState::new(0.0, 2.05, 0.04, 0.0)));
        assert!(!goal.at_goal_state(&MotionState::new(0.0, 2.1, 0.0, 0.0)));
    }
}
