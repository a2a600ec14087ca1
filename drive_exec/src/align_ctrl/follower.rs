//! # Profile follower
//!
//! Tracks a motion profile towards a goal using feedforward on the profiled velocity and
//! acceleration plus PI(V) feedback on the tracking errors.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::profile::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of a profile follower.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FollowerGains {
    /// Position error gain
    pub kp: f64,

    /// Integral of position error gain
    pub ki: f64,

    /// Velocity error gain
    pub kv: f64,

    /// Feedforward velocity gain
    pub kffv: f64,

    /// Feedforward acceleration gain
    pub kffa: f64,

    /// Static friction compensation, applied in the direction of the setpoint velocity
    pub ks: f64
}

#[derive(Debug, Clone)]
pub struct ProfileFollower {
    gains: FollowerGains,

    gen: SetpointGenerator,

    goal: Option<MotionProfileGoal>,
    constraints: Option<MotionProfileConstraints>,

    latest_actual_state: Option<MotionState>,
    latest_setpoint: Option<Setpoint>,

    latest_pos_error: f64,
    latest_vel_error: f64,
    total_error: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FollowerGains {
    fn default() -> Self {
        Self {
            kp: 2.5,
            ki: 0.0,
            kv: 0.0,
            kffv: 1.0,
            kffa: 0.0,
            ks: 0.0
        }
    }
}

impl ProfileFollower {
    pub fn new(gains: FollowerGains) -> Self {
        Self {
            gains,
            gen: SetpointGenerator::default(),
            goal: None,
            constraints: None,
            latest_actual_state: None,
            latest_setpoint: None,
            latest_pos_error: f64::NAN,
            latest_vel_error: f64::NAN,
            total_error: 0.0
        }
    }

    /// Forget the cached profile and the goal, so the next update starts a fresh profile from the
    /// measured state.
    pub fn reset_profile(&mut self) {
        self.gen.reset();
        self.goal = None;
        self.constraints = None;
        self.reset_setpoint();
    }

    /// Forget the latest setpoint and accumulated errors.
    pub fn reset_setpoint(&mut self) {
        self.latest_actual_state = None;
        self.latest_setpoint = None;
        self.latest_pos_error = f64::NAN;
        self.latest_vel_error = f64::NAN;
        self.total_error = 0.0;
    }

    pub fn set_goal_and_constraints(
        &mut self,
        goal: MotionProfileGoal,
        constraints: MotionProfileConstraints
    ) {
        if let (Some(current), Some(sp)) = (self.goal, self.latest_setpoint.as_mut()) {
            // A new goal means the last setpoint is no longer the final one
            if current != goal {
                sp.final_setpoint = false;
            }
        }

        self.goal = Some(goal);
        self.constraints = Some(constraints);
    }

    /// Calculate the output for the measured `latest_state`, using the setpoint at time `t`.
    ///
    /// Returns zero if no goal has been set.
    pub fn update(&mut self, latest_state: MotionState, t: f64) -> f64 {
        let (goal, constraints) = match (self.goal, self.constraints) {
            (Some(g), Some(c)) => (g, c),
            _ => return 0.0
        };

        self.latest_actual_state = Some(latest_state);

        // Follow on from the last setpoint so the cached profile stays valid
        let prev_state = match self.latest_setpoint {
            Some(ref sp) => sp.motion_state,
            None => latest_state
        };
        let dt = (t - prev_state.t).max(0.0);

        let setpoint = self.gen.get_setpoint(&constraints, &goal, &prev_state, t);
        self.latest_setpoint = Some(setpoint);

        let sp = setpoint.motion_state;
        self.latest_pos_error = sp.pos - latest_state.pos;
        self.latest_vel_error = sp.vel - latest_state.vel;

        let g = &self.gains;
        let mut output = g.kp * self.latest_pos_error
            + g.kv * self.latest_vel_error
            + g.kffv * sp.vel
            + g.kffa * sp.acc;

        if !setpoint.final_setpoint {
            self.total_error += self.latest_pos_error * dt;
            output += g.ki * self.total_error;
        }
        else {
            self.total_error = 0.0;
        }

        if sp.vel != 0.0 {
            output += g.ks * sp.vel.signum();
        }

        output
    }

    /// True if the latest measured state satisfies the goal.
    pub fn on_target(&self) -> bool {
        match (self.goal, self.latest_actual_state) {
            (Some(goal), Some(state)) if self.latest_setpoint.is_some() => {
                goal.at_goal_state(&state)
            },
            _ => false
        }
    }

    pub fn is_finished_profile(&self) -> bool {
        self.latest_setpoint
            .map(|sp| sp.final_setpoint)
            .unwrap_or(false)
    }

    pub fn latest_pos_error(&self) -> f64 {
        self.latest_pos_error
    }

    pub fn latest_vel_error(&self) -> f64 {
        self.latest_vel_error
    }

    pub fn latest_setpoint(&self) -> Option<MotionState> {
        self.latest_setpoint.map(|sp| sp.motion_state)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn constraints() -> MotionProfileConstraints {
        MotionProfileConstraints {
            max_abs_vel: 3.0,
            max_abs_acc: 4.0
        }
    }

    #[test]
    fn test_follower_on_target() {
        let mut f = ProfileFollower::new(FollowerGains::default());
        assert!(!f.on_target());

        f.set_goal_and_constraints(MotionProfileGoal::new(1.0, 0.08, 0.05), constraints());
        let out = f.update(MotionState::new(0.0, 1.0, 0.0, 0.0), 0.02);

        assert_eq!(out, 0.0);
        assert!(f.on_target());
        assert!(f.is_finished_profile());

        f.reset_profile();
        assert!(!f.on_target());
    }

    #[test]
    fn test_follower_drives_towards_goal() {
        let mut f = ProfileFollower::new(FollowerGains::default());

        f.set_goal_and_constraints(MotionProfileGoal::new(2.0, 0.08, 0.05), constraints());
        let out = f.update(MotionState::new(0.0, 0.0, 0.0, 0.0), 0.02);
        assert!(out > 0.0);
        assert!(!f.on_target());

        f.reset_profile();
        f.set_goal_and_constraints(MotionProfileGoal::new(-2.0, 0.08, 0.05), constraints());
        let out = f.update(MotionState::new(0.0, 0.0, 0.0, 0.0), 0.02);
        assert!(out < 0.0);
    }

    #[test]
    fn test_no_goal() {
        let mut f = ProfileFollower::new(FollowerGains::default());
        assert_eq!(f.update(MotionState::new(0.0, 1.0, 0.0, 0.0), 0.02), 0.0);
        assert!(!f.on_target());
    }
}
