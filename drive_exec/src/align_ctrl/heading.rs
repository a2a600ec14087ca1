//! # Heading snap controller
//!
//! Drives the robot's heading to a snap target along the shortest angular path.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Time of the previous call to `get`
    prev_time_s: Option<f64>,

    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64
}

/// Gains and limits of the heading snap controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeadingGains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,

    /// Maximum magnitude of the heading rate output.
    ///
    /// Units: radians/second
    pub max_rate_rads: f64
}

#[derive(Debug, Clone)]
pub struct HeadingCtrl {
    pid: PidController,
    max_rate_rads: f64,
    target_rad: f64,
    error_rad: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            integral: 0f64,
            prev_time_s: None,
            prev_error: None
        }
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_time_s = None;
        self.prev_error = None;
    }

    /// Get the value of the controller for the given error at time `time_s`.
    pub fn get(&mut self, error: f64, time_s: f64) -> f64 {
        let dt = self.prev_time_s
            .map(|t0| time_s - t0)
            .filter(|dt| *dt > 0.0);

        // No integral or derivative on the first call, or if time has not moved on, to avoid
        // spikes.
        if let Some(t) = dt {
            self.integral += error * t;
        }

        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            _ => 0f64
        };

        let out =
            self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv;

        self.prev_error = Some(error);
        self.prev_time_s = Some(time_s);

        out
    }
}

impl Default for HeadingGains {
    fn default() -> Self {
        Self {
            k_p: 4.0,
            k_i: 0.0,
            k_d: 0.0,
            max_rate_rads: 4.0
        }
    }
}

impl HeadingCtrl {
    pub fn new(gains: &HeadingGains) -> Self {
        Self {
            pid: PidController::new(gains.k_p, gains.k_i, gains.k_d),
            max_rate_rads: gains.max_rate_rads,
            target_rad: 0.0,
            error_rad: 0.0
        }
    }

    pub fn reset(&mut self) {
        self.pid.reset();
        self.error_rad = 0.0;
    }

    pub fn set_snap_target(&mut self, target_rad: f64) {
        self.target_rad = target_rad;
    }

    /// Get the heading rate demand for the current heading.
    ///
    /// The current heading is shifted by whole turns until it lies within half a turn of the
    /// target, so the output always takes the short way round.
    pub fn update(&mut self, current_rad: f64, time_s: f64) -> f64 {
        let current_rad = shortest_path_equivalent(self.target_rad, current_rad);
        self.error_rad = self.target_rad - current_rad;

        let out = self.pid.get(self.error_rad, time_s);
        clamp(&out, &-self.max_rate_rads, &self.max_rate_rads)
    }

    /// Signed heading error at the last update.
    ///
    /// Units: radians
    pub fn error_rad(&self) -> f64 {
        self.error_rad
    }
}

/// Shift `current_rad` by whole turns so that `target_rad - current_rad` lies in [-pi, pi].
pub fn shortest_path_equivalent(target_rad: f64, current_rad: f64) -> f64 {
    let mut current_rad = current_rad;

    while target_rad - current_rad > PI {
        current_rad += TAU;
    }
    while target_rad - current_rad < -PI {
        current_rad -= TAU;
    }

    current_rad
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shortest_path() {
        // 3.0 -> -3.0 is 6 rad the long way, 0.28 rad the short way
        let c = shortest_path_equivalent(3.0, -3.0);
        assert!((c - (TAU - 3.0)).abs() < 1e-12);
        assert!(3.0 - c < 0.0);

        let c = shortest_path_equivalent(-3.0, 3.0);
        assert!(-3.0 - c > 0.0);

        // Several turns away
        let c = shortest_path_equivalent(0.1, 4.0 * TAU);
        assert!((c - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_heading_ctrl() {
        let mut ctrl = HeadingCtrl::new(&HeadingGains::default());
        ctrl.set_snap_target(3.0);

        // Crossing the +/-pi seam means turning negative
        let out = ctrl.update(-3.0, 0.0);
        assert!(out < 0.0);
        assert!(ctrl.error_rad().abs() < PI);

        // Large errors saturate
        ctrl.set_snap_target(2.0);
        let out = ctrl.update(0.0, 0.02);
        assert_eq!(out, 4.0);
    }

    #[test]
    fn test_pid_time_aware() {
        let mut pid = PidController::new(1.0, 1.0, 0.0);
        assert_eq!(pid.get(1.0, 0.0), 1.0);
        // One second of unit error integrates to 1
        assert!((pid.get(1.0, 1.0) - 2.0).abs() < 1e-12);
        // No time elapsed, no accumulation
        assert!((pid.get(1.0, 1.0) - 2.0).abs() < 1e-12);
    }
}
