//! Parameters structure for AlignCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{FollowerGains, HeadingGains, MotionProfileConstraints};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for alignment control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- TIMING ----

    /// Period of the control loop. Setpoints are taken from the profile one period ahead of the
    /// current time.
    ///
    /// Units: seconds
    pub control_period_s: f64,

    // ---- TOLERANCES ----

    /// Position tolerance of the X axis goal.
    ///
    /// Units: meters
    pub x_pos_tol_m: f64,

    /// Velocity tolerance of the X axis goal.
    ///
    /// Units: meters/second
    pub x_vel_tol_ms: f64,

    /// Position tolerance of the Y axis goal.
    ///
    /// Units: meters
    pub y_pos_tol_m: f64,

    /// Velocity tolerance of the Y axis goal.
    ///
    /// Units: meters/second
    pub y_vel_tol_ms: f64,

    /// Heading is deadbanded when the angular distance to the target is below this value...
    ///
    /// Units: radians
    pub head_tol_rad: f64,

    /// ... and the heading controller output is below this value.
    ///
    /// Units: radians/second
    pub head_output_tol_rads: f64,

    // ---- CONTROL ----

    /// Scale applied to the measured axis velocity before it is given to the followers, damping
    /// the response.
    pub measured_vel_scale: f64,

    /// Constraints used to profile both translational axes.
    pub profile: MotionProfileConstraints,

    /// Gains of the translational profile followers.
    pub follower: FollowerGains,

    /// Gains of the heading snap controller.
    pub heading: HeadingGains
}

impl Default for Params {
    fn default() -> Self {
        Self {
            control_period_s: 0.02,
            x_pos_tol_m: 0.08,
            x_vel_tol_ms: 0.05,
            y_pos_tol_m: 0.02,
            y_vel_tol_ms: 0.05,
            head_tol_rad: 1f64.to_radians(),
            head_output_tol_rads: 0.02,
            measured_vel_scale: 0.5,
            profile: MotionProfileConstraints {
                max_abs_vel: 3.0,
                max_abs_acc: 4.0
            },
            follower: FollowerGains::default(),
            heading: HeadingGains::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_file() -> Result<(), util::params::LoadError> {
        let p: Params = util::params::parse(include_str!("../../../params/align_ctrl.toml"))?;

        assert_eq!(p.x_pos_tol_m, 0.08);
        assert_eq!(p.y_pos_tol_m, 0.02);
        assert!((p.head_tol_rad - 1f64.to_radians()).abs() < 1e-12);
        assert_eq!(p.follower.kp, 2.5);
        assert_eq!(p.follower.kffv, 1.0);

        Ok(())
    }
}
