//! # Localisation types
//!
//! Pose and velocity types shared between the controllers. The estimate itself is produced by
//! the external state estimation filter, this module only describes it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pose (position and heading) of the robot in the field frame.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Pose2 {
    /// The position in the field frame
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Heading of the robot, measured from the field X axis. Continuous, i.e. not wrapped.
    ///
    /// Units: radians
    pub heading_rad: f64
}

/// Velocity of the robot expressed in the field frame.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Twist2 {
    /// Units: meters/second
    pub dx_ms: f64,

    /// Units: meters/second
    pub dy_ms: f64,

    /// Units: radians/second
    pub dtheta_rads: f64
}

/// A chassis velocity command.
///
/// Whether this is field or robot relative depends on where it came from, controllers in this
/// crate produce field relative speeds which are converted with `to_robot_relative`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ChassisSpeeds {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Units: radians/second
    pub omega_rads: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2 {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad
        }
    }

    pub fn x_m(&self) -> f64 {
        self.position_m[0]
    }

    pub fn y_m(&self) -> f64 {
        self.position_m[1]
    }
}

impl Twist2 {
    pub fn new(dx_ms: f64, dy_ms: f64, dtheta_rads: f64) -> Self {
        Self { dx_ms, dy_ms, dtheta_rads }
    }
}

impl ChassisSpeeds {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self { vx_ms, vy_ms, omega_rads }
    }

    /// Returns true if every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.vx_ms == 0.0 && self.vy_ms == 0.0 && self.omega_rads == 0.0
    }

    /// Rotate field relative speeds into the frame of a robot with the given heading.
    pub fn to_robot_relative(&self, heading_rad: f64) -> Self {
        let v_rb = Rotation2::new(-heading_rad) * Vector2::new(self.vx_ms, self.vy_ms);

        Self {
            vx_ms: v_rb[0],
            vy_ms: v_rb[1],
            omega_rads: self.omega_rads
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_to_robot_relative() {
        // Driving along field +X while facing field +Y is driving to the robot's right
        let speeds = ChassisSpeeds::new(1.0, 0.0, 0.5).to_robot_relative(FRAC_PI_2);

        assert!(speeds.vx_ms.abs() < 1e-9);
        assert!((speeds.vy_ms + 1.0).abs() < 1e-9);
        assert_eq!(speeds.omega_rads, 0.5);

        // No rotation at zero heading
        let speeds = ChassisSpeeds::new(0.3, -0.2, 0.0).to_robot_relative(0.0);
        assert!((speeds.vx_ms - 0.3).abs() < 1e-12);
        assert!((speeds.vy_ms + 0.2).abs() < 1e-12);
    }
}
