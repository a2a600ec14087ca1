//! Chassis inverse kinematics
//!
//! Splits a robot relative chassis velocity into the velocity of each wheel module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;

use crate::loc::ChassisSpeeds;
use super::{Params, NUM_MODULES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Desired or measured speed and direction of a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModuleState {
    /// Units: meters/second
    pub speed_ms: f64,

    /// Direction of travel of the wheel in the robot body frame.
    ///
    /// Units: degrees
    pub angle_deg: f64
}

/// Distance driven and direction of a module, used for odometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModulePosition {
    /// Units: meters
    pub distance_m: f64,

    /// Units: degrees
    pub angle_deg: f64
}

#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    module_pos_m_rb: [Vector2<f64>; NUM_MODULES],
    max_module_speed_ms: f64,

    /// Directions held while the chassis is stationary
    prev_angles_deg: [f64; NUM_MODULES]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleState {
    pub fn new(speed_ms: f64, angle_deg: f64) -> Self {
        Self { speed_ms, angle_deg }
    }
}

impl SwerveKinematics {
    pub fn new(params: &Params) -> Self {
        let mut module_pos_m_rb = [Vector2::zeros(); NUM_MODULES];
        for (pos, p) in module_pos_m_rb.iter_mut().zip(params.module_pos_m_rb.iter()) {
            *pos = Vector2::new(p[0], p[1]);
        }

        Self {
            module_pos_m_rb,
            max_module_speed_ms: params.max_module_speed_ms,
            prev_angles_deg: [0.0; NUM_MODULES]
        }
    }

    /// Calculate module states for robot relative chassis speeds.
    ///
    /// If any module would exceed the maximum module speed all modules are scaled down equally,
    /// preserving the direction of motion. A stationary chassis keeps the previous module
    /// directions.
    pub fn to_module_states(&mut self, speeds: &ChassisSpeeds) -> [ModuleState; NUM_MODULES] {
        let mut states = [ModuleState::default(); NUM_MODULES];

        if speeds.is_zero() {
            for (s, a) in states.iter_mut().zip(self.prev_angles_deg.iter()) {
                s.angle_deg = *a;
            }
            return states
        }

        for (i, pos) in self.module_pos_m_rb.iter().enumerate() {
            let v = Vector2::new(
                speeds.vx_ms - speeds.omega_rads * pos[1],
                speeds.vy_ms + speeds.omega_rads * pos[0]
            );

            states[i] = ModuleState::new(v.norm(), v[1].atan2(v[0]).to_degrees());
        }

        let max_speed_ms = states.iter().fold(0f64, |m, s| m.max(s.speed_ms));
        if max_speed_ms > self.max_module_speed_ms && max_speed_ms > 0.0 {
            let scale = self.max_module_speed_ms / max_speed_ms;
            for s in states.iter_mut() {
                s.speed_ms *= scale;
            }
        }

        for (a, s) in self.prev_angles_deg.iter_mut().zip(states.iter()) {
            *a = s.angle_deg;
        }

        states
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_translation() {
        let mut k = SwerveKinematics::new(&Params::default());

        let states = k.to_module_states(&ChassisSpeeds::new(0.0, 1.0, 0.0));
        for s in states.iter() {
            assert!((s.speed_ms - 1.0).abs() < 1e-12);
            assert!((s.angle_deg - 90.0).abs() < 1e-9);
        }

        // Stopping holds the directions
        let states = k.to_module_states(&ChassisSpeeds::default());
        for s in states.iter() {
            assert_eq!(s.speed_ms, 0.0);
            assert!((s.angle_deg - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rotation_and_desaturate() {
        let mut k = SwerveKinematics::new(&Params::default());

        // Front left module at (0.3, 0.3) moves towards +Y -X when turning anticlockwise
        let states = k.to_module_states(&ChassisSpeeds::new(0.0, 0.0, 1.0));
        assert!((states[0].angle_deg - 135.0).abs() < 1e-9);
        assert!((states[0].speed_ms - 0.18f64.sqrt()).abs() < 1e-12);

        let states = k.to_module_states(&ChassisSpeeds::new(10.0, 0.0, 0.0));
        for s in states.iter() {
            assert!((s.speed_ms - 4.5).abs() < 1e-12);
        }
    }
}
