//! Parameters structure for the vision checks

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Isometry3, Matrix3, Translation3, UnitQuaternion};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vision check parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Maximum magnitude of the epipolar residual `x2 . (F x1)` of any correspondence.
    pub epipolar_threshold: f64,

    /// Fundamental matrix relating the dominant (1) and subordinate (2) cameras, row major.
    pub fundamental_matrix: [[f64; 3]; 3],

    /// Mounting of the dominant camera on the robot.
    pub dom_mount: MountParams,

    /// Mounting of the subordinate camera on the robot.
    pub sub_mount: MountParams,

    /// Translational filter error limit.
    ///
    /// Units: meters
    pub max_trans_error_m: f64,

    /// Translational filter rotation error limit.
    ///
    /// Units: radians
    pub max_rot_error_rad: f64
}

/// Robot to camera transform.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MountParams {
    /// Units: meters
    pub translation_m: [f64; 3],

    /// Roll, pitch and yaw.
    ///
    /// Units: radians
    pub rpy_rad: [f64; 3]
}

impl Default for Params {
    fn default() -> Self {
        Self {
            epipolar_threshold: 1e-6,
            // Rectified pair separated along the image X axis
            fundamental_matrix: [
                [0.0, 0.0, 0.0],
                [0.0, 0.0, -1.0],
                [0.0, 1.0, 0.0]
            ],
            dom_mount: MountParams {
                translation_m: [0.2, 0.25, 0.5],
                rpy_rad: [0.0, 0.0, 0.3]
            },
            sub_mount: MountParams {
                translation_m: [0.2, -0.25, 0.5],
                rpy_rad: [0.0, 0.0, -0.3]
            },
            max_trans_error_m: 0.1,
            max_rot_error_rad: 0.5
        }
    }
}

impl Params {
    pub fn fundamental_matrix(&self) -> Matrix3<f64> {
        let f = &self.fundamental_matrix;
        Matrix3::new(
            f[0][0], f[0][1], f[0][2],
            f[1][0], f[1][1], f[1][2],
            f[2][0], f[2][1], f[2][2]
        )
    }
}

impl MountParams {
    pub fn isometry(&self) -> Isometry3<f64> {
        let t = &self.translation_m;
        let r = &self.rpy_rad;

        Isometry3::from_parts(
            Translation3::new(t[0], t[1], t[2]),
            UnitQuaternion::from_euler_angles(r[0], r[1], r[2])
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_file() -> Result<(), util::params::LoadError> {
        let p: Params = util::params::parse(include_str!("../../../params/vision_check.toml"))?;
        let d = Params::default();

        assert_eq!(p.epipolar_threshold, 1e-6);
        assert_eq!(p.fundamental_matrix(), d.fundamental_matrix());
        assert_eq!(p.dom_mount.translation_m, d.dom_mount.translation_m);
        assert_eq!(p.max_rot_error_rad, 0.5);

        Ok(())
    }
}
