//! Translational consistency filter

use nalgebra::Isometry3;

use super::Params;

/// Expected relative transform between two cameras.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrinsicDelta(pub Isometry3<f64>);

impl ExtrinsicDelta {
    /// Compose the expected delta from each camera's robot to camera mounting transform, as
    /// `dom_mount * sub_mount^-1`.
    pub fn from_mounts(dom_mount: &Isometry3<f64>, sub_mount: &Isometry3<f64>) -> Self {
        Self(dom_mount * sub_mount.inverse())
    }

    /// The expected delta for the camera mounts in the parameters.
    pub fn from_params(params: &Params) -> Self {
        Self::from_mounts(&params.dom_mount.isometry(), &params.sub_mount.isometry())
    }
}

/// Compare the observed transform between two cameras' pose estimates against the expected one.
///
/// The observed delta is the transform from `dom_pose` to `sub_pose`, the error is that delta
/// composed with the inverse of the expected delta.
///
/// NOTE: returns true if the observations are **inconsistent**, that is if the error's
/// translation exceeds `max_trans_error_m` or its rotation angle exceeds `max_rot_error_rad`.
pub fn translational_filter(
    dom_pose: &Isometry3<f64>,
    sub_pose: &Isometry3<f64>,
    expected: &ExtrinsicDelta,
    params: &Params
) -> bool {
    let delta = dom_pose.inverse() * sub_pose;
    let error = delta * expected.0.inverse();

    error.translation.vector.norm() > params.max_trans_error_m
        || error.rotation.angle() > params.max_rot_error_rad
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn test_consistent_pair() {
        let params = Params::default();
        let expected = ExtrinsicDelta::from_params(&params);

        let dom_pose = Isometry3::from_parts(
            Translation3::new(3.0, -1.0, 0.8),
            UnitQuaternion::from_euler_angles(0.0, 0.1, 1.2)
        );
        let sub_pose = dom_pose * expected.0;

        assert!(!translational_filter(&dom_pose, &sub_pose, &expected, &params));
    }

    #[test]
    fn test_inconsistent_pair() {
        let params = Params::default();
        let expected = ExtrinsicDelta::from_params(&params);
        let dom_pose = Isometry3::identity();

        // Translation error of 0.2 m
        let sub_pose = Isometry3::from_parts(
            Translation3::new(0.2, 0.0, 0.0),
            UnitQuaternion::identity()
        ) * expected.0;
        assert!(translational_filter(&dom_pose, &sub_pose, &expected, &params));

        // Small translation error is accepted
        let sub_pose = Isometry3::from_parts(
            Translation3::new(0.05, 0.0, 0.0),
            UnitQuaternion::identity()
        ) * expected.0;
        assert!(!translational_filter(&dom_pose, &sub_pose, &expected, &params));

        // Rotation error of 0.6 rad
        let sub_pose = Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.6)
        ) * expected.0;
        assert!(translational_filter(&dom_pose, &sub_pose, &expected, &params));
    }

    #[test]
    fn test_from_mounts() {
        let params = Params::default();
        let dom = params.dom_mount.isometry();
        let sub = params.sub_mount.isometry();

        let delta = ExtrinsicDelta::from_mounts(&dom, &sub);
        let recovered = delta.0 * sub;
        assert!((recovered.translation.vector - dom.translation.vector).norm() < 1e-12);
        assert!(recovered.rotation.angle_to(&dom.rotation) < 1e-9);
    }
}
