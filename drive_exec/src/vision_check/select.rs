//! Vision device selection and gating

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use nalgebra::{Isometry3, Matrix3, Point2};

use comms_if::eqpt::cam::VisionUpdate;
use util::params;
use super::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs the consistency checks between a dominant and subordinate camera.
#[derive(Debug, Clone)]
pub struct VisionCheck {
    params: Params,
    fundamental: Matrix3<f64>,
    expected: ExtrinsicDelta
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for VisionCheck {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl VisionCheck {
    pub fn new(params: Params) -> Self {
        Self {
            fundamental: params.fundamental_matrix(),
            expected: ExtrinsicDelta::from_params(&params),
            params
        }
    }

    /// Load the checks from a parameter file.
    pub fn from_params_file(path: &str) -> Result<Self, VisionCheckError> {
        let p: Params = params::load(path).map_err(VisionCheckError::ParamLoadError)?;
        Ok(Self::new(p))
    }

    /// Epipolar check of the features observed by both cameras, matched by index.
    pub fn features_consistent(
        &self,
        dom: &VisionUpdate,
        sub: &VisionUpdate
    ) -> Result<bool, VisionCheckError> {
        let to_points = |u: &VisionUpdate| -> Vec<Point2<f64>> {
            u.features_px.iter().map(|f| Point2::new(f[0], f[1])).collect()
        };

        epipolar_verification(
            &to_points(dom),
            &to_points(sub),
            &self.fundamental,
            self.params.epipolar_threshold
        )
    }

    /// Translational filter of the two cameras' pose estimates. True if they are inconsistent.
    pub fn poses_inconsistent(
        &self,
        dom_pose: &Isometry3<f64>,
        sub_pose: &Isometry3<f64>
    ) -> bool {
        translational_filter(dom_pose, sub_pose, &self.expected, &self.params)
    }

    /// Accept a pair of observations only if both checks pass.
    pub fn accept(
        &self,
        dom: &VisionUpdate,
        sub: &VisionUpdate,
        dom_pose: &Isometry3<f64>,
        sub_pose: &Isometry3<f64>
    ) -> Result<bool, VisionCheckError> {
        if !self.features_consistent(dom, sub)? {
            debug!("{:?}/{:?} rejected by the epipolar check", dom.cam_id, sub.cam_id);
            return Ok(false)
        }

        if self.poses_inconsistent(dom_pose, sub_pose) {
            warn!("{:?}/{:?} rejected by the translational filter", dom.cam_id, sub.cam_id);
            return Ok(false)
        }

        Ok(true)
    }

    pub fn expected_delta(&self) -> &ExtrinsicDelta {
        &self.expected
    }
}

/// Pick the update whose target occupies the largest area of the image.
///
/// Updates with no visible target (zero area) are never picked, ties go to the first update.
pub fn best_device(updates: &[VisionUpdate]) -> Option<&VisionUpdate> {
    let mut best: Option<&VisionUpdate> = None;

    for u in updates {
        let best_area = best.map(|b| b.target_area_pct).unwrap_or(0.0);
        if u.target_area_pct > best_area {
            best = Some(u);
        }
    }

    best
}
