//! # Vision consistency checks
//!
//! Before a vision correction is given to the pose estimator the observations of the cameras
//! which produced it are checked against each other:
//!
//! - The epipolar check verifies that matched image features from two cameras satisfy the
//!   epipolar constraint of their (fixed) fundamental matrix.
//! - The translational filter compares the relative transform between two cameras' pose
//!   estimates with the relative transform expected from their mounting calibration.
//!
//! Both checks are pure functions of their inputs and the calibration held in [`Params`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod epipolar;
mod params;
mod select;
mod translational;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use epipolar::*;
pub use params::*;
pub use select::*;
pub use translational::*;

use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during vision checks.
#[derive(Debug, thiserror::Error)]
pub enum VisionCheckError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    /// The two correspondence lists passed to a check are of different lengths.
    #[error("Point lists must have the same size, got {a} and {b}")]
    LengthMismatch {
        a: usize,
        b: usize
    }
}
