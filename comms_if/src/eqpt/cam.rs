//! # Camera Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A localisation update produced by a single vision device.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VisionUpdate {
    /// The camera which produced the update
    pub cam_id: CamId,

    /// Capture time of the frame the update was derived from.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    /// Area of the image occupied by the observed target, used to rank devices.
    ///
    /// Units: percent of the image
    pub target_area_pct: f64,

    /// Estimated robot position in the field frame.
    ///
    /// Units: meters
    pub field_to_robot_m: [f64; 2],

    /// Pixel coordinates of the target's features, used for cross camera checks.
    ///
    /// Units: pixels
    pub features_px: Vec<[f64; 2]>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Vision devices available on the robot
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Hash, Eq, PartialEq)]
pub enum CamId {
    /// The right facing camera
    Right,

    /// The left facing camera
    Left,

    /// The upward facing camera
    Up
}
