//! # Drive library
//!
//! Motion control core of the robot: pose alignment, swerve module control and vision
//! consistency checks. The `drive_exec` executable runs these against simulated hardware.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Alignment control - drives the chassis to a target pose
pub mod align_ctrl;

/// Localisation types - poses and velocities shared by the controllers
pub mod loc;

/// Executable parameters
pub mod params;

/// Swerve control - converts module states into steer and drive demands
pub mod swerve_ctrl;

/// Vision checks - cross camera consistency checks on vision observations
pub mod vision_check;
