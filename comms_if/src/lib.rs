//! # Communications interface crate.
//!
//! Provides the interface types shared between the drive control exec and the
//! equipment (actuator and camera) transport layers.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Demand and sensor data definitions for equipment (swerve modules, cameras)
pub mod eqpt;
