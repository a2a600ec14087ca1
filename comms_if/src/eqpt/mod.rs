//! # Equipment Interface
//!
//! This module defines the interface structures which will be passed to and from equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod swerve;
