//! # Alignment control module
//!
//! AlignCtrl drives the chassis to a precise field relative target pose. Each translational axis
//! follows its own trapezoidal motion profile towards the target coordinate, while the heading is
//! snapped to the target heading along the shortest angular path. Each axis is deadbanded to
//! exactly zero output once it satisfies its tolerances, and the alignment is complete while all
//! three axes are deadbanded in the same cycle.
//!
//! The target is published through a [`TargetHandle`], which may be cloned and used from other
//! threads (for example a vision pipeline) while the control loop calls [`AlignCtrl::update`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod follower;
mod heading;
mod params;
mod profile;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use follower::*;
pub use heading::*;
pub use params::*;
pub use profile::*;
pub use state::*;

use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during AlignCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum AlignCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Could not open the archive: {0}")]
    ArchiveError(ArchiveError),

    /// `update` was called before any target pose was set.
    #[error("No target pose has been set")]
    NoTarget
}
