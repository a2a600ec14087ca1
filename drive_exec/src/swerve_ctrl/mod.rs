//! # Swerve control module
//!
//! Converts desired wheel module states (speed and direction) into steer and drive actuator
//! demands for each independently steerable wheel module.
//!
//! Steering always takes the shortest route: a module is never asked to turn more than a quarter
//! turn, instead the wheel is driven backwards when the desired direction lies behind it. The
//! steer angle is tracked unbounded (never wrapped) so the steer demand is always continuous.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod hal;
mod kinematics;
mod params;
mod sim;
mod state;
mod steer;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use hal::*;
pub use kinematics::*;
pub use params::*;
pub use sim::*;
pub use state::*;
pub use steer::*;

use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of wheel modules on the chassis.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SwerveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SwerveCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Could not open the archive: {0}")]
    ArchiveError(ArchiveError),

    #[error("Module {0} does not exist")]
    InvalidModule(usize),

    #[error("Module hardware error: {0}")]
    HardwareError(String),

    #[error("{op} failed after {attempts} attempts, last error: {last}")]
    RetriesExhausted {
        op: &'static str,
        attempts: usize,
        last: String
    },

    #[error("No absolute steer angle was received from module {module} within {timeout_s} s")]
    AbsSensorTimeout {
        module: usize,
        timeout_s: f64
    }
}
