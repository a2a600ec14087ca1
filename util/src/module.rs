//! Cyclic module interface
//!
//! Controllers driven by the `drive_exec` main loop implement `State`: they are initialised
//! once from a parameter file and then processed once per control cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// State of a cyclic module.
pub trait State {
    /// Passed to `init`, usually the path of the module's parameter file.
    type InitData;
    type InitError;

    /// Per-cycle inputs.
    type InputData;
    /// Per-cycle outputs, consumed by the next stage of the loop.
    type OutputData;
    /// Per-cycle diagnostics, suitable for archiving.
    type StatusReport;
    type ProcError;

    /// Load parameters and open any archives within `session`.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one control cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
