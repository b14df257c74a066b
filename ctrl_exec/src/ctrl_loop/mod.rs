//! Control loop module
//!
//! Drives the depth and heading controllers (and optionally the speed controller) from a
//! snapshot of the state store and maps their outputs onto an actuator command. The tick
//! function is pure with respect to timing, the executable's main loop provides the period.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
pub mod synth;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during CtrlLoop operation.
#[derive(Debug, thiserror::Error)]
pub enum CtrlLoopError {
    #[error("Could not load the control loop parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Could not archive the control loop data: {0}")]
    ArchiveError(ArchiveError),
}
