//! Module interfaces
//!
//! Cyclic processing modules (such as the control loop) implement [`State`] so that the
//! executable can initialise and step them uniformly.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::warn;
use std::fmt::Display;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Name used when reporting on this module.
    const NAME: &'static str;

    /// Data required during initialisation, usually the parameter file path
    type InitData;
    type InitError;

    /// Data required for one cycle.
    type InputData;
    /// Data produced by one cycle.
    type OutputData;
    /// A report on the status of the cyclic processing.
    type StatusReport;
    type ProcError: Display;

    /// Initialise the module, using the session for any archives.
    ///
    /// Any state accumulated by previous cycles is discarded.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Process one cycle, returning the output data and status report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;

    /// Process one cycle, warning about and discarding any processing error.
    ///
    /// Processing errors are not fatal to the executable, the cycle's outputs are simply left at
    /// their defaults.
    fn proc_or_warn(&mut self, input_data: &Self::InputData)
        -> Option<(Self::OutputData, Self::StatusReport)>
    {
        match self.proc(input_data) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Error during {} processing: {}", Self::NAME, e);
                None
            }
        }
    }
}
