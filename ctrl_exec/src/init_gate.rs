//! # Initialisation gate
//!
//! One-way latch which arms the control loop. Commands are only emitted once the gate has been
//! armed, and the gate can never be disarmed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use std::sync::atomic::{AtomicBool, Ordering};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InitGate {
    armed: AtomicBool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl InitGate {
    /// Arm the gate.
    ///
    /// Returns true if this call armed the gate, or false if it was already armed. Only the
    /// arming call is logged.
    pub fn arm(&self) -> bool {
        let transitioned = self
            .armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if transitioned {
            info!("Init signal received, control loop armed");
        }

        transitioned
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}
