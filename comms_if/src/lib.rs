//! # Communications interface crate.
//!
//! Provides the message definitions exchanged with the control executable and the network
//! abstractions used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Inbound setpoint/measurement messages and the outbound actuator command
pub mod ctrl;

/// Network module
pub mod net;
