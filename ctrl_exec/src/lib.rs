//! # Control library.
//!
//! This library allows the executable, tests, and benchmarks to access items defined inside the
//! control crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command server - publishes actuator commands
pub mod cmd_server;

/// Control loop module - drives the controllers and synthesises the actuator command
pub mod ctrl_loop;

/// Global data store for the executable
pub mod data_store;

/// Initialisation gate - arms the control loop
pub mod init_gate;

/// Input client - recieves setpoints and measurements from the network
pub mod input_client;

/// Input sink - applies inbound messages to the shared state
pub mod input_sink;

/// Heading normaliser - converts raw modem yaw into calibrated heading
pub mod normaliser;

/// Discrete PID controller
pub mod pid;

/// Setpoint and measurement state store
pub mod state_store;
