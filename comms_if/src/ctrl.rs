//! # Control Interface
//!
//! Messages consumed and produced by the control executable.
//!
//! Inbound messages are sent as JSON encodings of [`InputMsg`], for example:
//!
//! ```json
//! "Init"
//! {"DesiredDepth": {"desired_depth": 1.5}}
//! {"DepthData": {"position_m": [0.0, 0.0, -1.2]}}
//! {"ModemStatus": {"msg_id": 16, "attitude_yaw": 450}}
//! ```
//!
//! Outbound commands are JSON encodings of [`UCommand`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Modem record ID of a status message, which carries the vehicle attitude.
pub const MODEM_STATUS_MSG_ID: u8 = 0x10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position estimate from the depth sensor.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct DepthData {
    /// Position of the vehicle. Only the Z component is populated by the depth sensor.
    ///
    /// Units: meters
    pub position_m: [f64; 3],
}

/// Status record reported by the acoustic modem.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct ModemStatus {
    /// Record type identifier, status records use [`MODEM_STATUS_MSG_ID`].
    pub msg_id: u8,

    /// Raw yaw of the vehicle, east of true north.
    ///
    /// Units: tenths of a degree
    pub attitude_yaw: i16,
}

/// Velocity estimate of the vehicle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct VelocityData {
    /// Velocity in the vehicle body frame, X forwards.
    ///
    /// Units: meters/second
    pub velocity_ms: [f64; 3],
}

/// Actuator command produced by one control cycle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct UCommand {
    /// Time at which the command was produced.
    pub stamp: DateTime<Utc>,

    /// Top fin deflection, driven by the heading controller.
    pub fin_top: i32,

    /// Right fin deflection (viewed from the front), driven by the depth controller.
    pub fin_right: i32,

    /// Left fin deflection (viewed from the front), driven by the depth controller.
    pub fin_left: i32,

    /// Thruster level.
    pub thruster: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A message arriving at the control executable.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum InputMsg {
    /// Arms the controller. Has no payload.
    Init,

    DesiredDepth {
        /// Units: meters
        desired_depth: f64,
    },

    DesiredHeading {
        /// Units: degrees
        desired_heading: f64,
    },

    DesiredSpeed {
        /// Thruster level demand
        desired_speed: f64,
    },

    DepthData(DepthData),

    ModemStatus(ModemStatus),

    VelocityData(VelocityData),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DepthData {
    /// The vertical component of the position.
    pub fn depth_m(&self) -> f64 {
        self.position_m[2]
    }
}

impl VelocityData {
    /// The forwards component of the velocity.
    pub fn forward_ms(&self) -> f64 {
        self.velocity_ms[0]
    }
}

impl InputMsg {
    /// Parse a message from its JSON encoding.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str.trim())
    }
}
