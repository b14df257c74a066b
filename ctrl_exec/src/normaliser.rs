//! # Heading normaliser
//!
//! The modem reports yaw in tenths of a degree relative to magnetic north. The normaliser scales
//! this to degrees and adds the local magnetic declination. No wrapping is applied, so the
//! calibrated heading may fall outside `[0, 360)`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use comms_if::ctrl::ModemStatus;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Scale from raw modem yaw to degrees.
pub const RAW_YAW_TO_DEG: f64 = 0.1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Converts raw modem yaw into calibrated heading.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct HeadingNormaliser {
    /// Units: degrees
    magnetic_declination_deg: f64,

    /// If set only modem records with this ID carry a heading.
    status_msg_id: Option<u8>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadingNormaliser {
    pub fn new(magnetic_declination_deg: f64, status_msg_id: Option<u8>) -> Self {
        Self {
            magnetic_declination_deg,
            status_msg_id,
        }
    }

    /// Convert a raw yaw, in tenths of a degree, into a heading in degrees.
    pub fn calibrate(&self, raw_yaw: i16) -> f64 {
        f64::from(raw_yaw) * RAW_YAW_TO_DEG + self.magnetic_declination_deg
    }

    /// Calibrated heading of a modem record, or `None` if the record is filtered out by its ID.
    pub fn accept(&self, status: &ModemStatus) -> Option<f64> {
        match self.status_msg_id {
            Some(id) if id != status.msg_id => None,
            _ => Some(self.calibrate(status.attitude_yaw)),
        }
    }
}
