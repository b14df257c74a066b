//! # Setpoint and measurement state store
//!
//! Holds the latest desired and actual values for each control axis. Producers (the input client
//! thread or the script replay) write fields independently, the control loop reads a
//! [`Snapshot`] once per tick.
//!
//! Each field is stored as the bit pattern of an `f64` in an `AtomicU64`, so a single field can
//! never be torn. There is no atomicity across fields: a snapshot taken while a producer is
//! writing may see the new value of one field and the old value of another. Every field is
//! last-writer-wins and starts at zero.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An `f64` which can be shared between threads.
#[derive(Debug)]
struct AtomicF64(AtomicU64);

/// Shared store of the latest setpoints and measurements.
#[derive(Debug, Default)]
pub struct StateStore {
    desired_depth: AtomicF64,
    desired_heading: AtomicF64,
    desired_speed: AtomicF64,

    actual_depth: AtomicF64,
    actual_heading: AtomicF64,
    actual_speed: AtomicF64,
}

/// Operator demands.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct SetpointVector {
    /// Units: meters
    pub desired_depth: f64,

    /// Units: degrees
    pub desired_heading: f64,

    /// Thruster level demand
    pub desired_speed: f64,
}

/// Sensor measurements.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementVector {
    /// Vertical position reported by the depth sensor, negative below the surface.
    ///
    /// Units: meters
    pub actual_depth: f64,

    /// Calibrated heading.
    ///
    /// Units: degrees
    pub actual_heading: f64,

    /// Forwards velocity, only used by speed PID control.
    ///
    /// Units: meters/second
    pub actual_speed: f64,
}

/// Values read from the store at the start of a tick.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub setpoints: SetpointVector,
    pub measurements: MeasurementVector,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed)
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self(AtomicU64::new(0f64.to_bits()))
    }
}

impl StateStore {
    pub fn set_desired_depth(&self, value: f64) {
        self.desired_depth.store(value)
    }

    pub fn set_desired_heading(&self, value: f64) {
        self.desired_heading.store(value)
    }

    pub fn set_desired_speed(&self, value: f64) {
        self.desired_speed.store(value)
    }

    pub fn set_actual_depth(&self, value: f64) {
        self.actual_depth.store(value)
    }

    /// Set the heading measurement, which must already be calibrated.
    pub fn set_actual_heading(&self, value: f64) {
        self.actual_heading.store(value)
    }

    pub fn set_actual_speed(&self, value: f64) {
        self.actual_speed.store(value)
    }

    /// Read every field of the store.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            setpoints: SetpointVector {
                desired_depth: self.desired_depth.load(),
                desired_heading: self.desired_heading.load(),
                desired_speed: self.desired_speed.load(),
            },
            measurements: MeasurementVector {
                actual_depth: self.actual_depth.load(),
                actual_heading: self.actual_heading.load(),
                actual_speed: self.actual_speed.load(),
            },
        }
    }
}
