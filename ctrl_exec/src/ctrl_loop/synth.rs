//! Actuator command synthesis
//!
//! Maps the per-axis controller outputs onto the fin and thruster command vector.
//!
//! Fin and thruster demands are integer actuator units. Values are truncated towards zero,
//! saturating at the limits of `i32`, with NaN becoming zero.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};

use super::FinMapping;
use comms_if::ctrl::UCommand;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the command for one tick.
///
/// ## Arguments
/// - `mapping`: the fin mapping to apply
/// - `depth_output`: output of the depth controller, drives the side fins
/// - `heading_output`: output of the heading controller, drives the top fin
/// - `thruster_level`: demanded thruster level
/// - `stamp`: time at which the command is produced
pub fn synthesize(
    mapping: &FinMapping,
    depth_output: f64,
    heading_output: f64,
    thruster_level: f64,
    stamp: DateTime<Utc>,
) -> UCommand {
    let fin_top = to_actuator_units(heading_output);
    let fin_right = to_actuator_units(-depth_output);
    let fin_left = to_actuator_units(depth_output);
    let thruster = to_actuator_units(thruster_level);

    match *mapping {
        FinMapping::Simple => UCommand {
            stamp,
            fin_top,
            fin_right,
            fin_left,
            thruster,
        },
        FinMapping::TrimOffset {
            trim_ratio,
            top_fin_offset,
            right_fin_offset,
            left_fin_offset,
        } => {
            // Trim is applied to the already truncated demands
            let trim = trim_ratio * f64::from(thruster);

            UCommand {
                stamp,
                fin_top: to_actuator_units(f64::from(fin_top) + trim + top_fin_offset),
                fin_right: to_actuator_units(f64::from(fin_right) + trim + right_fin_offset),
                fin_left: to_actuator_units(f64::from(fin_left) + trim + left_fin_offset),
                thruster,
            }
        }
    }
}

/// Convert a demand into integer actuator units.
pub fn to_actuator_units(value: f64) -> i32 {
    // `as` truncates towards zero, saturates, and maps NaN to zero
    value as i32
}
