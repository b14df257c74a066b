//! # Data Store

use comms_if::ctrl::UCommand;

use crate::ctrl_loop;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    // CtrlLoop
    pub ctrl_loop: ctrl_loop::CtrlLoop,
    pub ctrl_loop_input: ctrl_loop::InputData,
    pub ctrl_loop_output: Option<UCommand>,
    pub ctrl_loop_status_rpt: ctrl_loop::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Total number of cycle overruns
    pub num_cycle_overruns: u64,

    /// Number of commands emitted
    pub num_cmds_emitted: u64,

    /// Number of commands which could not be published
    pub num_cmd_send_errors: u64,

    /// Number of cycles in which the depth or heading output was clamped
    pub num_saturated_cycles: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears the control loop input, output, and report from the previous cycle.
    pub fn cycle_start(&mut self) {
        self.ctrl_loop_input = ctrl_loop::InputData::default();
        self.ctrl_loop_output = None;
        self.ctrl_loop_status_rpt = ctrl_loop::StatusReport::default();
    }

    /// Perform actions required at the end of a cycle.
    ///
    /// `overrun` should be true if the cycle took longer than the period.
    pub fn cycle_end(&mut self, overrun: bool) {
        if overrun {
            self.num_consec_cycle_overruns += 1;
            self.num_cycle_overruns += 1;
        } else {
            self.num_consec_cycle_overruns = 0;
        }

        if self.ctrl_loop_output.is_some() {
            self.num_cmds_emitted += 1;
        }

        let rpt = &self.ctrl_loop_status_rpt;
        if rpt.depth_saturated || rpt.heading_saturated {
            self.num_saturated_cycles += 1;
        }

        self.num_cycles += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_cycle_counters() {
        let mut ds = DataStore::default();

        ds.cycle_start();
        ds.cycle_end(true);
        ds.cycle_start();
        ds.ctrl_loop_output = Some(UCommand {
            stamp: Utc::now(),
            fin_top: 0,
            fin_right: 0,
            fin_left: 0,
            thruster: 0,
        });
        ds.ctrl_loop_status_rpt.heading_saturated = true;
        ds.cycle_end(true);

        assert_eq!(ds.num_cycles, 2);
        assert_eq!(ds.num_consec_cycle_overruns, 2);
        assert_eq!(ds.num_cmds_emitted, 1);

        ds.cycle_start();
        assert!(ds.ctrl_loop_output.is_none());
        assert!(!ds.ctrl_loop_status_rpt.heading_saturated);
        ds.cycle_end(false);

        assert_eq!(ds.num_saturated_cycles, 1);
        assert_eq!(ds.num_consec_cycle_overruns, 0);
        assert_eq!(ds.num_cycle_overruns, 2);
    }
}
