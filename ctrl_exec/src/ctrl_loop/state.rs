//! Implementations for the CtrlLoop state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::{DateTime, Utc};
use log::trace;
use serde::Serialize;
use std::time::Duration;

// Internal
use super::{synth, CtrlLoopError, Params, SpeedControl};
use crate::{pid::PidController, state_store::Snapshot};
use comms_if::ctrl::UCommand;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Session relative path of the command archive.
const COMMANDS_ARCH_PATH: &str = "ctrl_loop/commands.csv";

/// Session relative path of the status report archive.
const STATUS_ARCH_PATH: &str = "ctrl_loop/status.csv";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Control loop module state
pub struct CtrlLoop {
    pub(crate) params: Params,

    depth_pid: PidController,
    heading_pid: PidController,

    /// Only present when the speed control mode is `Pid`.
    speed_pid: Option<PidController>,

    pub(crate) report: StatusReport,

    pub(crate) last_cmd: Option<UCommand>,
    arch_cmd: Archiver,
    arch_status: Archiver,
}

/// Input data to the control loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// Setpoints and measurements read at the start of this cycle
    pub snapshot: Snapshot,

    /// State of the init gate at the start of this cycle
    pub armed: bool,
}

/// Status report for control loop processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub armed: bool,

    pub depth_output: f64,
    pub heading_output: f64,
    pub thruster_level: f64,

    pub depth_saturated: bool,
    pub heading_saturated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlLoop {
    /// Build the control loop from its parameters, with freshly calibrated controllers.
    ///
    /// Archiving is disabled until the module is initialised with a session.
    pub fn new(params: Params) -> Self {
        let period_s = params.period_s();
        let anti_windup = params.anti_windup();

        let depth_pid = PidController::calibrate(params.depth.gains(period_s), anti_windup);
        let heading_pid = PidController::calibrate(params.heading.gains(period_s), anti_windup);
        let speed_pid = match params.speed_control {
            SpeedControl::Passthrough => None,
            SpeedControl::Pid(ref a) => {
                Some(PidController::calibrate(a.gains(period_s), anti_windup))
            }
        };

        Self {
            params,
            depth_pid,
            heading_pid,
            speed_pid,
            report: StatusReport::default(),
            last_cmd: None,
            arch_cmd: Archiver::default(),
            arch_status: Archiver::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Period at which `tick` is expected to be called.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.params.timer_period_ms)
    }

    /// Run one control cycle.
    ///
    /// If `armed` is false nothing is computed and no command is produced. Otherwise each
    /// controller is stepped exactly once and a command stamped with `stamp` is returned.
    pub fn tick(
        &mut self,
        snapshot: &Snapshot,
        armed: bool,
        stamp: DateTime<Utc>,
    ) -> (Option<UCommand>, StatusReport) {
        self.report = StatusReport {
            armed,
            ..Default::default()
        };
        self.last_cmd = None;

        if !armed {
            return (None, self.report);
        }

        let sp = &snapshot.setpoints;
        let meas = &snapshot.measurements;

        // The depth sensor reports vertical position, which is negative below the surface
        let depth_output = self.depth_pid.compute(sp.desired_depth, -meas.actual_depth);
        let heading_output = self
            .heading_pid
            .compute(sp.desired_heading, meas.actual_heading);
        let thruster_level = match self.speed_pid {
            Some(ref mut pid) => pid.compute(sp.desired_speed, meas.actual_speed),
            None => sp.desired_speed,
        };

        trace!(
            "CtrlLoop outputs: depth {:.3}, heading {:.3}, thruster {:.3}",
            depth_output,
            heading_output,
            thruster_level
        );

        let cmd = synth::synthesize(
            &self.params.fin_mapping,
            depth_output,
            heading_output,
            thruster_level,
            stamp,
        );

        self.report.depth_output = depth_output;
        self.report.heading_output = heading_output;
        self.report.thruster_level = thruster_level;
        self.report.depth_saturated = self.depth_pid.is_saturated();
        self.report.heading_saturated = self.heading_pid.is_saturated();

        self.last_cmd = Some(cmd);

        (Some(cmd), self.report)
    }
}

impl Default for CtrlLoop {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl State for CtrlLoop {
    const NAME: &'static str = "CtrlLoop";

    type InitData = &'static str;
    type InitError = CtrlLoopError;

    type InputData = InputData;
    type OutputData = Option<UCommand>;
    type StatusReport = StatusReport;
    type ProcError = CtrlLoopError;

    /// Initialise the control loop.
    ///
    /// Expected init data is the path to the parameter file. Any controller state is reset.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data).map_err(CtrlLoopError::ParamLoadError)?;

        *self = Self::new(params);

        if self.params.archive_commands {
            self.arch_cmd = Archiver::from_path(session, COMMANDS_ARCH_PATH)
                .map_err(CtrlLoopError::ArchiveError)?;
            self.arch_status = Archiver::from_path(session, STATUS_ARCH_PATH)
                .map_err(CtrlLoopError::ArchiveError)?;
        }

        Ok(())
    }

    /// Perform cyclic processing of the control loop, stamping any command with the current time.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        Ok(self.tick(&input_data.snapshot, input_data.armed, Utc::now()))
    }
}

impl Archived for CtrlLoop {
    fn write(&mut self) -> Result<(), ArchiveError> {
        // One status row per cycle, armed or not
        self.arch_status.serialise(self.report)?;

        match self.last_cmd {
            Some(cmd) => self.arch_cmd.serialise(cmd),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ctrl_loop::{AxisParams, FinMapping};
    use crate::state_store::{MeasurementVector, SetpointVector};

    fn axis(k_p: f64) -> AxisParams {
        AxisParams {
            k_p,
            k_i: 0.0,
            k_d: 0.0,
            min_output: -30.0,
            max_output: 30.0,
            bias: 0.0,
        }
    }

    fn params() -> Params {
        Params {
            depth: axis(10.0),
            heading: axis(1.0),
            ..Params::default()
        }
    }

    fn snapshot(desired_depth: f64, actual_depth: f64, desired_speed: f64) -> Snapshot {
        Snapshot {
            setpoints: SetpointVector {
                desired_depth,
                desired_heading: 0.0,
                desired_speed,
            },
            measurements: MeasurementVector {
                actual_depth,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_unarmed_emits_nothing() {
        let mut cl = CtrlLoop::new(params());

        let (cmd, rpt) = cl.tick(&snapshot(2.0, 0.0, 20.0), false, Utc::now());

        assert!(cmd.is_none());
        assert!(!rpt.armed);
        assert_eq!(rpt.depth_output, 0.0);
        assert!(cl.last_cmd.is_none());
    }

    #[test]
    fn test_depth_sign_convention() {
        let mut cl = CtrlLoop::new(params());

        // Sensor reports -1.5 m (below the surface), demand 2 m, error is 0.5 m
        let (cmd, rpt) = cl.tick(&snapshot(2.0, -1.5, 0.0), true, Utc::now());
        let cmd = cmd.unwrap();

        assert!((rpt.depth_output - 5.0).abs() < 1e-9);
        assert_eq!(cmd.fin_left, 5);
        assert_eq!(cmd.fin_right, -5);
    }

    #[test]
    fn test_speed_passthrough() {
        let mut cl = CtrlLoop::new(params());

        let (cmd, rpt) = cl.tick(&snapshot(0.0, 0.0, 42.7), true, Utc::now());

        assert_eq!(cmd.unwrap().thruster, 42);
        assert_eq!(rpt.thruster_level, 42.7);
    }

    #[test]
    fn test_speed_pid() {
        let mut p = params();
        p.speed_control = SpeedControl::Pid(AxisParams {
            k_p: 2.0,
            min_output: 0.0,
            max_output: 100.0,
            ..AxisParams::default()
        });
        let mut cl = CtrlLoop::new(p);

        let mut snap = snapshot(0.0, 0.0, 3.0);
        snap.measurements.actual_speed = 1.0;

        let (cmd, _) = cl.tick(&snap, true, Utc::now());
        assert_eq!(cmd.unwrap().thruster, 4);
    }

    #[test]
    fn test_saturation_reported() {
        let mut cl = CtrlLoop::new(params());

        let (cmd, rpt) = cl.tick(&snapshot(100.0, 0.0, 0.0), true, Utc::now());

        assert_eq!(cmd.unwrap().fin_left, 30);
        assert!(rpt.depth_saturated);
        assert!(!rpt.heading_saturated);
    }

    #[test]
    fn test_trim_offset_applied() {
        let mut p = params();
        p.fin_mapping = FinMapping::TrimOffset {
            trim_ratio: 0.5,
            top_fin_offset: 0.0,
            right_fin_offset: 0.0,
            left_fin_offset: 0.0,
        };
        let mut cl = CtrlLoop::new(p);

        let (cmd, _) = cl.tick(&snapshot(0.0, 0.0, 10.0), true, Utc::now());
        let cmd = cmd.unwrap();

        assert_eq!(cmd.fin_top, 5);
        assert_eq!(cmd.fin_right, 5);
        assert_eq!(cmd.fin_left, 5);
    }

    #[test]
    fn test_proc_uses_input_data() {
        let mut cl = CtrlLoop::new(params());

        let input = InputData {
            snapshot: snapshot(1.0, 0.0, 0.0),
            armed: true,
        };
        let (cmd, rpt) = cl.proc(&input).unwrap();

        assert_eq!(cmd.unwrap().fin_left, 10);
        assert!(rpt.armed);
    }

    #[test]
    fn test_status_archived_every_cycle() {
        let path = std::env::temp_dir()
            .join(format!("ctrl_loop_status_test_{}", std::process::id()))
            .join("status.csv");

        let mut cl = CtrlLoop::new(params());
        cl.arch_status = Archiver::new(&path).unwrap();

        cl.tick(&snapshot(1.0, 0.0, 0.0), false, Utc::now());
        cl.write().unwrap();
        cl.tick(&snapshot(100.0, 0.0, 0.0), true, Utc::now());
        cl.write().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(
            lines[0],
            "armed,depth_output,heading_output,thruster_level,depth_saturated,heading_saturated"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("false,"));
        assert!(lines[2].starts_with("true,30.0,"));
        assert!(lines[2].ends_with(",true,false"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_archive_disabled_by_default() {
        let mut cl = CtrlLoop::new(params());
        cl.tick(&snapshot(1.0, 0.0, 0.0), true, Utc::now());
        assert!(cl.write().is_ok());
    }
}
