//! Integration tests driving the control loop through the shared input path.
//!
//! Inputs are applied through an `InputSink` exactly as the executable does, and the loop is
//! ticked by hand with snapshots taken from the store, so no timer or network is involved.

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use comms_if::ctrl::{DepthData, InputMsg, ModemStatus, UCommand};
use ctrl_lib::{
    ctrl_loop::{AxisParams, CtrlLoop, Params},
    init_gate::InitGate,
    input_sink::InputSink,
    normaliser::HeadingNormaliser,
    state_store::StateStore,
};

const FIN_LIMIT: f64 = 25.0;

struct Harness {
    store: Arc<StateStore>,
    gate: Arc<InitGate>,
    sink: InputSink,
    ctrl_loop: CtrlLoop,
}

fn params() -> Params {
    let params_str = r#"
        timer_period_ms = 80
        status_msg_id = 16

        [depth]
        k_p = 20.0
        k_i = 2.0
        k_d = 0.5
        min_output = -25.0
        max_output = 25.0

        [heading]
        k_p = 0.8
        k_i = 0.05
        k_d = 0.1
        min_output = -25.0
        max_output = 25.0
    "#;

    util::params::parse(params_str).unwrap()
}

impl Harness {
    fn new(params: Params) -> Self {
        let store = Arc::new(StateStore::default());
        let gate = Arc::new(InitGate::default());
        let sink = InputSink::new(
            store.clone(),
            gate.clone(),
            HeadingNormaliser::new(params.magnetic_declination_deg, params.status_msg_id),
        );

        Self {
            store,
            gate,
            sink,
            ctrl_loop: CtrlLoop::new(params),
        }
    }

    fn tick(&mut self, cycle: i64) -> Option<UCommand> {
        let stamp =
            Utc.timestamp_opt(1_600_000_000, 0).unwrap() + Duration::milliseconds(80 * cycle);
        let (cmd, rpt) = self
            .ctrl_loop
            .tick(&self.store.snapshot(), self.gate.is_armed(), stamp);

        assert_eq!(rpt.armed, cmd.is_some());
        if let Some(c) = cmd {
            assert_eq!(c.stamp, stamp);
        }

        cmd
    }
}

#[test]
fn test_no_commands_before_init() {
    let mut h = Harness::new(params());

    h.sink.handle(InputMsg::DesiredDepth { desired_depth: 2.0 });
    h.sink.handle(InputMsg::DesiredSpeed { desired_speed: 30.0 });

    for i in 0..25 {
        assert!(h.tick(i).is_none());
    }
}

#[test]
fn test_one_command_per_tick_once_armed() {
    let mut h = Harness::new(params());

    h.sink.handle(InputMsg::DesiredDepth { desired_depth: 2.0 });
    h.sink.handle(InputMsg::DesiredHeading { desired_heading: 90.0 });
    h.sink.handle(InputMsg::DesiredSpeed { desired_speed: 30.0 });
    h.sink.handle(InputMsg::Init);

    let mut depth_m = 0.0;
    for i in 0..100 {
        h.sink.handle(InputMsg::DepthData(DepthData {
            position_m: [0.0, 0.0, -depth_m],
        }));

        let cmd = h.tick(i).expect("Armed loop must emit every tick");

        for &fin in &[cmd.fin_top, cmd.fin_right, cmd.fin_left] {
            assert!(f64::from(fin).abs() <= FIN_LIMIT, "Fin out of bounds: {:?}", cmd);
        }
        assert_eq!(cmd.fin_right, -cmd.fin_left);
        assert_eq!(cmd.thruster, 30);

        // Crude plant, fins push the vehicle down
        depth_m += 0.001 * f64::from(cmd.fin_left);
    }
}

#[test]
fn test_repeated_init_is_harmless() {
    let mut h = Harness::new(params());

    h.sink.handle(InputMsg::Init);
    assert!(h.tick(0).is_some());

    h.sink.handle(InputMsg::Init);
    assert!(h.gate.is_armed());
    assert!(h.tick(1).is_some());
}

#[test]
fn test_heading_filtered_by_msg_id() {
    let mut p = params();
    p.heading = AxisParams {
        k_p: 1.0,
        k_i: 0.0,
        k_d: 0.0,
        min_output: -100.0,
        max_output: 100.0,
        bias: 0.0,
    };
    let mut h = Harness::new(p);

    h.sink.handle(InputMsg::Init);
    h.sink.handle(InputMsg::DesiredHeading { desired_heading: 60.0 });

    // Accepted record, heading is 45.0 + 10.7
    h.sink.handle(InputMsg::ModemStatus(ModemStatus {
        msg_id: 0x10,
        attitude_yaw: 450,
    }));
    // Rejected record must not change the measured heading
    h.sink.handle(InputMsg::ModemStatus(ModemStatus {
        msg_id: 0x02,
        attitude_yaw: 0,
    }));

    let cmd = h.tick(0).unwrap();

    // Error of 60 - 55.7 = 4.3 truncates to 4
    assert_eq!(cmd.fin_top, 4);
}

#[test]
fn test_stale_inputs_reused() {
    let mut p = params();
    p.depth.k_i = 0.0;
    p.depth.k_d = 0.0;
    let mut h = Harness::new(p);

    h.sink.handle(InputMsg::Init);
    h.sink.handle(InputMsg::DesiredDepth { desired_depth: 1.0 });
    h.sink.handle(InputMsg::DepthData(DepthData {
        position_m: [0.0, 0.0, -0.5],
    }));

    // No new measurements, the same command is produced each tick
    let first = h.tick(0).unwrap();
    for i in 1..10 {
        let cmd = h.tick(i).unwrap();
        assert_eq!(cmd.fin_left, first.fin_left);
        assert_eq!(cmd.fin_left, 10);
    }
}
