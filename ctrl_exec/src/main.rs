//! Main control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging, and control loop
//!     - Start the input source, either a script or the input client
//!     - Main loop:
//!         - Script input replay (if a script is in use)
//!         - Snapshot of the state store and init gate
//!         - Control loop processing
//!         - Command publication and archiving
//!         - Cycle management
//!
//! Network inputs are applied to the state store by the input client's background thread as
//! they arrive, independently of the main loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

// Internal
use comms_if::net::NetParams;
use ctrl_lib::{
    cmd_server::CmdServer, ctrl_loop::InputData, data_store::DataStore, init_gate::InitGate,
    input_client::InputClient, input_sink::InputSink, normaliser::HeadingNormaliser,
    state_store::StateStore,
};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingMsgs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("ctrl_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("AUV Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE INPUT SOURCE ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let script = match args.len() {
        1 => {
            info!("No script provided, inputs will be received via the InputClient\n");
            None
        }
        2 => {
            info!("Loading script from \"{}\"", &args[1]);

            let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} messages\n",
                si.get_duration(),
                si.get_num_msgs()
            );

            Some(si)
        }
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.ctrl_loop
        .init("ctrl_exec.toml", &session)
        .wrap_err("Failed to initialise CtrlLoop")?;

    for violation in ds.ctrl_loop.params().check() {
        warn!("Control parameter check: {}", violation);
    }
    session.save("ctrl_exec_params.json", ds.ctrl_loop.params().clone());

    info!("CtrlLoop init complete");

    let store = Arc::new(StateStore::default());
    let gate = Arc::new(InitGate::default());
    let sink = InputSink::new(
        store.clone(),
        gate.clone(),
        HeadingNormaliser::new(
            ds.ctrl_loop.params().magnetic_declination_deg,
            ds.ctrl_loop.params().status_msg_id,
        ),
    );

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let mut input_source = match script {
        Some(si) => InputSource::Script(si),
        None => {
            let c = InputClient::new(&zmq_ctx, &net_params, sink.clone())
                .wrap_err("Failed to initialise the InputClient")?;
            info!("InputClient initialised");
            InputSource::Remote(c)
        }
    };

    let mut cmd_server = {
        let s = CmdServer::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise the CmdServer")?;
        info!("CmdServer initialised");
        s
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    let cycle_period = ds.ctrl_loop.period();

    info!(
        "Begining main loop with a period of {} ms\n",
        cycle_period.as_millis()
    );

    loop {
        let cycle_start_instant = Instant::now();

        ds.cycle_start();

        // ---- INPUT PROCESSING ----

        match input_source {
            InputSource::Remote(ref client) => {
                if !client.is_connected() && ds.num_cycles % 100 == 0 {
                    debug!("InputClient has no connected publisher");
                }
            }
            InputSource::Script(ref mut si) => match si.get_pending() {
                PendingMsgs::None => (),
                PendingMsgs::Some(msgs) => {
                    for msg in msgs {
                        sink.handle(msg);
                    }
                }
                PendingMsgs::EndOfScript => {
                    info!("End of input script reached, stopping");
                    break;
                }
            },
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        ds.ctrl_loop_input = InputData {
            snapshot: store.snapshot(),
            armed: gate.is_armed(),
        };

        if let Some((o, r)) = ds.ctrl_loop.proc_or_warn(&ds.ctrl_loop_input) {
            ds.ctrl_loop_output = o;
            ds.ctrl_loop_status_rpt = r;

            trace!("CtrlLoop status: {:?}", ds.ctrl_loop_status_rpt);
        }

        // ---- COMMAND OUTPUT ----

        if let Some(ref cmd) = ds.ctrl_loop_output {
            if !cmd_server.is_connected() && ds.num_cmds_emitted % 100 == 0 {
                debug!("CmdServer has no connected subscriber");
            }

            if let Err(e) = cmd_server.send(cmd) {
                ds.num_cmd_send_errors += 1;
                warn!("CmdServer error: {}", e);
            }
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.ctrl_loop.write() {
            warn!("Could not write the CtrlLoop archive: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        let overrun = match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                thread::sleep(d);
                false
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                true
            }
        };

        ds.cycle_end(overrun);
    }

    // ---- SHUTDOWN ----

    info!(
        "Ran {} cycles, emitted {} commands, {} overruns, {} send errors",
        ds.num_cycles, ds.num_cmds_emitted, ds.num_cycle_overruns, ds.num_cmd_send_errors
    );
    info!(
        "Controller output saturated in {} cycles",
        ds.num_saturated_cycles
    );

    if let InputSource::Remote(ref client) = input_source {
        info!("InputClient rejected {} messages", client.num_rejected());
    }

    // Stop the input thread and close sockets before the session exits
    drop(input_source);
    drop(cmd_server);

    info!("End of execution");

    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the inputs to the exec.
enum InputSource {
    Remote(InputClient),
    Script(ScriptInterpreter),
}
