//! # Input Client
//!
//! The InputClient receives setpoints, measurements, and the init signal from the network and
//! applies them to the state store through an [`InputSink`].
//!
//! Data is received on a SUB socket in a background thread, so inputs are applied as soon as
//! they arrive rather than once per cycle. Each message is the JSON encoding of an
//! [`InputMsg`](comms_if::ctrl::InputMsg).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, warn};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crate::input_sink::InputSink;
use comms_if::{
    ctrl::InputMsg,
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout of the input socket, bounds how long shutdown waits on the background thread.
///
/// Units: milliseconds
const INPUT_RECV_TIMEOUT_MS: i32 = 10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct InputClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    num_rejected: Arc<AtomicU64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum InputClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InputClient {
    /// Create a new instance of the InputClient.
    ///
    /// This function will not block until a publisher connects.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        sink: InputSink,
    ) -> Result<Self, InputClientError> {
        let socket_options = socket_options(params);

        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, &params.input_endpoint)
            .map_err(InputClientError::SocketError)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let connected = Arc::new(AtomicBool::new(false));
        let num_rejected = Arc::new(AtomicU64::new(0));

        let bg_run_clone = bg_run.clone();
        let connected_clone = connected.clone();
        let num_rejected_clone = num_rejected.clone();

        let bg_jh = Some(thread::spawn(move || {
            bg_thread(
                socket,
                sink,
                bg_run_clone,
                connected_clone,
                num_rejected_clone,
            )
        }));

        Ok(Self {
            bg_jh,
            bg_run,
            connected,
            num_rejected,
        })
    }

    /// Returns true if a publisher is connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Number of inbound messages that could not be decoded or were filtered out.
    pub fn num_rejected(&self) -> u64 {
        self.num_rejected.load(Ordering::Relaxed)
    }
}

impl Drop for InputClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            jh.join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Options for the input socket, taken from the params if overridden.
///
/// The receive timeout is always finite, otherwise the background thread could block in `recv`
/// forever and never see the shutdown flag.
fn socket_options(params: &NetParams) -> SocketOptions {
    let mut opts = params.input_socket.clone().unwrap_or(SocketOptions {
        connect_timeout: 1000,
        heartbeat_ivl: 500,
        heartbeat_timeout: 1000,
        linger: 1,
        send_timeout: 10,
        ..Default::default()
    });

    if opts.recv_timeout < 0 {
        if params.input_socket.is_some() {
            warn!(
                "Infinite input socket recv_timeout overridden to {} ms",
                INPUT_RECV_TIMEOUT_MS
            );
        }
        opts.recv_timeout = INPUT_RECV_TIMEOUT_MS;
    }

    opts
}

/// Background thread, applies each message to the sink as it arrives.
fn bg_thread(
    socket: MonitoredSocket,
    sink: InputSink,
    run: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    num_rejected: Arc<AtomicU64>,
) {
    while run.load(Ordering::Relaxed) {
        connected.store(socket.connected(), Ordering::Relaxed);

        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message received on the input socket");
                num_rejected.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving input message: {:?}", e);
                break;
            }
        };

        let input = match InputMsg::from_json(&msg) {
            Ok(i) => i,
            Err(e) => {
                warn!("Could not decode input message \"{}\": {}", msg, e);
                num_rejected.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        };

        if !sink.handle(input) {
            num_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }
}
