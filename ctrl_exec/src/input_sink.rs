//! # Input sink
//!
//! Applies inbound messages to the shared state store and init gate. The sink is cheap to clone
//! so that each producer (the input client's background thread, or the script replay on the
//! main thread) can own one.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use std::sync::Arc;

use crate::{init_gate::InitGate, normaliser::HeadingNormaliser, state_store::StateStore};
use comms_if::ctrl::InputMsg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct InputSink {
    store: Arc<StateStore>,
    gate: Arc<InitGate>,
    normaliser: HeadingNormaliser,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl InputSink {
    pub fn new(store: Arc<StateStore>, gate: Arc<InitGate>, normaliser: HeadingNormaliser) -> Self {
        Self {
            store,
            gate,
            normaliser,
        }
    }

    /// Apply a message.
    ///
    /// Returns false if the message was rejected, which only happens for modem records filtered
    /// out by their ID.
    pub fn handle(&self, msg: InputMsg) -> bool {
        match msg {
            InputMsg::Init => {
                if !self.gate.arm() {
                    debug!("Init signal received while already armed");
                }
            }
            InputMsg::DesiredDepth { desired_depth } => {
                debug!("Desired depth: {} m", desired_depth);
                self.store.set_desired_depth(desired_depth)
            }
            InputMsg::DesiredHeading { desired_heading } => {
                debug!("Desired heading: {} deg", desired_heading);
                self.store.set_desired_heading(desired_heading)
            }
            InputMsg::DesiredSpeed { desired_speed } => {
                debug!("Desired speed: {}", desired_speed);
                self.store.set_desired_speed(desired_speed)
            }
            InputMsg::DepthData(d) => self.store.set_actual_depth(d.depth_m()),
            InputMsg::ModemStatus(s) => match self.normaliser.accept(&s) {
                Some(heading) => {
                    debug!("Heading: {:.1} deg (raw {})", heading, s.attitude_yaw);
                    self.store.set_actual_heading(heading)
                }
                None => {
                    warn!("Ignoring modem record with ID {:#04x}", s.msg_id);
                    return false;
                }
            },
            InputMsg::VelocityData(v) => self.store.set_actual_speed(v.forward_ms()),
        }

        true
    }
}
