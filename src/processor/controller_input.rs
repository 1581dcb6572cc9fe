//! Controller input worker
//!
//! Drains the controller's non-status packets. Startup blocks and
//! feedback messages mean the machine state may have jumped, so they
//! trigger an immediate status poll to refresh the pendant display
//! through the normal status path. `$N=V` parameter lines are logged
//! with their decoded setting names.

use crate::config::WORKER_POLL_TIMEOUT;
use pendantkit_communication::{setting_description, Controller, Packet, RealtimeCommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ControllerInput {
    pub controller: Arc<Controller>,
    pub run: Arc<AtomicBool>,
}

impl ControllerInput {
    pub fn run(self) {
        debug!("Starting controller-input worker");
        while self.run.load(Ordering::Relaxed) {
            let Some(packet) = self.controller.get_input(WORKER_POLL_TIMEOUT) else {
                continue;
            };
            match packet {
                Packet::Startup(line) => {
                    info!("Startup block: {}", line);
                    self.request_display_refresh();
                }
                Packet::Feedback(line) => {
                    info!("Feedback: {}", line);
                    self.request_display_refresh();
                }
                Packet::Parameter(line) => log_parameter(&line),
                Packet::GcodeState(line) => info!("Parser state: {}", line),
                Packet::Build(line) => info!("Build info: {}", line),
                Packet::Echo(line) => debug!("Echo: {}", line),
                Packet::Standard(line) => info!("Controller: {}", line),
                // Acks and status reports never reach the input queue.
                other => debug!("Unexpected input packet: {}", other),
            }
        }
        debug!("Exit controller-input worker");
    }

    fn request_display_refresh(&self) {
        if let Err(e) = self.controller.realtime_command(RealtimeCommand::Status) {
            warn!("Display refresh poll failed: {}", e);
        }
    }
}

fn log_parameter(line: &str) {
    if let Some(rest) = line.strip_prefix('$') {
        if let Some((number, value)) = rest.split_once('=') {
            if let Ok(number) = number.trim().parse::<u32>() {
                match setting_description(number) {
                    Some((name, units)) => {
                        info!("Setting ${}={} ({}, {})", number, value, name, units)
                    }
                    None => info!("Setting ${}={}", number, value),
                }
                return;
            }
        }
    }
    info!("Parameter: {}", line);
}
