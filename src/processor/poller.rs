//! Status poller
//!
//! Requests a `?` status report on a fixed interval. The wait is a
//! receive on the stop channel, so shutdown interrupts the sleep
//! immediately.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use pendantkit_communication::{Controller, RealtimeCommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

pub struct StatusPoller {
    pub controller: Arc<Controller>,
    pub run: Arc<AtomicBool>,
    pub stop: Receiver<()>,
    pub interval: Duration,
}

impl StatusPoller {
    pub fn run(self) {
        debug!("Starting status-poller worker");
        loop {
            match self.stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if !self.run.load(Ordering::Relaxed) {
                        break;
                    }
                    trace!("Polling status");
                    if let Err(e) = self.controller.realtime_command(RealtimeCommand::Status) {
                        warn!("Status poll failed: {}", e);
                    }
                }
                // Stop signal, or the processor went away.
                _ => break,
            }
        }
        debug!("Exit status-poller worker");
    }
}
