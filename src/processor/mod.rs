//! Event coordinator
//!
//! Wires the pendant and controller clients together through four
//! workers:
//!
//! - **pendant-input**: decodes pendant events into GRBL commands; the
//!   sole writer of the shared motion/axis modes
//! - **controller-input**: consumes non-status controller packets
//! - **controller-status**: parses status reports and drives the LCD
//! - **status-poller**: requests a status report every poll interval
//!
//! Together with the two device reader threads this is the bridge's
//! whole thread complement. Shutdown is cooperative and ordered: poller
//! first, then pendant-input, then the controller client (whose poke
//! unblocks its reader), then the remaining consumers.

pub mod controller_input;
pub mod controller_status;
pub mod pendant_input;
pub mod poller;

use crate::config::STATUS_POLL_INTERVAL;
use crossbeam_channel::{bounded, Sender};
use pendantkit_communication::Controller;
use pendantkit_core::{MacroSet, SharedModes};
use pendantkit_pendant::Pendant;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Coordinator tuning.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Interval between `?` status polls.
    pub status_poll_interval: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            status_poll_interval: STATUS_POLL_INTERVAL,
        }
    }
}

/// The running coordinator.
pub struct Processor {
    controller: Arc<Controller>,
    pendant: Arc<Pendant>,
    run: Arc<AtomicBool>,
    poller_stop: Sender<()>,
    poller: Option<JoinHandle<()>>,
    pendant_input: Option<JoinHandle<()>>,
    controller_input: Option<JoinHandle<()>>,
    controller_status: Option<JoinHandle<()>>,
}

impl Processor {
    /// Spawn the four workers. `run` is the process-wide run flag shared
    /// with the signal handler and the device clients.
    pub fn start(
        controller: Arc<Controller>,
        pendant: Arc<Pendant>,
        macros: MacroSet,
        run: Arc<AtomicBool>,
        config: ProcessorConfig,
    ) -> Self {
        let modes = Arc::new(SharedModes::default());
        let (poller_stop, poller_stop_rx) = bounded(1);

        let pendant_input = pendant_input::PendantInput {
            pendant: Arc::clone(&pendant),
            controller: Arc::clone(&controller),
            modes: Arc::clone(&modes),
            macros: Arc::new(macros),
            run: Arc::clone(&run),
            spindle_on: false,
        };
        let controller_input = controller_input::ControllerInput {
            controller: Arc::clone(&controller),
            run: Arc::clone(&run),
        };
        let controller_status = controller_status::ControllerStatus {
            controller: Arc::clone(&controller),
            pendant: Arc::clone(&pendant),
            modes: Arc::clone(&modes),
            run: Arc::clone(&run),
            last_feed: 0.0,
        };
        let status_poller = poller::StatusPoller {
            controller: Arc::clone(&controller),
            run: Arc::clone(&run),
            stop: poller_stop_rx,
            interval: config.status_poll_interval,
        };

        Self {
            controller,
            pendant,
            run,
            poller_stop,
            poller: Some(spawn_worker("status-poller", move || status_poller.run())),
            pendant_input: Some(spawn_worker("pendant-input", move || pendant_input.run())),
            controller_input: Some(spawn_worker("controller-input", move || {
                controller_input.run()
            })),
            controller_status: Some(spawn_worker("controller-status", move || {
                controller_status.run()
            })),
        }
    }

    /// Whether the pendant-input worker is still dispatching. The bridge
    /// has no work to do once it exits.
    pub fn is_alive(&self) -> bool {
        self.pendant_input
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop every worker in dependency order and close both clients.
    pub fn shutdown(mut self) {
        debug!("Shutting down processor");
        let _ = self.poller_stop.try_send(());
        join_worker("status-poller", self.poller.take());

        self.run.store(false, Ordering::Relaxed);
        join_worker("pendant-input", self.pendant_input.take());

        // Closing the controller pokes its reader out of a blocked read,
        // after which the two consumers drain out on their own.
        self.controller.shutdown();
        if !self.controller.is_shutdown() {
            warn!("Controller did not shut down cleanly");
        }
        join_worker("controller-input", self.controller_input.take());
        join_worker("controller-status", self.controller_status.take());

        self.pendant.shutdown();
        debug!("Processor shut down");
    }
}

fn spawn_worker(name: &str, body: impl FnOnce() + Send + 'static) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .unwrap_or_else(|e| panic!("failed to spawn {} thread: {}", name, e))
}

fn join_worker(name: &str, handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else {
        warn!("{} thread not running", name);
        return;
    };
    debug!("Waiting for {} thread to end", name);
    if handle.join().is_err() {
        error!("{} thread panicked", name);
    }
    debug!("{} thread done", name);
}
