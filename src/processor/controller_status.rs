//! Controller status worker
//!
//! Parses status reports from the controller's status queue and pushes
//! the coordinate, feed, and spindle values to the pendant LCD. The
//! coordinate rows are frozen at zero while the axis knob is outside
//! the X/Y/Z detents, and the feed value is only re-sent when it
//! changes.

use crate::config::WORKER_POLL_TIMEOUT;
use pendantkit_communication::{Controller, StatusReport};
use pendantkit_core::{AxisMode, SharedModes};
use pendantkit_pendant::Pendant;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ControllerStatus {
    pub controller: Arc<Controller>,
    pub pendant: Arc<Pendant>,
    pub modes: Arc<SharedModes>,
    pub run: Arc<AtomicBool>,
    pub last_feed: f64,
}

impl ControllerStatus {
    pub fn run(mut self) {
        debug!("Starting controller-status worker");
        while self.run.load(Ordering::Relaxed) {
            let Some(raw) = self.controller.get_status(WORKER_POLL_TIMEOUT) else {
                continue;
            };
            let Some(status) = StatusReport::parse(&raw) else {
                warn!("Unparsable status report: {}", raw);
                continue;
            };
            debug!(
                "Status: {} {:?} {:?} F{} S{}",
                status.state,
                status.coordinate_space,
                status.coordinates,
                status.feed_rate,
                status.spindle_speed
            );

            let coordinates = if self.modes.axis_mode() == AxisMode::Xyz {
                status.coordinates
            } else {
                [0.0; 3]
            };
            let feed = if status.feed_rate != self.last_feed {
                status.feed_rate
            } else {
                0.0
            };
            if let Err(e) = self.pendant.update_display(
                self.modes.motion_mode(),
                status.coordinate_space,
                &coordinates,
                feed as u16,
                status.spindle_speed.min(u16::MAX as u32) as u16,
            ) {
                warn!("Display update failed: {}", e);
            }
            self.last_feed = status.feed_rate;
        }
        debug!("Exit controller-status worker");
    }
}
