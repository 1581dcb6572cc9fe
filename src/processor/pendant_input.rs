//! Pendant input worker
//!
//! Decodes pendant reports and turns them into GRBL traffic. This
//! worker is the sole writer of the shared motion and axis modes.

use crate::config::{JOG_SPEED, MAX_SPEED, WORKER_POLL_TIMEOUT};
use crate::magic::execute_magic_list;
use pendantkit_communication::{Controller, RealtimeCommand};
use pendantkit_core::{AxisMode, MacroSet, MotionMode, SharedModes};
use pendantkit_pendant::{
    axis_mode_for, decode_key, increment, AxisSelector, InputReport, Keycap, Pendant,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct PendantInput {
    pub pendant: Arc<Pendant>,
    pub controller: Arc<Controller>,
    pub modes: Arc<SharedModes>,
    pub macros: Arc<MacroSet>,
    pub run: Arc<AtomicBool>,
    pub spindle_on: bool,
}

impl PendantInput {
    pub fn run(mut self) {
        debug!("Starting pendant-input worker");
        while self.run.load(Ordering::Relaxed) {
            let Some(input) = self.pendant.get_input(WORKER_POLL_TIMEOUT) else {
                continue;
            };
            self.modes.set_axis_mode(axis_mode_for(input.axis));
            if !input.is_idle() {
                info!(
                    "Pendant input: key1={:#04x} key2={:#04x} incr={:#04x} axis={:#04x} jog={}",
                    input.key1, input.key2, input.incr, input.axis, input.jog
                );
            }

            if let Some(key) = decode_key(input.key1, input.key2) {
                if self.handle_key(key) {
                    break;
                }
            }
            self.handle_jog(&input);
        }
        debug!("Exit pendant-input worker");
    }

    /// Dispatch one keycap. Returns true when the worker should exit.
    fn handle_key(&mut self, key: Keycap) -> bool {
        match key {
            Keycap::Reset => {
                debug!("Reset and unlock GRBL");
                self.send_realtime(RealtimeCommand::Reset);
                match self.controller.kill_alarm_lock() {
                    Ok(reply) if !reply.is_empty() => info!("Kill alarm: {}", reply),
                    Ok(_) => {}
                    Err(e) => error!("Kill alarm failed: {}", e),
                }
            }
            Keycap::Stop => {
                debug!("Stop: feed hold");
                self.send_realtime(RealtimeCommand::FeedHold);
            }
            Keycap::StartPause => {
                debug!("StartPause: cycle start");
                self.send_realtime(RealtimeCommand::CycleStart);
            }
            Keycap::SpindleToggle => {
                let command = if self.spindle_on { "M5" } else { "M3" };
                debug!("Spindle: {}", if self.spindle_on { "off" } else { "on" });
                self.spindle_on = !self.spindle_on;
                if let Err(e) = self.controller.stream_line(command) {
                    error!("Spindle command failed: {}", e);
                }
            }
            Keycap::Continuous => {
                self.modes.set_motion_mode(MotionMode::Cont);
                debug!("Continuous: motion mode set");
            }
            Keycap::Step => {
                self.modes.set_motion_mode(MotionMode::Step);
                debug!("Step: motion mode set");
            }
            Keycap::PendantReset => {
                debug!("PendantReset: bring out of reset");
                if let Err(e) = self.pendant.reset(self.modes.motion_mode()) {
                    error!("Pendant reset failed: {}", e);
                }
            }
            Keycap::ApplicationExit => {
                debug!("ApplicationExit: shutdown");
                self.run.store(false, Ordering::Relaxed);
                return true;
            }
            Keycap::Macro(num) => self.run_macro(num),
            Keycap::Fn => debug!("Fn"),
            Keycap::FeedPlus
            | Keycap::FeedMinus
            | Keycap::SpindlePlus
            | Keycap::SpindleMinus
            | Keycap::MachineHome
            | Keycap::SafeZ
            | Keycap::WorkHome
            | Keycap::ProbeZ => {
                warn!("Unimplemented key: {:?}", key);
            }
        }
        false
    }

    fn run_macro(&self, num: u8) {
        let Some(macro_def) = self.macros.get(num) else {
            error!("Undefined macro: Macro-{}", num);
            return;
        };
        debug!("Macro-{}: {}", num, macro_def.description);

        execute_magic_list(&macro_def.before, &self.controller, &self.modes);
        if let Some(commands) = &macro_def.commands {
            if let Err(e) = self.controller.stream_line(commands) {
                error!("Macro-{} command failed: {}", num, e);
            }
        }
        execute_magic_list(&macro_def.after, &self.controller, &self.modes);
    }

    fn handle_jog(&self, input: &InputReport) {
        if input.jog == 0 {
            return;
        }
        match self.modes.axis_mode() {
            AxisMode::Xyz => {
                let mode = self.modes.motion_mode();
                let Some(incr) = increment(mode, input.incr) else {
                    return;
                };
                let (distance, speed) = match mode {
                    MotionMode::Step => (input.jog as f64 * incr, JOG_SPEED),
                    MotionMode::Cont => {
                        let sign = if input.jog > 0 { 1.0 } else { -1.0 };
                        (1.0, MAX_SPEED * incr * sign)
                    }
                    MotionMode::Mpg | MotionMode::Pct => return,
                };
                let Some(axis) =
                    AxisSelector::from_byte(input.axis).and_then(AxisSelector::letter)
                else {
                    return;
                };
                debug!("Jog: {}{} F{}", axis, distance, speed);
                if let Err(e) = self.controller.jog_incremental_axis(axis, distance, speed) {
                    error!("Jog failed: {}", e);
                }
            }
            AxisMode::Abc => error!("ABC-axis jogging not implemented"),
            AxisMode::Off => {}
        }
    }

    fn send_realtime(&self, command: RealtimeCommand) {
        if let Err(e) = self.controller.realtime_command(command) {
            error!("Realtime {} failed: {}", command, e);
        }
    }
}
