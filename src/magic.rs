//! Magic commands
//!
//! Named host-side actions callable from macro `before`/`after` lists:
//! the `$` views, the realtime control bytes, and a `DUMP_STATE`
//! diagnostic. Macro files are validated against [`MAGIC_NAMES`] at
//! load, so execution only ever sees known names.

use pendantkit_communication::{Controller, DollarCommand, RealtimeCommand};
use pendantkit_core::{Result, SharedModes};
use tracing::{info, warn};

/// Every name a macro's `before`/`after` list may reference.
pub const MAGIC_NAMES: &[&str] = &[
    "VIEW_SETTINGS",
    "VIEW_PARAMETERS",
    "VIEW_PARSER",
    "VIEW_BUILD",
    "VIEW_STARTUPS",
    "HELP",
    "KILL_ALARM",
    "CYCLE_START",
    "FEED_HOLD",
    "STATUS",
    "RESET",
    "JOG_CANCEL",
    "DUMP_STATE",
];

/// One resolved magic command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicCommand {
    /// A `$` view whose reply is collected and logged
    Dollar(DollarCommand),
    /// A realtime control byte
    Realtime(RealtimeCommand),
    /// Dump bridge state into the log
    DumpState,
}

impl MagicCommand {
    /// Resolve a magic name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "VIEW_SETTINGS" => Some(Self::Dollar(DollarCommand::ViewSettings)),
            "VIEW_PARAMETERS" => Some(Self::Dollar(DollarCommand::ViewParameters)),
            "VIEW_PARSER" => Some(Self::Dollar(DollarCommand::ViewParser)),
            "VIEW_BUILD" => Some(Self::Dollar(DollarCommand::ViewBuild)),
            "VIEW_STARTUPS" => Some(Self::Dollar(DollarCommand::ViewStartups)),
            "HELP" => Some(Self::Dollar(DollarCommand::Help)),
            "KILL_ALARM" => Some(Self::Dollar(DollarCommand::KillAlarm)),
            "CYCLE_START" => Some(Self::Realtime(RealtimeCommand::CycleStart)),
            "FEED_HOLD" => Some(Self::Realtime(RealtimeCommand::FeedHold)),
            "STATUS" => Some(Self::Realtime(RealtimeCommand::Status)),
            "RESET" => Some(Self::Realtime(RealtimeCommand::Reset)),
            "JOG_CANCEL" => Some(Self::Realtime(RealtimeCommand::JogCancel)),
            "DUMP_STATE" => Some(Self::DumpState),
            _ => None,
        }
    }

    /// Run the command, returning any collected reply text.
    pub fn execute(&self, controller: &Controller, modes: &SharedModes) -> Result<String> {
        match self {
            Self::Dollar(cmd) => controller.dollar_command(*cmd),
            Self::Realtime(cmd) => {
                controller.realtime_command(*cmd)?;
                Ok(String::new())
            }
            Self::DumpState => Ok(format!(
                "motionMode={} axisMode={} pendingLines={} bufferedBytes={}",
                modes.motion_mode(),
                modes.axis_mode(),
                controller.pending_line_count(),
                controller.buffered_byte_total(),
            )),
        }
    }
}

/// Run a macro's magic list in order, logging each result. Names were
/// validated at macro load, so an unresolvable name only gets a warning.
pub fn execute_magic_list(names: &[String], controller: &Controller, modes: &SharedModes) {
    for name in names {
        let Some(command) = MagicCommand::from_name(name) else {
            warn!("Unknown magic command '{}': skipping", name);
            continue;
        };
        match command.execute(controller, modes) {
            Ok(reply) if reply.is_empty() => info!("{}: done", name),
            Ok(reply) => info!("{}:\n{}", name, reply),
            Err(e) => warn!("{} failed: {}", name, e),
        }
    }
}
