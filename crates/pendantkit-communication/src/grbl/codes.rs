//! GRBL command bytes and description tables
//!
//! Realtime single-byte commands, `$` system command suffixes, and the
//! fixed alarm/error/setting description tables for GRBL v1.1.

use std::fmt;

/// Size of GRBL's serial RX buffer. Character-counting streaming keeps the
/// sum of unacknowledged line lengths at or below this.
pub const RX_BUFFER_SIZE: usize = 128;

/// Realtime commands: single bytes written out-of-band, executed by GRBL
/// immediately regardless of buffer state. They return no `ok`/`error`
/// and never participate in streaming buffer accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeCommand {
    /// `~` resume from feed hold
    CycleStart,
    /// `!` feed hold
    FeedHold,
    /// `?` status report query
    Status,
    /// Ctrl-X soft reset
    Reset,
    /// Software equivalent of the safety-door switch
    SafetyDoor,
    /// Cancel the current jog and flush queued jog commands
    JogCancel,
    /// Feed override to 100% of programmed rate
    FeedReset,
    /// Feed override +10%
    FeedPlus10,
    /// Feed override -10%
    FeedMinus10,
    /// Feed override +1%
    FeedPlus1,
    /// Feed override -1%
    FeedMinus1,
    /// Rapid override to 100%
    RapidFull,
    /// Rapid override to 50%
    RapidHalf,
    /// Rapid override to 25%
    RapidQuarter,
    /// Toggle spindle enable (hold state only)
    ToggleSpindle,
    /// Toggle flood coolant
    ToggleFlood,
    /// Toggle mist coolant
    ToggleMist,
}

impl RealtimeCommand {
    /// The wire byte.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::CycleStart => 0x7E,
            Self::FeedHold => 0x21,
            Self::Status => 0x3F,
            Self::Reset => 0x18,
            Self::SafetyDoor => 0x84,
            Self::JogCancel => 0x85,
            Self::FeedReset => 0x90,
            Self::FeedPlus10 => 0x91,
            Self::FeedMinus10 => 0x92,
            Self::FeedPlus1 => 0x93,
            Self::FeedMinus1 => 0x94,
            Self::RapidFull => 0x95,
            Self::RapidHalf => 0x96,
            Self::RapidQuarter => 0x97,
            Self::ToggleSpindle => 0x9E,
            Self::ToggleFlood => 0xA0,
            Self::ToggleMist => 0xA1,
        }
    }
}

impl fmt::Display for RealtimeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CycleStart => "cycle-start",
            Self::FeedHold => "feed-hold",
            Self::Status => "status",
            Self::Reset => "reset",
            Self::SafetyDoor => "safety-door",
            Self::JogCancel => "jog-cancel",
            Self::FeedReset => "feed-100",
            Self::FeedPlus10 => "feed+10",
            Self::FeedMinus10 => "feed-10",
            Self::FeedPlus1 => "feed+1",
            Self::FeedMinus1 => "feed-1",
            Self::RapidFull => "rapid-100",
            Self::RapidHalf => "rapid-50",
            Self::RapidQuarter => "rapid-25",
            Self::ToggleSpindle => "toggle-spindle",
            Self::ToggleFlood => "toggle-flood",
            Self::ToggleMist => "toggle-mist",
        };
        write!(f, "{}", name)
    }
}

/// `$` system commands. These are framed like normal lines but answered
/// synchronously; the client collects the multi-line reply up to the
/// terminating `ok`. Jog lines (`$J=...`) are not here — they stream
/// through the character-counting path like G-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DollarCommand {
    /// `$` help summary
    Help,
    /// `$$` view settings
    ViewSettings,
    /// `$#` view `#` parameters
    ViewParameters,
    /// `$G` view parser state
    ViewParser,
    /// `$I` view build info
    ViewBuild,
    /// `$N` view startup blocks
    ViewStartups,
    /// `$C` toggle G-code check mode
    CheckGcodeMode,
    /// `$X` kill alarm lock
    KillAlarm,
    /// `$H` run homing cycle
    RunHoming,
    /// `$SLP` enter sleep mode
    Sleep,
    /// `$RST=<c>` restore EEPROM data
    Restore(char),
}

impl DollarCommand {
    /// The suffix written after `$`.
    pub fn suffix(self) -> String {
        match self {
            Self::Help => String::new(),
            Self::ViewSettings => "$".to_string(),
            Self::ViewParameters => "#".to_string(),
            Self::ViewParser => "G".to_string(),
            Self::ViewBuild => "I".to_string(),
            Self::ViewStartups => "N".to_string(),
            Self::CheckGcodeMode => "C".to_string(),
            Self::KillAlarm => "X".to_string(),
            Self::RunHoming => "H".to_string(),
            Self::Sleep => "SLP".to_string(),
            Self::Restore(c) => format!("RST={}", c),
        }
    }
}

/// Short description for an `ALARM:<code>` message. Codes outside the
/// table yield no description.
pub fn alarm_description(code: u8) -> Option<&'static str> {
    let text = match code {
        1 => "Hard limit has been triggered. Machine position is likely lost due to sudden halt. Re-homing is highly recommended.",
        2 => "Soft limit alarm. G-code motion target exceeds machine travel. Machine position retained. Alarm may be safely unlocked.",
        3 => "Reset while in motion. Machine position is likely lost due to sudden halt. Re-homing is highly recommended.",
        4 => "Probe fail. Probe is not in the expected initial state before starting the probe cycle.",
        5 => "Probe fail. Probe did not contact the workpiece within the programmed travel for G38.2 and G38.4.",
        6 => "Homing fail. The active homing cycle was reset.",
        7 => "Homing fail. Safety door was opened during homing cycle.",
        8 => "Homing fail. Pull off travel failed to clear limit switch. Try increasing pull-off setting or check wiring.",
        9 => "Homing fail. Could not find limit switch within search distances. Try increasing max travel, decreasing pull-off distance, or check wiring.",
        10 => "Homing fail. Second dual axis limit switch failed to trigger within configured search distance after first.",
        _ => return None,
    };
    Some(text)
}

/// Description for an `error:<code>` response. Codes outside the table
/// yield no description.
pub fn error_description(code: u8) -> Option<&'static str> {
    let text = match code {
        1 => "G-code words consist of a letter and a value. Letter was not found.",
        2 => "Missing the expected G-code word value or numeric value format is not valid.",
        3 => "Grbl '$' system command was not recognized or supported.",
        4 => "Negative value received for an expected positive value.",
        5 => "Homing cycle failure. Homing is not enabled via settings.",
        6 => "Minimum step pulse time must be greater than 3usec.",
        7 => "An EEPROM read failed. Auto-restoring affected EEPROM to default values.",
        8 => "Grbl '$' command cannot be used unless Grbl is IDLE. Ensures smooth operation during a job.",
        9 => "G-code commands are locked out during alarm or jog state.",
        10 => "Soft limits cannot be enabled without homing also enabled.",
        11 => "Max characters per line exceeded. Received command line was not executed.",
        12 => "Grbl '$' setting value cause the step rate to exceed the maximum supported.",
        13 => "Safety door detected as opened and door state initiated.",
        14 => "Build info or startup line exceeded EEPROM line length limit. Line not stored.",
        15 => "Jog target exceeds machine travel. Jog command has been ignored.",
        16 => "Jog command has no '=' or contains prohibited g-code.",
        17 => "Laser mode requires PWM output.",
        20 => "Unsupported or invalid g-code command found in block.",
        21 => "More than one g-code command from same modal group found in block.",
        22 => "Feed rate has not yet been set or is undefined.",
        23 => "G-code command in block requires an integer value.",
        24 => "More than one g-code command that requires axis words found in block.",
        25 => "Repeated g-code word found in block.",
        26 => "No axis words found in block for g-code command or current modal state which requires them.",
        27 => "Line number value is invalid.",
        28 => "G-code command is missing a required value word.",
        29 => "G59.x work coordinate systems are not supported.",
        30 => "G53 only allowed with G0 and G1 motion modes.",
        31 => "Axis words found in block when no command or current modal state uses them.",
        32 => "G2 and G3 arcs require at least one in-plane axis word.",
        33 => "Motion command target is invalid.",
        34 => "Arc radius value is invalid.",
        35 => "G2 and G3 arcs require at least one in-plane offset word.",
        36 => "Unused value words found in block.",
        37 => "G43.1 dynamic tool length offset is not assigned to configured tool length axis.",
        38 => "Tool number greater than max supported value.",
        _ => return None,
    };
    Some(text)
}

/// Format an alarm code with its description for logging.
pub fn format_alarm(code: u8) -> String {
    match alarm_description(code) {
        Some(text) => format!("ALARM:{} - {}", code, text),
        None => format!("ALARM:{} (no description)", code),
    }
}

/// Format an error code with its description for logging.
pub fn format_error(code: u8) -> String {
    match error_description(code) {
        Some(text) => format!("error:{} - {}", code, text),
        None => format!("error:{} (no description)", code),
    }
}

/// Name and units for a `$<n>=<v>` setting, used to annotate parameter
/// packets in logs.
pub fn setting_description(number: u32) -> Option<(&'static str, &'static str)> {
    let entry = match number {
        0 => ("Step pulse time", "microseconds"),
        1 => ("Step idle delay", "milliseconds"),
        2 => ("Step pulse invert", "mask"),
        3 => ("Step direction invert", "mask"),
        4 => ("Invert step enable pin", "boolean"),
        5 => ("Invert limit pins", "boolean"),
        6 => ("Invert probe pin", "boolean"),
        10 => ("Status report options", "mask"),
        11 => ("Junction deviation", "millimeters"),
        12 => ("Arc tolerance", "millimeters"),
        13 => ("Report in inches", "boolean"),
        20 => ("Soft limits enable", "boolean"),
        21 => ("Hard limits enable", "boolean"),
        22 => ("Homing cycle enable", "boolean"),
        23 => ("Homing direction invert", "mask"),
        24 => ("Homing locate feed rate", "mm/min"),
        25 => ("Homing search seek rate", "mm/min"),
        26 => ("Homing switch debounce delay", "milliseconds"),
        27 => ("Homing switch pull-off distance", "millimeters"),
        30 => ("Maximum spindle speed", "RPM"),
        31 => ("Minimum spindle speed", "RPM"),
        32 => ("Laser-mode enable", "boolean"),
        100 => ("X-axis travel resolution", "step/mm"),
        101 => ("Y-axis travel resolution", "step/mm"),
        102 => ("Z-axis travel resolution", "step/mm"),
        110 => ("X-axis maximum rate", "mm/min"),
        111 => ("Y-axis maximum rate", "mm/min"),
        112 => ("Z-axis maximum rate", "mm/min"),
        120 => ("X-axis acceleration", "mm/sec^2"),
        121 => ("Y-axis acceleration", "mm/sec^2"),
        122 => ("Z-axis acceleration", "mm/sec^2"),
        130 => ("X-axis maximum travel", "millimeters"),
        131 => ("Y-axis maximum travel", "millimeters"),
        132 => ("Z-axis maximum travel", "millimeters"),
        _ => return None,
    };
    Some(entry)
}
