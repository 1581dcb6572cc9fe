//! Keycap, axis selector, and increment decoding
//!
//! The pendant reports keys as raw codes in two tables: the base table
//! for unchorded presses, and the Fn table for presses chorded with the
//! Fn key. The axis and increment knobs report position codes; the
//! increment meaning depends on the active motion mode.

use pendantkit_core::{AxisMode, MotionMode};

/// Key code of the Fn modifier in the base table.
pub const FN_KEY_CODE: u8 = 0x0C;

/// A decoded pendant keycap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keycap {
    Reset,
    Stop,
    StartPause,
    Fn,
    Continuous,
    Step,
    /// One of the ten macro keys (`Macro-1` .. `Macro-10`).
    Macro(u8),
    FeedPlus,
    FeedMinus,
    SpindlePlus,
    SpindleMinus,
    MachineHome,
    SafeZ,
    WorkHome,
    SpindleToggle,
    ProbeZ,
    /// Fn chord that re-runs the pendant reset handshake.
    PendantReset,
    /// Fn chord that shuts the bridge down.
    ApplicationExit,
}

/// Base keymap, indexed by `key1` when `key2` is zero.
fn base_key(code: u8) -> Option<Keycap> {
    match code {
        0x01 => Some(Keycap::Reset),
        0x02 => Some(Keycap::Stop),
        0x03 => Some(Keycap::StartPause),
        0x04 => Some(Keycap::Macro(1)),
        0x05 => Some(Keycap::Macro(2)),
        0x06 => Some(Keycap::Macro(3)),
        0x07 => Some(Keycap::Macro(4)),
        0x08 => Some(Keycap::Macro(5)),
        0x09 => Some(Keycap::Macro(6)),
        0x0A => Some(Keycap::Macro(7)),
        0x0B => Some(Keycap::Macro(8)),
        0x0C => Some(Keycap::Fn),
        0x0D => Some(Keycap::Macro(9)),
        0x0E => Some(Keycap::Continuous),
        0x0F => Some(Keycap::Step),
        0x10 => Some(Keycap::Macro(10)),
        _ => None,
    }
}

/// Fn keymap, indexed by `key2` when `key1` is the Fn key.
fn fn_key(code: u8) -> Option<Keycap> {
    match code {
        0x01 => Some(Keycap::PendantReset),
        0x02 => Some(Keycap::ApplicationExit),
        0x03 => Some(Keycap::StartPause),
        0x04 => Some(Keycap::FeedPlus),
        0x05 => Some(Keycap::FeedMinus),
        0x06 => Some(Keycap::SpindlePlus),
        0x07 => Some(Keycap::SpindleMinus),
        0x08 => Some(Keycap::MachineHome),
        0x09 => Some(Keycap::SafeZ),
        0x0A => Some(Keycap::WorkHome),
        0x0B => Some(Keycap::SpindleToggle),
        0x0D => Some(Keycap::ProbeZ),
        0x0F => Some(Keycap::Continuous),
        0x10 => Some(Keycap::Step),
        _ => None,
    }
}

/// Decode a key chord from an input report.
///
/// `key2 == 0` selects the base table; a chord with the Fn key selects
/// the Fn table; any other chord is unknown and ignored.
pub fn decode_key(key1: u8, key2: u8) -> Option<Keycap> {
    if key2 == 0 {
        base_key(key1)
    } else if key1 == FN_KEY_CODE {
        fn_key(key2)
    } else {
        None
    }
}

/// Axis selector knob position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSelector {
    /// No knob information in this report
    Noop,
    Off,
    X,
    Y,
    Z,
    A,
    B,
    C,
}

impl AxisSelector {
    /// Decode the axis byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Noop),
            0x06 => Some(Self::Off),
            0x11 => Some(Self::X),
            0x12 => Some(Self::Y),
            0x13 => Some(Self::Z),
            0x14 => Some(Self::A),
            0x15 => Some(Self::B),
            0x16 => Some(Self::C),
            _ => None,
        }
    }

    /// The GRBL axis letter, for positions that name one.
    pub fn letter(self) -> Option<char> {
        match self {
            Self::X => Some('X'),
            Self::Y => Some('Y'),
            Self::Z => Some('Z'),
            Self::A => Some('A'),
            Self::B => Some('B'),
            Self::C => Some('C'),
            Self::Noop | Self::Off => None,
        }
    }
}

/// Derive the axis mode from the raw axis byte: the Off detent is OFF,
/// the A/B/C detents are ABC, and everything else (including the idle
/// 0x00 report) is XYZ.
pub fn axis_mode_for(byte: u8) -> AxisMode {
    match byte {
        0x06 => AxisMode::Off,
        0x14..=0x16 => AxisMode::Abc,
        _ => AxisMode::Xyz,
    }
}

/// Jog increment for an increment-knob code under the given motion mode.
///
/// In STEP mode the value is millimeters per wheel detent; in CONT mode
/// it is the fraction of maximum speed. The `0x9B` Lead position is
/// unsupported and resolves to no increment, as do the reserved MPG/PCT
/// modes.
pub fn increment(mode: MotionMode, code: u8) -> Option<f64> {
    match mode {
        MotionMode::Step => match code {
            0x0D => Some(0.001),
            0x0E => Some(0.01),
            0x0F => Some(0.1),
            0x10 => Some(1.0),
            0x1A => Some(5.0),
            0x1B => Some(10.0),
            _ => None,
        },
        MotionMode::Cont => match code {
            0x0D => Some(0.02),
            0x0E => Some(0.05),
            0x0F => Some(0.10),
            0x10 => Some(0.30),
            0x1A => Some(0.60),
            0x1B => Some(1.0),
            _ => None,
        },
        MotionMode::Mpg | MotionMode::Pct => None,
    }
}
