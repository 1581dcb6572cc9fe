//! Shared mode types for the bridge
//!
//! The motion mode and axis mode are process-wide values with a single
//! writer (the pendant-input worker); every other worker only reads them.
//! `SharedModes` stores both as single-word atomics so readers never see a
//! torn value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Jog motion mode, as encoded in the low two bits of the display flags
/// byte. Only `Cont` and `Step` are implemented; `Mpg` and `Pct` are
/// reserved values the WHB04B-4 defines but this bridge never selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionMode {
    /// Continuous jogging ("CON:<xxx>%" on the pendant LCD)
    Cont = 0,
    /// Discrete step jogging ("STP:<x.xxxx>" on the pendant LCD)
    Step = 1,
    /// Manual pulse generator (reserved, unimplemented)
    Mpg = 2,
    /// Percent (reserved, unimplemented)
    Pct = 3,
}

impl MotionMode {
    /// Wire encoding for the display flags byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode from the two-bit wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Cont),
            1 => Some(Self::Step),
            2 => Some(Self::Mpg),
            3 => Some(Self::Pct),
            _ => None,
        }
    }
}

impl fmt::Display for MotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cont => write!(f, "continuous"),
            Self::Step => write!(f, "step"),
            Self::Mpg => write!(f, "mpg"),
            Self::Pct => write!(f, "percent"),
        }
    }
}

/// Axis group selected by the pendant's axis knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// Knob in the Off detent; coordinate rows on the LCD are frozen
    Off = 0,
    /// Knob on X, Y, or Z
    Xyz = 1,
    /// Knob on A, B, or C
    Abc = 2,
}

impl AxisMode {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Off,
            2 => Self::Abc,
            _ => Self::Xyz,
        }
    }
}

impl fmt::Display for AxisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Xyz => write!(f, "xyz"),
            Self::Abc => write!(f, "abc"),
        }
    }
}

/// Coordinate space a status report (and the LCD) is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Machine coordinates (`MPos`)
    Machine = 0,
    /// Workpiece coordinates (`WPos`)
    Workpiece = 1,
}

impl CoordinateSpace {
    /// Wire encoding for bit 7 of the display flags byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// The process-wide motion/axis mode cell.
///
/// Exactly one thread (the pendant-input worker) stores into this; all
/// other threads load. Relaxed ordering is sufficient because the values
/// are independent single words and carry no cross-data dependencies.
#[derive(Debug)]
pub struct SharedModes {
    motion: AtomicU8,
    axis: AtomicU8,
}

impl SharedModes {
    /// Create the cell with the bridge's startup modes.
    pub fn new(motion: MotionMode, axis: AxisMode) -> Self {
        Self {
            motion: AtomicU8::new(motion.as_u8()),
            axis: AtomicU8::new(axis as u8),
        }
    }

    pub fn motion_mode(&self) -> MotionMode {
        // Stored values only ever come from set_motion_mode, so the decode
        // cannot fail; fall back to Step if memory is ever scribbled on.
        MotionMode::from_u8(self.motion.load(Ordering::Relaxed)).unwrap_or(MotionMode::Step)
    }

    /// Single writer: the pendant-input worker.
    pub fn set_motion_mode(&self, mode: MotionMode) {
        self.motion.store(mode.as_u8(), Ordering::Relaxed);
    }

    pub fn axis_mode(&self) -> AxisMode {
        AxisMode::from_u8(self.axis.load(Ordering::Relaxed))
    }

    /// Single writer: the pendant-input worker.
    pub fn set_axis_mode(&self, mode: AxisMode) {
        self.axis.store(mode as u8, Ordering::Relaxed);
    }
}

impl Default for SharedModes {
    fn default() -> Self {
        Self::new(MotionMode::Step, AxisMode::Off)
    }
}
