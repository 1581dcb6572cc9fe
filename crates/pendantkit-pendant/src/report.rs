//! WHB04B-4 HID report codec
//!
//! Input reports are 8 bytes: header, seed, two key codes, the increment
//! and axis selector positions, a signed jog delta, and an undocumented
//! checksum. Display packets are a 20-byte little-endian record carrying
//! three packed fixed-point coordinates plus feed and spindle values,
//! fragmented into three 8-byte output reports.

use pendantkit_core::{CoordinateSpace, MotionMode};
use tracing::warn;

/// Input report length.
pub const INPUT_REPORT_LEN: usize = 8;

/// Fixed first byte of every input report.
pub const INPUT_HEADER: u8 = 0x04;

/// Display payload length before fragmentation.
pub const DISPLAY_PAYLOAD_LEN: usize = 20;

/// Report id prepended to each display fragment.
pub const DISPLAY_REPORT_ID: u8 = 0x06;

/// Payload bytes per output report.
const FRAGMENT_LEN: usize = 7;

const DISPLAY_HEADER: u16 = 0xFDFE;

// The receiver also accepts 0x12 here in an older protocol revision.
const DISPLAY_SEED: u8 = 0xFE;

/// One decoded pendant input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputReport {
    pub header: u8,
    pub seed: u8,
    /// Primary key code (base keymap when `key2` is zero).
    pub key1: u8,
    /// Chorded key code (Fn keymap when `key1` is the Fn key).
    pub key2: u8,
    /// Increment knob position code.
    pub incr: u8,
    /// Axis selector knob position code.
    pub axis: u8,
    /// Signed jog wheel delta since the last report.
    pub jog: i8,
    /// Undocumented checksum; not validated.
    pub checksum: u8,
}

impl InputReport {
    /// Decode an input report.
    ///
    /// Returns `None` for short reads and for reports without the 0x04
    /// header; both are logged as format deviations. The checksum
    /// algorithm is unknown, so it is carried but never checked.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != INPUT_REPORT_LEN {
            warn!("Invalid pendant report length: {} bytes", bytes.len());
            return None;
        }
        if bytes[0] != INPUT_HEADER {
            warn!("Invalid pendant report header: {:#04x}", bytes[0]);
            return None;
        }
        Some(Self {
            header: bytes[0],
            seed: bytes[1],
            key1: bytes[2],
            key2: bytes[3],
            incr: bytes[4],
            axis: bytes[5],
            jog: bytes[6] as i8,
            checksum: bytes[7],
        })
    }

    /// Whether this report carries no key, knob, or wheel activity.
    pub fn is_idle(&self) -> bool {
        self.key1 == 0 && self.key2 == 0 && self.jog == 0
    }
}

/// Encode a coordinate as the display's packed fixed-point pair:
/// `(integer_part, sign_bit << 15 | first_four_fraction_digits)`.
/// Zero encodes as `(0, 0)`.
pub fn encode_fixed_point(value: f64) -> (u16, u16) {
    let scaled = (value.abs() * 10_000.0).round() as u64;
    if scaled == 0 {
        return (0, 0);
    }
    let integer = (scaled / 10_000).min(u16::MAX as u64) as u16;
    let fraction = (scaled % 10_000) as u16;
    let sign = if value < 0.0 { 0x8000 } else { 0 };
    (integer, sign | (fraction & 0x7FFF))
}

/// Inverse of [`encode_fixed_point`], used by tests and diagnostics.
pub fn decode_fixed_point(integer: u16, fraction_sign: u16) -> f64 {
    let magnitude = integer as f64 + (fraction_sign & 0x7FFF) as f64 / 10_000.0;
    if fraction_sign & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// One display update: everything the segment LCD shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayFrame {
    pub motion_mode: MotionMode,
    pub coordinate_space: CoordinateSpace,
    pub coordinates: [f64; 3],
    pub feed_rate: u16,
    pub spindle_speed: u16,
    /// When set the LCD shows "RESET" instead of the motion mode.
    pub reset: bool,
}

impl DisplayFrame {
    /// A frame with zeroed values, used for the reset handshake.
    pub fn blank(motion_mode: MotionMode, reset: bool) -> Self {
        Self {
            motion_mode,
            coordinate_space: CoordinateSpace::Machine,
            coordinates: [0.0; 3],
            feed_rate: 0,
            spindle_speed: 0,
            reset,
        }
    }

    /// Pack the little-endian display record.
    pub fn encode(&self) -> [u8; DISPLAY_PAYLOAD_LEN] {
        let mut payload = [0u8; DISPLAY_PAYLOAD_LEN];
        payload[0..2].copy_from_slice(&DISPLAY_HEADER.to_le_bytes());
        payload[2] = DISPLAY_SEED;
        payload[3] = (self.coordinate_space.as_u8() << 7)
            | ((self.reset as u8) << 6)
            | (self.motion_mode.as_u8() & 0x03);
        for (index, value) in self.coordinates.iter().enumerate() {
            let (integer, fraction_sign) = encode_fixed_point(*value);
            let offset = 4 + index * 4;
            payload[offset..offset + 2].copy_from_slice(&integer.to_le_bytes());
            payload[offset + 2..offset + 4].copy_from_slice(&fraction_sign.to_le_bytes());
        }
        payload[16..18].copy_from_slice(&self.feed_rate.to_le_bytes());
        payload[18..20].copy_from_slice(&self.spindle_speed.to_le_bytes());
        payload
    }

    /// Fragment the payload into the three 8-byte output reports: report
    /// id 0x06 plus a 7-byte slice, final slice zero-padded.
    pub fn reports(&self) -> Vec<[u8; 8]> {
        let payload = self.encode();
        payload
            .chunks(FRAGMENT_LEN)
            .map(|chunk| {
                let mut report = [0u8; 8];
                report[0] = DISPLAY_REPORT_ID;
                report[1..1 + chunk.len()].copy_from_slice(chunk);
                report
            })
            .collect()
    }
}
