//! # PendantKit Pendant
//!
//! XHC WHB04B-4 pendant support: the binary HID report protocol (8-byte
//! input reports, multi-fragment display packets) and the device client
//! with its reset handshake, keycap decoding, and display update
//! contract.

pub mod device;
pub mod keymap;
pub mod report;

pub use device::{HidLink, Pendant, PendantConfig, MANUFACTURER, PRODUCT_ID, VENDOR_ID};
pub use keymap::{axis_mode_for, decode_key, increment, AxisSelector, Keycap, FN_KEY_CODE};
pub use report::{
    decode_fixed_point, encode_fixed_point, DisplayFrame, InputReport, DISPLAY_PAYLOAD_LEN,
    DISPLAY_REPORT_ID, INPUT_HEADER, INPUT_REPORT_LEN,
};
