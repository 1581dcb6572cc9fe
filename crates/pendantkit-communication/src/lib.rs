//! # PendantKit Communication
//!
//! Serial link handling and the GRBL v1.1 host protocol client.
//! Implements the character-counting streaming protocol, out-of-band
//! realtime commands, `$` system commands, and classification of the
//! mixed message stream GRBL produces.

pub mod grbl;
pub mod link;

pub use grbl::{
    codes::{
        alarm_description, error_description, format_alarm, format_error, setting_description,
        DollarCommand, RealtimeCommand, RX_BUFFER_SIZE,
    },
    controller::{Controller, ControllerConfig},
    frame::{read_frame, MAX_FRAME},
    packet::Packet,
    status::StatusReport,
};
pub use link::{LinkPort, SerialLink};
