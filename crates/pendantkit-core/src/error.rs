//! Error handling for PendantKit
//!
//! Provides error types for the layers of the bridge:
//! - Link errors (serial port / HID device)
//! - Protocol errors (GRBL streaming, display contract)
//! - Macro errors (macro file loading/validation)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Device link error type
///
/// Represents failures opening or talking to one of the two hardware
/// links (the GRBL serial port or the pendant's USB-HID receiver).
#[derive(Error, Debug)]
pub enum LinkError {
    /// Failed to open a device
    #[error("Failed to open {device}: {reason}")]
    FailedToOpen {
        /// Human-readable device identifier (port path or VID:PID).
        device: String,
        /// The reason the open failed.
        reason: String,
    },

    /// A device was found but is not the expected hardware
    #[error("Unexpected device: expected {expected}, got {actual}")]
    WrongDevice {
        /// What the bridge was looking for.
        expected: String,
        /// What was actually found.
        actual: String,
    },

    /// The device was not found at all
    #[error("Device not found: {device}")]
    NotFound {
        /// Human-readable device identifier.
        device: String,
    },

    /// The link has been shut down
    #[error("Link closed")]
    Closed,

    /// I/O error on an open link
    #[error("Link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Protocol error type
///
/// Represents violations of the GRBL streaming contract or the pendant
/// display contract.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Waited too long for an `ok`/`error` acknowledgment
    #[error("Timed out after {timeout_ms}ms waiting for controller ack")]
    AckTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// A single line cannot ever fit the controller's RX buffer
    #[error("Line of {len} bytes exceeds the {max}-byte RX buffer")]
    LineTooLong {
        /// Length of the line including CRLF.
        len: usize,
        /// The controller RX buffer size.
        max: usize,
    },

    /// Jog request with no axis words
    #[error("Jog command requires at least one axis")]
    EmptyJog,

    /// Jog request for an axis letter GRBL does not know
    #[error("Invalid jog axis: {axis}")]
    InvalidAxis {
        /// The offending axis letter.
        axis: char,
    },

    /// Display update rejected by the pendant contract
    #[error("Invalid display update: {reason}")]
    InvalidDisplay {
        /// Why the update was rejected.
        reason: String,
    },
}

/// Macro file error type
#[derive(Error, Debug)]
pub enum MacroError {
    /// Macro file could not be read
    #[error("Failed to read macro file: {0}")]
    Io(#[from] std::io::Error),

    /// Macro file is not valid YAML
    #[error("Failed to parse macro file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Main error type for PendantKit
///
/// A unified error type that can represent any error from the bridge's
/// layers. This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Device link error
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Macro file error
    #[error(transparent)]
    Macro(#[from] MacroError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an ack-wait timeout
    pub fn is_ack_timeout(&self) -> bool {
        matches!(self, Error::Protocol(ProtocolError::AckTimeout { .. }))
    }

    /// Check if this is a link error
    pub fn is_link_error(&self) -> bool {
        matches!(self, Error::Link(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
