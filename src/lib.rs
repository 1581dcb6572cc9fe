//! # PendantKit
//!
//! A bridge between the XHC WHB04B-4 wireless jog pendant and GRBL v1.1
//! CNC controllers. Pendant input (buttons, axis and increment knobs,
//! jog wheel) becomes GRBL streamed G-code, realtime bytes, and `$`
//! commands; polled machine status flows back to the pendant's LCD.
//!
//! ## Architecture
//!
//! The workspace is organized as a root binary plus three crates:
//!
//! 1. **pendantkit-core** - shared types, errors, macro definitions
//! 2. **pendantkit-communication** - serial link, GRBL streaming client
//! 3. **pendantkit-pendant** - WHB04B-4 HID codec and device client
//! 4. **pendantkit** - the event coordinator and binary
//!
//! The coordinator runs four workers on top of the two device reader
//! threads: pendant-input dispatch, controller-input consumption, the
//! controller-status consumer that drives the LCD, and the periodic
//! status poller.

pub mod config;
pub mod magic;
pub mod processor;

pub use config::Cli;
pub use magic::{MagicCommand, MAGIC_NAMES};
pub use processor::{Processor, ProcessorConfig};

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging.
///
/// The `--logLevel` value becomes the default filter directive and
/// `RUST_LOG` can override it per module. With `--logFile` the
/// subscriber appends to the file instead of stderr.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let directive = match level {
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARNING" => tracing::Level::WARN,
        // CRITICAL has no tracing equivalent; ERROR is the closest.
        "ERROR" | "CRITICAL" => tracing::Level::ERROR,
        other => anyhow::bail!("unknown log level: {}", other),
    };
    let env_filter = EnvFilter::from_default_env().add_directive(directive.into());

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::sync::Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(env_filter).init();
        }
    }
    Ok(())
}
