//! Command line surface and bridge tuning constants.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Feed rate for STEP-mode jogs (mm/min).
pub const JOG_SPEED: f64 = 500.0;

/// Top feed rate scaled by the increment knob in CONT mode (mm/min).
pub const MAX_SPEED: f64 = 1000.0;

const _: () = assert!(JOG_SPEED <= MAX_SPEED);

/// How often the poller requests a status report.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Wait used by workers when polling their queues, so a cleared run flag
/// is observed promptly.
pub const WORKER_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Connect an XHC WHB04B-4 pendant to a GRBL controller.
#[derive(Parser, Debug)]
#[command(name = "pendantkit", version, about)]
pub struct Cli {
    /// Logging level
    #[arg(
        short = 'L',
        long = "logLevel",
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Path to location of logfile (create it if it doesn't exist)
    #[arg(short = 'l', long = "logFile")]
    pub log_file: Option<PathBuf>,

    /// Path to YAML file containing macro key definitions
    #[arg(short = 'm', long = "macroPath", default_value = "./whb04b.yml")]
    pub macro_path: PathBuf,

    /// Enable printing of debug info
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Serial port of the GRBL controller
    #[arg(short = 'p', long, default_value = "/dev/ttyACM0")]
    pub port: String,

    /// Baud rate of the GRBL serial link
    #[arg(short = 'b', long, default_value_t = 115_200)]
    pub baud: u32,
}
