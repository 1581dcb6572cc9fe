//! # PendantKit Core
//!
//! Core types, errors, and macro definitions shared by the PendantKit
//! crates: motion/axis mode enums, the shared mode cell the workers read,
//! the unified error type, and the YAML macro-file model.

pub mod error;
pub mod macros;
pub mod types;

pub use error::{Error, LinkError, MacroError, ProtocolError, Result};
pub use macros::{Macro, MacroSet, MAX_MACROS};
pub use types::{AxisMode, CoordinateSpace, MotionMode, SharedModes};
