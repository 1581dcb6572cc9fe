//! GRBL v1.1 host protocol
//!
//! Frame reading, packet classification, status report parsing, the
//! command/description tables, and the streaming controller client.

pub mod codes;
pub mod controller;
pub mod frame;
pub mod packet;
pub mod status;
