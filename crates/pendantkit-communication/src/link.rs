//! Serial port abstraction
//!
//! Wraps the `serialport` crate behind a small trait so the GRBL client
//! and its tests can run against in-memory ports. The real link is opened
//! 8-N-1 with no flow control and a short read timeout, and split into
//! independent reader/writer halves so the reader thread can block in
//! `read` while realtime and streamed writes proceed concurrently.

use pendantkit_core::error::LinkError;
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::debug;

/// Default read timeout; short enough that the reader thread can observe
/// a cleared run flag between frames.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Byte-oriented half of a device link.
///
/// `read` returns `Ok(0)` on timeout rather than an error, so callers can
/// poll their shutdown flag without treating an idle line as a failure.
pub trait LinkPort: Send {
    /// Read up to `buf.len()` bytes. `Ok(0)` means the read timed out.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush buffered output to the device.
    fn flush(&mut self) -> io::Result<()>;
}

struct SerialHalf {
    inner: Box<dyn serialport::SerialPort>,
}

impl LinkPort for SerialHalf {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Opens the GRBL serial link and hands out its two halves.
pub struct SerialLink;

impl SerialLink {
    /// Open `port_name` at `baud_rate` (8-N-1, no flow control) and split
    /// it into a reader half and a writer half.
    ///
    /// Opening the USB-CDC port resets most GRBL boards, so the caller
    /// should expect the power-on banner on the reader side.
    pub fn open(
        port_name: &str,
        baud_rate: u32,
    ) -> Result<(Box<dyn LinkPort>, Box<dyn LinkPort>), LinkError> {
        let reader = serialport::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| LinkError::FailedToOpen {
                device: port_name.to_string(),
                reason: e.to_string(),
            })?;

        let writer = reader.try_clone().map_err(|e| LinkError::FailedToOpen {
            device: port_name.to_string(),
            reason: format!("failed to clone port handle: {}", e),
        })?;

        debug!("Opened {} at {} baud", port_name, baud_rate);
        Ok((
            Box::new(SerialHalf { inner: reader }),
            Box::new(SerialHalf { inner: writer }),
        ))
    }
}
