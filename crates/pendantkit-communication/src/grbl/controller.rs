//! GRBL streaming controller client
//!
//! Owns the serial link to the controller and implements the three
//! command paths of the GRBL v1.1 host protocol:
//!
//! - **Streamed lines** use character-counting flow control: the byte
//!   length of every sent line is recorded, and a line is only written
//!   once the sum of unacknowledged lengths plus the new line fits the
//!   controller's 128-byte RX buffer. Every `ok`/`error`/`ALARM` retires
//!   the oldest recorded length.
//! - **Realtime commands** are single bytes written out-of-band; they
//!   bypass the accounting entirely.
//! - **`$` commands** are written unaccounted and answered synchronously;
//!   the reply lines are collected from the input queue.
//!
//! A dedicated reader thread frames and classifies everything the
//! controller sends, routing acks to the ack queue, status reports to the
//! status queue, and all other packets to the input queue.

use crate::grbl::codes::{format_alarm, format_error, DollarCommand, RealtimeCommand, RX_BUFFER_SIZE};
use crate::grbl::frame::read_frame;
use crate::grbl::packet::Packet;
use crate::link::{LinkPort, SerialLink};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use pendantkit_core::error::{LinkError, ProtocolError};
use pendantkit_core::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Ack queue depth. The RX buffer bounds outstanding lines to well under
/// this, so the queue only backs up if the controller double-acks.
const ACK_QUEUE_SIZE: usize = 256;

/// Controller client configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long a streamed send may wait for buffer space.
    pub ack_timeout: Duration,
    /// Depth of the non-status packet queue.
    pub input_queue_size: usize,
    /// Depth of the status report queue.
    pub status_queue_size: usize,
    /// Wait for the first reply line of a `$` command.
    pub first_reply_timeout: Duration,
    /// Gap after which a `$` reply is considered complete.
    pub reply_gap_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(30),
            input_queue_size: 64,
            status_queue_size: 16,
            first_reply_timeout: Duration::from_secs(1),
            reply_gap_timeout: Duration::from_millis(500),
        }
    }
}

/// The GRBL controller client. See the module docs for the protocol
/// split between the three command paths.
pub struct Controller {
    writer: Mutex<Box<dyn LinkPort>>,
    /// Byte lengths of sent-but-unacknowledged lines, oldest first.
    /// Invariant: the sum never exceeds [`RX_BUFFER_SIZE`].
    pending: Mutex<VecDeque<usize>>,
    ack_rx: Receiver<()>,
    input_rx: Receiver<Packet>,
    status_rx: Receiver<String>,
    receiving: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
    config: ControllerConfig,
    closed: AtomicBool,
}

impl Controller {
    /// Open the serial port and start the reader thread.
    ///
    /// Opening the USB-CDC port resets GRBL, so the caller should expect
    /// the power-on banner as the first input packet. `run` is the
    /// process-wide run flag; it is cleared if a queue saturates.
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        run: Arc<AtomicBool>,
        config: ControllerConfig,
    ) -> Result<Self> {
        let (reader, writer) = SerialLink::open(port_name, baud_rate)?;
        info!("Connected to GRBL on {} at {} baud", port_name, baud_rate);
        Ok(Self::from_ports(reader, writer, run, config))
    }

    /// Build a client from an already-open pair of link halves. Used by
    /// tests and alternative transports.
    pub fn from_ports(
        reader: Box<dyn LinkPort>,
        writer: Box<dyn LinkPort>,
        run: Arc<AtomicBool>,
        config: ControllerConfig,
    ) -> Self {
        let (ack_tx, ack_rx) = bounded(ACK_QUEUE_SIZE);
        let (input_tx, input_rx) = bounded(config.input_queue_size);
        let (status_tx, status_rx) = bounded(config.status_queue_size);

        let receiving = Arc::new(AtomicBool::new(true));
        let reader_flag = Arc::clone(&receiving);
        let handle = std::thread::Builder::new()
            .name("grbl-reader".to_string())
            .spawn(move || reader_loop(reader, reader_flag, run, ack_tx, input_tx, status_tx))
            .expect("failed to spawn grbl-reader thread");

        Self {
            writer: Mutex::new(writer),
            pending: Mutex::new(VecDeque::new()),
            ack_rx,
            input_rx,
            status_rx,
            receiving,
            reader: Mutex::new(Some(handle)),
            config,
            closed: AtomicBool::new(false),
        }
    }

    /// Stream one line to the controller's input buffer.
    ///
    /// Retires already-signalled acks, then blocks until the line fits
    /// the free RX buffer space before writing. After a successful return
    /// the line's bytes are committed to the device and recorded in the
    /// pending ledger.
    pub fn stream_line(&self, cmd: &str) -> Result<()> {
        while self.ack_rx.try_recv().is_ok() {
            self.retire_oldest();
        }

        let mut data = cmd.trim().to_string();
        data.push_str("\r\n");
        let len = data.len();
        if len > RX_BUFFER_SIZE {
            return Err(ProtocolError::LineTooLong {
                len,
                max: RX_BUFFER_SIZE,
            }
            .into());
        }

        while len > RX_BUFFER_SIZE - self.buffered_byte_total() {
            match self.ack_rx.recv_timeout(self.config.ack_timeout) {
                Ok(()) => self.retire_oldest(),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(ProtocolError::AckTimeout {
                        timeout_ms: self.config.ack_timeout.as_millis() as u64,
                    }
                    .into());
                }
                Err(RecvTimeoutError::Disconnected) => return Err(LinkError::Closed.into()),
            }
        }

        {
            let mut port = self.writer.lock();
            port.write_all(data.as_bytes())?;
            port.flush()?;
        }
        self.pending.lock().push_back(len);
        debug!("Wrote: {:?}", data);
        Ok(())
    }

    /// Send a realtime command: one byte, out-of-band, no buffer
    /// accounting.
    pub fn realtime_command(&self, cmd: RealtimeCommand) -> Result<()> {
        let mut port = self.writer.lock();
        port.write_all(&[cmd.as_byte()])?;
        port.flush()?;
        trace!("Realtime command: {}", cmd);
        Ok(())
    }

    /// Send a `$` command and collect its multi-line reply.
    ///
    /// The reply is drained from the input queue: the first line is
    /// awaited up to `first_reply_timeout`, then lines are gathered until
    /// a `reply_gap_timeout` gap. The terminating `ok` travels the ack
    /// path and is ignored there as unsolicited. Must not be interleaved
    /// with streaming.
    pub fn dollar_command(&self, cmd: DollarCommand) -> Result<String> {
        self.send_unbuffered(&format!("${}", cmd.suffix()))?;
        Ok(self.collect_reply())
    }

    /// Send `$X` to clear an alarm lock.
    pub fn kill_alarm_lock(&self) -> Result<String> {
        self.dollar_command(DollarCommand::KillAlarm)
    }

    /// Start the homing cycle. Homing runs for seconds and replies only
    /// when done, so no reply is collected here; completion shows up as
    /// normal input.
    pub fn run_homing_cycle(&self) -> Result<()> {
        self.send_unbuffered("$H")
    }

    /// Stream a `$J=` incremental jog for one axis.
    pub fn jog_incremental_axis(&self, axis: char, distance: f64, feed_rate: f64) -> Result<()> {
        if !matches!(axis, 'X' | 'Y' | 'Z' | 'A' | 'B' | 'C') {
            return Err(ProtocolError::InvalidAxis { axis }.into());
        }
        let cmd = format!(
            "$J=G21 G91 {}{} F{}",
            axis,
            fmt_number(distance),
            fmt_number(feed_rate)
        );
        self.stream_line(&cmd)
    }

    /// Stream a `$J=` incremental jog for any combination of X/Y/Z.
    pub fn jog_incremental(
        &self,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        feed_rate: f64,
    ) -> Result<()> {
        if x.is_none() && y.is_none() && z.is_none() {
            return Err(ProtocolError::EmptyJog.into());
        }
        let mut cmd = String::from("$J=G21 G91");
        for (letter, value) in [('X', x), ('Y', y), ('Z', z)] {
            if let Some(v) = value {
                cmd.push(' ');
                cmd.push(letter);
                cmd.push_str(&fmt_number(v));
            }
        }
        cmd.push_str(&format!(" F{}", fmt_number(feed_rate)));
        self.stream_line(&cmd)
    }

    /// Next non-status packet, if one arrives within `timeout`.
    pub fn get_input(&self, timeout: Duration) -> Option<Packet> {
        self.input_rx.recv_timeout(timeout).ok()
    }

    /// Next raw status report, if one arrives within `timeout`.
    pub fn get_status(&self, timeout: Duration) -> Option<String> {
        self.status_rx.recv_timeout(timeout).ok()
    }

    /// Number of sent lines not yet acknowledged.
    pub fn pending_line_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Bytes currently committed to the controller's RX buffer.
    pub fn buffered_byte_total(&self) -> usize {
        self.pending.lock().iter().sum()
    }

    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Stop the reader and close the client.
    ///
    /// The reader may be blocked mid-frame, so after clearing its flag we
    /// poke the controller with `?` and `$` to elicit replies that
    /// complete the read, then join.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::Relaxed) {
            debug!("Controller shutdown: already closed");
            return;
        }
        self.receiving.store(false, Ordering::Relaxed);
        if let Err(e) = self.send_unbuffered("?") {
            warn!("Shutdown poke failed: {}", e);
        }
        if let Err(e) = self.send_unbuffered("$") {
            warn!("Shutdown poke failed: {}", e);
        }
        if let Some(handle) = self.reader.lock().take() {
            if handle.join().is_err() {
                error!("Controller reader thread panicked");
            }
        }
        info!("Controller link closed");
    }

    /// Write one line with CRLF framing but no buffer accounting. Used
    /// for `$` commands and the shutdown poke, which GRBL answers
    /// synchronously.
    fn send_unbuffered(&self, cmd: &str) -> Result<()> {
        let mut port = self.writer.lock();
        port.write_all(format!("{}\r\n", cmd).as_bytes())?;
        port.flush()?;
        Ok(())
    }

    fn retire_oldest(&self) {
        if self.pending.lock().pop_front().is_none() {
            // Dollar replies and the power-on banner ack without a
            // matching streamed line.
            debug!("Ack with no pending line; ignoring");
        }
    }

    fn collect_reply(&self) -> String {
        let mut reply = String::new();
        match self.input_rx.recv_timeout(self.config.first_reply_timeout) {
            Ok(packet) => reply.push_str(packet.text()),
            Err(_) => return reply,
        }
        while let Ok(packet) = self.input_rx.recv_timeout(self.config.reply_gap_timeout) {
            reply.push('\n');
            reply.push_str(packet.text());
        }
        reply
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Reader thread body: frame, classify, dispatch.
fn reader_loop(
    mut port: Box<dyn LinkPort>,
    receiving: Arc<AtomicBool>,
    run: Arc<AtomicBool>,
    ack_tx: Sender<()>,
    input_tx: Sender<Packet>,
    status_tx: Sender<String>,
) {
    while receiving.load(Ordering::Relaxed) {
        let frame = match read_frame(port.as_mut()) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                error!("Serial read failed: {}", e);
                receiving.store(false, Ordering::Relaxed);
                run.store(false, Ordering::Relaxed);
                break;
            }
        };

        let packet = Packet::classify(&frame);
        trace!("Controller input: {}", packet);
        match packet {
            Packet::Ok => signal_ack(&ack_tx),
            Packet::Error { code, .. } => {
                error!("Controller {}", format_error(code));
                signal_ack(&ack_tx);
            }
            Packet::Alarm { code, .. } => {
                error!("Controller {}", format_alarm(code));
                signal_ack(&ack_tx);
            }
            Packet::Status(raw) => {
                if status_tx.try_send(raw).is_err() {
                    error!("Status queue full, discarding input and shutting down");
                    receiving.store(false, Ordering::Relaxed);
                    run.store(false, Ordering::Relaxed);
                }
            }
            other => {
                if input_tx.try_send(other).is_err() {
                    error!("Input queue full, discarding input and shutting down");
                    receiving.store(false, Ordering::Relaxed);
                    run.store(false, Ordering::Relaxed);
                }
            }
        }
    }
    debug!("Controller reader exited");
}

fn signal_ack(ack_tx: &Sender<()>) {
    if ack_tx.try_send(()).is_err() {
        warn!("Ack queue full; dropping ack");
    }
}

/// Format a jog number: fixed four decimals, trailing zeros trimmed, so
/// `0.03` stays `0.03` and `500.0` becomes `500`.
fn fmt_number(value: f64) -> String {
    let mut text = format!("{:.4}", value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}
