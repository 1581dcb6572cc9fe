//! Controller client integration tests against in-memory link ports.
//!
//! The mock reader half is fed bytes through a channel (standing in for
//! the controller's TX line) and the mock writer half records everything
//! the client sends, so the streaming protocol can be exercised
//! end-to-end without hardware.

use crossbeam_channel::{unbounded, Receiver, Sender};
use pendantkit_communication::{
    Controller, ControllerConfig, DollarCommand, LinkPort, Packet, RealtimeCommand,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct MockReader {
    incoming: Receiver<u8>,
}

impl LinkPort for MockReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.incoming.recv_timeout(Duration::from_millis(5)) {
            Ok(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            Err(_) => Ok(0),
        }
    }

    fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct MockWriter {
    written: Arc<Mutex<Vec<u8>>>,
}

impl LinkPort for MockWriter {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.lock().unwrap().extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Harness {
    controller: Controller,
    injector: Sender<u8>,
    written: Arc<Mutex<Vec<u8>>>,
    run: Arc<AtomicBool>,
}

impl Harness {
    fn new(config: ControllerConfig) -> Self {
        let (injector, incoming) = unbounded();
        let written = Arc::new(Mutex::new(Vec::new()));
        let run = Arc::new(AtomicBool::new(true));
        let controller = Controller::from_ports(
            Box::new(MockReader { incoming }),
            Box::new(MockWriter {
                written: Arc::clone(&written),
            }),
            Arc::clone(&run),
            config,
        );
        Self {
            controller,
            injector,
            written,
            run,
        }
    }

    fn with_defaults() -> Self {
        Self::new(ControllerConfig::default())
    }

    /// Feed controller output into the reader half.
    fn inject(&self, text: &str) {
        for byte in text.bytes() {
            self.injector.send(byte).unwrap();
        }
    }

    fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.written.lock().unwrap()).to_string()
    }

    /// Give the reader thread time to frame and dispatch injected bytes.
    fn settle(&self) {
        std::thread::sleep(Duration::from_millis(60));
    }
}

#[test]
fn test_single_line_streaming() {
    let h = Harness::with_defaults();

    h.controller.stream_line("G0 X10").unwrap();
    assert_eq!(h.written_string(), "G0 X10\r\n");
    assert_eq!(h.controller.pending_line_count(), 1);
    assert_eq!(h.controller.buffered_byte_total(), 8);

    h.inject("ok\r\n");
    h.settle();

    // The second call drains the ack and proceeds immediately.
    h.controller.stream_line("G0 X20").unwrap();
    assert_eq!(h.controller.pending_line_count(), 1);
    assert_eq!(h.controller.buffered_byte_total(), 8);
    assert!(h.written_string().ends_with("G0 X20\r\n"));
}

#[test]
fn test_buffer_saturation_blocks_until_ack() {
    let h = Harness::with_defaults();

    // 98 chars + CRLF = 100 bytes, then 28 + CRLF = 30: 130 > 128, so the
    // second send must wait for the first ack.
    let line_a = "G".repeat(98);
    let line_b = "G".repeat(28);
    h.controller.stream_line(&line_a).unwrap();
    assert_eq!(h.controller.buffered_byte_total(), 100);

    let injector = h.injector.clone();
    let feeder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(150));
        for byte in b"ok\r\n" {
            injector.send(*byte).unwrap();
        }
    });

    let start = Instant::now();
    h.controller.stream_line(&line_b).unwrap();
    let waited = start.elapsed();
    feeder.join().unwrap();

    assert!(waited >= Duration::from_millis(100), "send did not block: {:?}", waited);
    assert!(h.written_string().ends_with(&format!("{}\r\n", line_b)));
    assert_eq!(h.controller.buffered_byte_total(), 30);
    assert!(h.controller.buffered_byte_total() <= 128);
}

#[test]
fn test_realtime_bypasses_accounting() {
    let h = Harness::with_defaults();

    let line = "G".repeat(48);
    h.controller.stream_line(&line).unwrap();
    assert_eq!(h.controller.buffered_byte_total(), 50);

    h.controller.realtime_command(RealtimeCommand::Status).unwrap();

    let written = h.written.lock().unwrap().clone();
    assert_eq!(*written.last().unwrap(), b'?');
    assert_eq!(h.controller.buffered_byte_total(), 50);
    assert_eq!(h.controller.pending_line_count(), 1);
}

#[test]
fn test_status_routed_to_status_queue_only() {
    let h = Harness::with_defaults();

    h.inject("<Idle|MPos:0,0,0|FS:0,0>\r\n");

    let status = h.controller.get_status(Duration::from_millis(500));
    assert_eq!(status.as_deref(), Some("<Idle|MPos:0,0,0|FS:0,0>"));
    assert!(h.controller.get_input(Duration::from_millis(100)).is_none());
}

#[test]
fn test_non_status_routed_to_input_queue() {
    let h = Harness::with_defaults();

    h.inject("[MSG:Pgm End]\r\nGrbl 1.1h ['$' for help]\r\n");

    let first = h.controller.get_input(Duration::from_millis(500)).unwrap();
    assert!(matches!(first, Packet::Feedback(_)));
    let second = h.controller.get_input(Duration::from_millis(500)).unwrap();
    assert!(matches!(second, Packet::Standard(_)));
    assert!(h.controller.get_status(Duration::from_millis(100)).is_none());
}

#[test]
fn test_dollar_command_collects_reply() {
    let config = ControllerConfig {
        reply_gap_timeout: Duration::from_millis(100),
        ..ControllerConfig::default()
    };
    let h = Harness::new(config);

    let injector = h.injector.clone();
    let feeder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        for byte in b"[GC:G0 G54 G17 G21 G90 G94]\r\nok\r\n" {
            injector.send(*byte).unwrap();
        }
    });

    let reply = h.controller.dollar_command(DollarCommand::ViewParser).unwrap();
    feeder.join().unwrap();

    assert!(h.written_string().starts_with("$G\r\n"));
    assert_eq!(reply, "[GC:G0 G54 G17 G21 G90 G94]");
    // The terminating ok went to the ack path, not the reply.
    assert_eq!(h.controller.pending_line_count(), 0);
}

#[test]
fn test_error_response_frees_buffer() {
    let h = Harness::with_defaults();

    h.controller.stream_line("G0 X10").unwrap();
    h.inject("error:15\r\n");
    h.settle();

    // Next send drains the error ack and retires the pending line.
    h.controller.stream_line("G0 X0").unwrap();
    assert_eq!(h.controller.pending_line_count(), 1);
}

#[test]
fn test_unsolicited_ack_ignored() {
    let h = Harness::with_defaults();

    h.inject("ok\r\n");
    h.settle();

    h.controller.stream_line("M5").unwrap();
    assert_eq!(h.controller.pending_line_count(), 1);
    assert_eq!(h.controller.buffered_byte_total(), 4);
}

#[test]
fn test_pending_count_tracks_submissions_minus_acks() {
    let h = Harness::with_defaults();

    h.controller.stream_line("G0 X1").unwrap();
    h.controller.stream_line("G0 X2").unwrap();
    h.controller.stream_line("G0 X3").unwrap();
    assert_eq!(h.controller.pending_line_count(), 3);

    h.inject("ok\r\nok\r\n");
    h.settle();

    h.controller.stream_line("G0 X4").unwrap();
    assert_eq!(h.controller.pending_line_count(), 2);
}

#[test]
fn test_line_too_long_rejected() {
    let h = Harness::with_defaults();
    let line = "G".repeat(127);
    let err = h.controller.stream_line(&line);
    assert!(err.is_err());
    assert_eq!(h.controller.pending_line_count(), 0);
    assert!(h.written_string().is_empty());
}

#[test]
fn test_jog_incremental_axis_wire_format() {
    let h = Harness::with_defaults();
    h.controller.jog_incremental_axis('X', 0.03, 500.0).unwrap();
    assert_eq!(h.written_string(), "$J=G21 G91 X0.03 F500\r\n");
}

#[test]
fn test_jog_incremental_multi_axis() {
    let h = Harness::with_defaults();
    h.controller
        .jog_incremental(Some(10.0), None, Some(-0.5), 500.0)
        .unwrap();
    assert_eq!(h.written_string(), "$J=G21 G91 X10 Z-0.5 F500\r\n");
}

#[test]
fn test_jog_requires_axis() {
    let h = Harness::with_defaults();
    assert!(h.controller.jog_incremental(None, None, None, 500.0).is_err());
    assert!(h.controller.jog_incremental_axis('Q', 1.0, 500.0).is_err());
}

#[test]
fn test_status_queue_overflow_requests_shutdown() {
    let config = ControllerConfig {
        status_queue_size: 1,
        ..ControllerConfig::default()
    };
    let h = Harness::new(config);

    h.inject("<Idle|MPos:0,0,0|FS:0,0>\r\n<Idle|MPos:1,0,0|FS:0,0>\r\n");

    let deadline = Instant::now() + Duration::from_secs(1);
    while h.run.load(Ordering::Relaxed) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!h.run.load(Ordering::Relaxed), "run flag was not cleared");
}

#[test]
fn test_shutdown_pokes_and_joins() {
    let h = Harness::with_defaults();

    h.controller.stream_line("G0 X1").unwrap();
    h.controller.shutdown();

    assert!(h.controller.is_shutdown());
    assert!(h.written_string().ends_with("?\r\n$\r\n"));

    // Idempotent.
    h.controller.shutdown();
    assert!(h.controller.is_shutdown());
}
