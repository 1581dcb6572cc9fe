//! Pendant device client
//!
//! Opens the XHC RF receiver over hidapi, validates it is the expected
//! hardware, runs the reset handshake, and pumps input reports from a
//! reader thread into a bounded queue. Display writes come from other
//! workers and are serialized by a write lock so the three fragments of
//! a display packet never interleave.

use crate::report::{DisplayFrame, InputReport, INPUT_REPORT_LEN};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use pendantkit_core::error::{LinkError, ProtocolError};
use pendantkit_core::{CoordinateSpace, MotionMode, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// USB vendor id of the XHC RF receiver.
pub const VENDOR_ID: u16 = 0x10CE;

/// USB product id of the XHC RF receiver.
pub const PRODUCT_ID: u16 = 0xEB93;

/// Manufacturer string the genuine receiver reports.
pub const MANUFACTURER: &str = "KTURT.LTD";

/// Pendant client configuration.
#[derive(Debug, Clone)]
pub struct PendantConfig {
    /// HID read timeout; bounds how long shutdown waits on the reader.
    pub read_timeout: Duration,
    /// Depth of the input report queue.
    pub input_queue_size: usize,
    /// Motion mode shown after the reset handshake.
    pub initial_motion_mode: MotionMode,
}

impl Default for PendantConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(1000),
            input_queue_size: 64,
            initial_motion_mode: MotionMode::Step,
        }
    }
}

/// Report-oriented half of the HID link. hidapi device handles take
/// `&self` for both directions, so one shared handle serves the reader
/// thread and the display writers.
pub trait HidLink: Send + Sync {
    /// Read one input report. `Ok(0)` means the read timed out.
    fn read_report(&self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Write one output report.
    fn write_report(&self, data: &[u8]) -> Result<()>;
}

struct HidApiLink {
    device: hidapi::HidDevice,
}

fn hid_error(e: hidapi::HidError) -> pendantkit_core::Error {
    LinkError::Io(std::io::Error::other(e.to_string())).into()
}

impl HidLink for HidApiLink {
    fn read_report(&self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        self.device
            .read_timeout(buf, timeout.as_millis() as i32)
            .map_err(hid_error)
    }

    fn write_report(&self, data: &[u8]) -> Result<()> {
        let written = self.device.write(data).map_err(hid_error)?;
        if written != data.len() {
            return Err(LinkError::Io(std::io::Error::other(format!(
                "short HID write: {} of {} bytes",
                written,
                data.len()
            )))
            .into());
        }
        Ok(())
    }
}

/// The pendant client.
pub struct Pendant {
    link: Arc<dyn HidLink>,
    write_lock: Mutex<()>,
    input_rx: Receiver<InputReport>,
    receiving: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Pendant {
    /// Find the receiver, open it, start the reader thread, and run the
    /// reset handshake.
    ///
    /// `run` is the process-wide run flag; it is cleared if the input
    /// queue saturates or the device disappears.
    pub fn open(run: Arc<AtomicBool>, config: PendantConfig) -> Result<Self> {
        let device_label = format!("{:04x}:{:04x}", VENDOR_ID, PRODUCT_ID);
        let api = hidapi::HidApi::new().map_err(|e| LinkError::FailedToOpen {
            device: device_label.clone(),
            reason: e.to_string(),
        })?;

        let matches: Vec<_> = api
            .device_list()
            .filter(|d| d.vendor_id() == VENDOR_ID && d.product_id() == PRODUCT_ID)
            .collect();
        if matches.is_empty() {
            return Err(LinkError::NotFound {
                device: device_label,
            }
            .into());
        }
        if matches.len() > 1 {
            warn!("More than one XHC pendant receiver found; using the first");
        }

        let device = matches[0]
            .open_device(&api)
            .map_err(|e| LinkError::FailedToOpen {
                device: device_label.clone(),
                reason: e.to_string(),
            })?;

        let manufacturer = device
            .get_manufacturer_string()
            .map_err(hid_error)?
            .unwrap_or_default();
        if manufacturer != MANUFACTURER {
            return Err(LinkError::WrongDevice {
                expected: MANUFACTURER.to_string(),
                actual: manufacturer,
            }
            .into());
        }

        info!("Connected to pendant receiver {}", device_label);
        let initial_mode = config.initial_motion_mode;
        let pendant = Self::from_link(Arc::new(HidApiLink { device }), run, config);
        pendant.reset(initial_mode)?;
        Ok(pendant)
    }

    /// Build a client from an already-open link. Used by tests; does not
    /// run the reset handshake.
    pub fn from_link(
        link: Arc<dyn HidLink>,
        run: Arc<AtomicBool>,
        config: PendantConfig,
    ) -> Self {
        let (input_tx, input_rx) = bounded(config.input_queue_size);
        let receiving = Arc::new(AtomicBool::new(true));

        let reader_link = Arc::clone(&link);
        let reader_flag = Arc::clone(&receiving);
        let read_timeout = config.read_timeout;
        let handle = std::thread::Builder::new()
            .name("pendant-reader".to_string())
            .spawn(move || reader_loop(reader_link, reader_flag, run, input_tx, read_timeout))
            .expect("failed to spawn pendant-reader thread");

        Self {
            link,
            write_lock: Mutex::new(()),
            input_rx,
            receiving,
            reader: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
        }
    }

    /// Bring the pendant out of reset: a display packet with the reset
    /// flag set, then one clearing it and showing `motion_mode`.
    ///
    /// The LCD retains coordinate values across power cycles; they stay
    /// until the first real display update.
    pub fn reset(&self, motion_mode: MotionMode) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.write_frame(&DisplayFrame::blank(motion_mode, true))?;
        self.write_frame(&DisplayFrame::blank(motion_mode, false))?;
        debug!("Pendant reset");
        Ok(())
    }

    /// Push one display update to the LCD.
    ///
    /// `coordinates` must be exactly three finite values that fit the
    /// 16-bit integer part of the packed fixed-point encoding.
    pub fn update_display(
        &self,
        motion_mode: MotionMode,
        coordinate_space: CoordinateSpace,
        coordinates: &[f64],
        feed_rate: u16,
        spindle_speed: u16,
    ) -> Result<()> {
        if coordinates.len() != 3 {
            return Err(ProtocolError::InvalidDisplay {
                reason: format!("expected 3 coordinates, got {}", coordinates.len()),
            }
            .into());
        }
        for value in coordinates {
            if !value.is_finite() || value.abs() >= 65536.0 {
                return Err(ProtocolError::InvalidDisplay {
                    reason: format!("coordinate {} not displayable", value),
                }
                .into());
            }
        }

        let frame = DisplayFrame {
            motion_mode,
            coordinate_space,
            coordinates: [coordinates[0], coordinates[1], coordinates[2]],
            feed_rate,
            spindle_speed,
            reset: false,
        };
        let _guard = self.write_lock.lock();
        self.write_frame(&frame)
    }

    /// Next input report, if one arrives within `timeout`.
    pub fn get_input(&self, timeout: Duration) -> Option<InputReport> {
        self.input_rx.recv_timeout(timeout).ok()
    }

    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Stop the reader thread and close the client. The HID read timeout
    /// bounds how long the join waits.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::Relaxed) {
            debug!("Pendant shutdown: already closed");
            return;
        }
        self.receiving.store(false, Ordering::Relaxed);
        if let Some(handle) = self.reader.lock().take() {
            if handle.join().is_err() {
                error!("Pendant reader thread panicked");
            }
        }
        info!("Pendant link closed");
    }

    fn write_frame(&self, frame: &DisplayFrame) -> Result<()> {
        for report in frame.reports() {
            self.link.write_report(&report)?;
        }
        Ok(())
    }
}

impl Drop for Pendant {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reader_loop(
    link: Arc<dyn HidLink>,
    receiving: Arc<AtomicBool>,
    run: Arc<AtomicBool>,
    input_tx: Sender<InputReport>,
    read_timeout: Duration,
) {
    let mut buf = [0u8; INPUT_REPORT_LEN];
    while receiving.load(Ordering::Relaxed) {
        let n = match link.read_report(&mut buf, read_timeout) {
            Ok(0) => continue,
            Ok(n) => n,
            Err(e) => {
                error!("Pendant read failed: {}", e);
                receiving.store(false, Ordering::Relaxed);
                run.store(false, Ordering::Relaxed);
                break;
            }
        };

        let Some(report) = InputReport::parse(&buf[..n]) else {
            continue;
        };
        trace!("Pendant input: {:?}", report);
        if input_tx.try_send(report).is_err() {
            error!("Pendant input queue full, discarding input and shutting down");
            receiving.store(false, Ordering::Relaxed);
            run.store(false, Ordering::Relaxed);
        }
    }
    debug!("Pendant reader exited");
}
