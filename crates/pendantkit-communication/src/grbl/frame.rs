//! GRBL line framing
//!
//! Delivers successive text frames from the byte-oriented serial link. A
//! frame terminates on `CR LF` or when the 128-byte cap is hit; outer
//! whitespace is stripped and empty frames are suppressed.

use crate::link::LinkPort;
use std::io;
use tracing::warn;

/// Frame cap. GRBL never emits a longer line; hitting the cap means the
/// stream is corrupt or mid-desync, so the truncated content is still
/// delivered for classification.
pub const MAX_FRAME: usize = 128;

/// Read one frame from the link.
///
/// Returns `Ok(None)` when the line is idle (read timeout with nothing
/// accumulated) or when the frame strips down to nothing, so the caller
/// can re-check its run flag between frames. A timeout in the middle of a
/// frame keeps accumulating; the shutdown poke guarantees the partial
/// frame eventually completes.
pub fn read_frame(port: &mut dyn LinkPort) -> io::Result<Option<String>> {
    let mut frame: Vec<u8> = Vec::with_capacity(MAX_FRAME);
    let mut byte = [0u8; 1];

    while frame.len() < MAX_FRAME {
        let n = port.read(&mut byte)?;
        if n == 0 {
            if frame.is_empty() {
                return Ok(None);
            }
            continue;
        }
        frame.push(byte[0]);
        if byte[0] == b'\n' && frame.len() >= 2 && frame[frame.len() - 2] == b'\r' {
            break;
        }
    }

    if frame.len() >= MAX_FRAME {
        warn!("Max sized frame -- input may be truncated");
    }

    let text = String::from_utf8_lossy(&frame);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedPort {
        bytes: VecDeque<u8>,
    }

    impl ScriptedPort {
        fn new(data: &[u8]) -> Self {
            Self {
                bytes: data.iter().copied().collect(),
            }
        }
    }

    impl LinkPort for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.bytes.pop_front() {
                Some(b) => {
                    buf[0] = b;
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_crlf_terminated_frame() {
        let mut port = ScriptedPort::new(b"ok\r\n");
        assert_eq!(read_frame(&mut port).unwrap().as_deref(), Some("ok"));
    }

    #[test]
    fn test_strips_outer_whitespace() {
        let mut port = ScriptedPort::new(b"  <Idle>  \r\n");
        assert_eq!(read_frame(&mut port).unwrap().as_deref(), Some("<Idle>"));
    }

    #[test]
    fn test_suppresses_empty_frame() {
        let mut port = ScriptedPort::new(b"\r\n");
        assert_eq!(read_frame(&mut port).unwrap(), None);
    }

    #[test]
    fn test_idle_timeout_returns_none() {
        let mut port = ScriptedPort::new(b"");
        assert_eq!(read_frame(&mut port).unwrap(), None);
    }

    #[test]
    fn test_caps_unterminated_frame() {
        // 200 bytes with no CRLF: one truncated frame of MAX_FRAME bytes.
        let data = vec![b'x'; 200];
        let mut port = ScriptedPort::new(&data);
        let frame = read_frame(&mut port).unwrap().unwrap();
        assert_eq!(frame.len(), MAX_FRAME);
        assert!(frame.bytes().all(|b| b == b'x'));
    }

    #[test]
    fn test_successive_frames() {
        let mut port = ScriptedPort::new(b"ok\r\nerror:9\r\n");
        assert_eq!(read_frame(&mut port).unwrap().as_deref(), Some("ok"));
        assert_eq!(read_frame(&mut port).unwrap().as_deref(), Some("error:9"));
    }
}
