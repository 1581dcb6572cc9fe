//! GRBL packet classification
//!
//! GRBL interleaves response messages (`ok`, `error:N`) with push messages
//! (status reports, feedback, parameter data, startup banners) on the same
//! serial stream. `Packet` is the tagged classification of one framed
//! line; downstream code matches on the variant instead of re-sniffing
//! strings.

use std::fmt;

/// One classified line from the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// `ok` acknowledgment
    Ok,
    /// `error:N` response; also acknowledges (and frees) the pending line
    Error {
        /// Numeric error code (0 when the suffix failed to parse).
        code: u8,
        /// The raw line.
        line: String,
    },
    /// `ALARM:N` push message; the controller is now in alarm state
    Alarm {
        /// Numeric alarm code (0 when the suffix failed to parse).
        code: u8,
        /// The raw line.
        line: String,
    },
    /// `<...>` realtime status report
    Status(String),
    /// `[MSG:...]` unsolicited feedback
    Feedback(String),
    /// `[GC:...]` parser state, in response to `$G`
    GcodeState(String),
    /// `[G54:...]`/`[TLO:...]`/`[PRB:...]` parameter data, or `$N=V` lines
    Parameter(String),
    /// `[VER:...]`/`[OPT:...]` build info from `$I`
    Build(String),
    /// `[echo:...]` pre-parse line echo
    Echo(String),
    /// `>...:ok` startup block execution
    Startup(String),
    /// Anything else (e.g. the power-on banner)
    Standard(String),
}

fn trailing_code(line: &str, prefix: &str) -> u8 {
    line[prefix.len()..].trim().parse::<u8>().unwrap_or(0)
}

impl Packet {
    /// Classify one framed line. First match wins.
    pub fn classify(line: &str) -> Packet {
        if line == "ok" {
            return Packet::Ok;
        }
        if line.starts_with("error:") {
            return Packet::Error {
                code: trailing_code(line, "error:"),
                line: line.to_string(),
            };
        }
        if line.starts_with("ALARM:") {
            return Packet::Alarm {
                code: trailing_code(line, "ALARM:"),
                line: line.to_string(),
            };
        }
        if line.starts_with('<') && line.ends_with('>') {
            return Packet::Status(line.to_string());
        }
        if line.starts_with("[MSG:") {
            return Packet::Feedback(line.to_string());
        }
        if line.starts_with("[GC:") {
            return Packet::GcodeState(line.to_string());
        }
        if line.starts_with("[VER:") || line.starts_with("[OPT:") {
            return Packet::Build(line.to_string());
        }
        if line.starts_with("[echo:") {
            return Packet::Echo(line.to_string());
        }
        if line.starts_with("[G") || line.starts_with("[TLO:") || line.starts_with("[PRB:") {
            return Packet::Parameter(line.to_string());
        }
        if line.starts_with('>') && line.ends_with(":ok") {
            return Packet::Startup(line.to_string());
        }
        if line.starts_with('$') {
            return Packet::Parameter(line.to_string());
        }
        Packet::Standard(line.to_string())
    }

    /// Whether this packet acknowledges a streamed line. Alarms free the
    /// associated buffer too, so they count.
    pub fn is_ack(&self) -> bool {
        matches!(
            self,
            Packet::Ok | Packet::Error { .. } | Packet::Alarm { .. }
        )
    }

    /// The raw line text.
    pub fn text(&self) -> &str {
        match self {
            Packet::Ok => "ok",
            Packet::Error { line, .. } | Packet::Alarm { line, .. } => line,
            Packet::Status(line)
            | Packet::Feedback(line)
            | Packet::GcodeState(line)
            | Packet::Parameter(line)
            | Packet::Build(line)
            | Packet::Echo(line)
            | Packet::Startup(line)
            | Packet::Standard(line) => line,
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok() {
        assert_eq!(Packet::classify("ok"), Packet::Ok);
        // Only the exact token is an ack.
        assert!(matches!(Packet::classify("okay"), Packet::Standard(_)));
    }

    #[test]
    fn test_error_with_code() {
        let p = Packet::classify("error:9");
        assert_eq!(
            p,
            Packet::Error {
                code: 9,
                line: "error:9".to_string()
            }
        );
        assert!(p.is_ack());
    }

    #[test]
    fn test_error_unparsable_code() {
        assert!(matches!(
            Packet::classify("error:what"),
            Packet::Error { code: 0, .. }
        ));
    }

    #[test]
    fn test_alarm() {
        let p = Packet::classify("ALARM:2");
        assert!(matches!(p, Packet::Alarm { code: 2, .. }));
        assert!(p.is_ack());
    }

    #[test]
    fn test_status() {
        let p = Packet::classify("<Idle|MPos:0.000,0.000,0.000|FS:0,0>");
        assert!(matches!(p, Packet::Status(_)));
        assert!(!p.is_ack());
    }

    #[test]
    fn test_bracket_messages() {
        assert!(matches!(
            Packet::classify("[MSG:Pgm End]"),
            Packet::Feedback(_)
        ));
        assert!(matches!(
            Packet::classify("[GC:G0 G54 G17 G21 G90 G94]"),
            Packet::GcodeState(_)
        ));
        assert!(matches!(
            Packet::classify("[VER:1.1h.20190825:]"),
            Packet::Build(_)
        ));
        assert!(matches!(
            Packet::classify("[OPT:V,15,128]"),
            Packet::Build(_)
        ));
        assert!(matches!(
            Packet::classify("[echo:G1X1]"),
            Packet::Echo(_)
        ));
        assert!(matches!(
            Packet::classify("[G54:0.000,0.000,0.000]"),
            Packet::Parameter(_)
        ));
        assert!(matches!(
            Packet::classify("[TLO:0.000]"),
            Packet::Parameter(_)
        ));
        assert!(matches!(
            Packet::classify("[PRB:0.000,0.000,0.000:0]"),
            Packet::Parameter(_)
        ));
    }

    #[test]
    fn test_gc_beats_generic_bracket_g() {
        // "[GC:" must classify as parser state, not parameter data, even
        // though it also matches the "[G" prefix.
        assert!(matches!(Packet::classify("[GC:G0]"), Packet::GcodeState(_)));
    }

    #[test]
    fn test_startup_line() {
        assert!(matches!(
            Packet::classify(">G54G20:ok"),
            Packet::Startup(_)
        ));
        assert!(matches!(
            Packet::classify(">G54G20:error:7"),
            Packet::Standard(_)
        ));
    }

    #[test]
    fn test_dollar_setting() {
        assert!(matches!(Packet::classify("$0=10"), Packet::Parameter(_)));
    }

    #[test]
    fn test_banner_is_standard() {
        assert!(matches!(
            Packet::classify("Grbl 1.1h ['$' for help]"),
            Packet::Standard(_)
        ));
    }
}
