//! GRBL status report parsing
//!
//! Parses the angle-bracketed realtime report produced in response to
//! `?`, e.g. `<Idle|MPos:1.000,-2.500,0.000|FS:500,0|Bf:15,128>`. The
//! fields the pendant display needs (state, coordinates, feed, spindle)
//! are fully typed; the rest are captured raw.

use pendantkit_core::CoordinateSpace;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One parsed status report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Machine state token: Idle, Run, Jog, Hold, Alarm, Door, ...
    pub state: String,
    /// Whether the coordinates are machine (`MPos`) or workpiece (`WPos`)
    pub coordinate_space: CoordinateSpace,
    /// X/Y/Z position in the reported coordinate space
    pub coordinates: [f64; 3],
    /// Current feed rate (mm/min)
    pub feed_rate: f64,
    /// Current spindle speed (RPM)
    pub spindle_speed: u32,
    /// Plan buffer blocks available (`Bf:` first value)
    pub plan_buffers: Option<u32>,
    /// RX buffer bytes available (`Bf:` second value)
    pub rx_buffers: Option<u32>,
    /// Line number being executed (`Ln:`)
    pub line_number: Option<u32>,
    /// Work coordinate offset, raw (`WCO:`)
    pub work_coordinate_offset: Option<String>,
    /// Override percentages, raw (`Ov:`)
    pub overrides: Option<String>,
    /// Accessory state, raw (`A:`)
    pub accessory_state: Option<String>,
    /// Triggered pin states, raw (`Pn:`)
    pub pin_states: Option<String>,
}

impl StatusReport {
    /// Parse a status report line. Returns `None` when the line is not a
    /// well-formed report.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.trim();
        let body = body.strip_prefix('<')?.strip_suffix('>')?;

        let mut segments = body.split('|');
        let state = segments.next()?.trim();
        if state.is_empty() {
            return None;
        }

        let mut report = StatusReport {
            state: state.to_string(),
            coordinate_space: CoordinateSpace::Machine,
            coordinates: [0.0; 3],
            feed_rate: 0.0,
            spindle_speed: 0,
            plan_buffers: None,
            rx_buffers: None,
            line_number: None,
            work_coordinate_offset: None,
            overrides: None,
            accessory_state: None,
            pin_states: None,
        };

        for segment in segments {
            let segment = segment.trim();
            if let Some(pos) = segment.strip_prefix("MPos:") {
                report.coordinate_space = CoordinateSpace::Machine;
                report.coordinates = parse_coordinates(pos)?;
            } else if let Some(pos) = segment.strip_prefix("WPos:") {
                report.coordinate_space = CoordinateSpace::Workpiece;
                report.coordinates = parse_coordinates(pos)?;
            } else if let Some(fs) = segment.strip_prefix("FS:") {
                let mut values = fs.split(',');
                report.feed_rate = values.next()?.trim().parse::<f64>().ok()?;
                report.spindle_speed =
                    values.next()?.trim().parse::<f64>().ok()? as u32;
            } else if let Some(feed) = segment.strip_prefix("F:") {
                report.feed_rate = feed.trim().parse::<f64>().ok()?;
            } else if let Some(buffers) = segment.strip_prefix("Bf:") {
                let mut values = buffers.split(',');
                report.plan_buffers = values.next().and_then(|v| v.trim().parse().ok());
                report.rx_buffers = values.next().and_then(|v| v.trim().parse().ok());
            } else if let Some(line_number) = segment.strip_prefix("Ln:") {
                report.line_number = line_number.trim().parse().ok();
            } else if let Some(wco) = segment.strip_prefix("WCO:") {
                report.work_coordinate_offset = Some(wco.to_string());
            } else if let Some(overrides) = segment.strip_prefix("Ov:") {
                report.overrides = Some(overrides.to_string());
            } else if let Some(accessories) = segment.strip_prefix("A:") {
                report.accessory_state = Some(accessories.to_string());
            } else if let Some(pins) = segment.strip_prefix("Pn:") {
                report.pin_states = Some(pins.to_string());
            } else {
                warn!("Unimplemented status field: {}", segment);
            }
        }

        Some(report)
    }
}

/// Parse the first three comma-separated floats of a position field.
fn parse_coordinates(pos: &str) -> Option<[f64; 3]> {
    let mut values = pos.split(',');
    let x = values.next()?.trim().parse::<f64>().ok()?;
    let y = values.next()?.trim().parse::<f64>().ok()?;
    let z = values.next()?.trim().parse::<f64>().ok()?;
    Some([x, y, z])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_idle_machine_coordinates() {
        let report = StatusReport::parse("<Idle|MPos:1.000,-2.500,0.000|FS:500,0>").unwrap();
        assert_eq!(report.state, "Idle");
        assert_eq!(report.coordinate_space, CoordinateSpace::Machine);
        assert_eq!(report.coordinates, [1.0, -2.5, 0.0]);
        assert_eq!(report.feed_rate, 500.0);
        assert_eq!(report.spindle_speed, 0);
    }

    #[test]
    fn test_parse_workpiece_coordinates() {
        let report = StatusReport::parse("<Jog|WPos:10.5,20.0,-3.25|FS:800,12000>").unwrap();
        assert_eq!(report.state, "Jog");
        assert_eq!(report.coordinate_space, CoordinateSpace::Workpiece);
        assert_eq!(report.coordinates, [10.5, 20.0, -3.25]);
        assert_eq!(report.spindle_speed, 12000);
    }

    #[test]
    fn test_parse_feed_only_field() {
        let report = StatusReport::parse("<Run|MPos:0,0,0|F:250>").unwrap();
        assert_eq!(report.feed_rate, 250.0);
        assert_eq!(report.spindle_speed, 0);
    }

    #[test]
    fn test_parse_optional_fields() {
        let line = "<Run|MPos:0,0,0|FS:100,1000|Bf:15,128|Ln:42|WCO:1.0,2.0,3.0|Ov:100,100,100|Pn:XYZ>";
        let report = StatusReport::parse(line).unwrap();
        assert_eq!(report.plan_buffers, Some(15));
        assert_eq!(report.rx_buffers, Some(128));
        assert_eq!(report.line_number, Some(42));
        assert_eq!(report.work_coordinate_offset.as_deref(), Some("1.0,2.0,3.0"));
        assert_eq!(report.overrides.as_deref(), Some("100,100,100"));
        assert_eq!(report.pin_states.as_deref(), Some("XYZ"));
    }

    #[test]
    fn test_parse_hold_substate() {
        let report = StatusReport::parse("<Hold:0|MPos:0,0,0|FS:0,0>").unwrap();
        assert_eq!(report.state, "Hold:0");
    }

    #[test]
    fn test_parse_unknown_field_tolerated() {
        let report = StatusReport::parse("<Idle|MPos:0,0,0|FS:0,0|Qz:7>").unwrap();
        assert_eq!(report.state, "Idle");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(StatusReport::parse("Idle|MPos:0,0,0").is_none());
        assert!(StatusReport::parse("<>").is_none());
        assert!(StatusReport::parse("<Idle|MPos:bad,0,0>").is_none());
        assert!(StatusReport::parse("<Idle|MPos:0,0>").is_none());
    }

    #[test]
    fn test_parse_no_position_defaults_to_machine_zero() {
        let report = StatusReport::parse("<Alarm>").unwrap();
        assert_eq!(report.coordinate_space, CoordinateSpace::Machine);
        assert_eq!(report.coordinates, [0.0, 0.0, 0.0]);
    }
}
