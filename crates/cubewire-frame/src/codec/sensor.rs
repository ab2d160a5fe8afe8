use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::frame::ByteFrame;

const MOTION_DETECTION: u8 = 0x01;

/// Motion sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorState {
    pub is_sloped: bool,
    pub is_collision_detected: bool,
    pub is_double_tapped: bool,
    /// Which face points up (1-6).
    pub orientation: u8,
}

/// Decode a motion detection packet:
/// `[0x01, level, collision, double_tap, orientation]`.
///
/// The level byte is 1 while the cube sits flat, so 0 means sloped.
pub fn decode(frame: &ByteFrame) -> Result<SensorState> {
    if frame.len() < 5 {
        return Err(FrameError::too_short("sensor", 5, frame.len()));
    }
    let kind = frame.read_u8(0)?;
    if kind != MOTION_DETECTION {
        return Err(FrameError::parse(
            "sensor",
            format!("unknown information type {kind:#04x}"),
        ));
    }
    Ok(SensorState {
        is_sloped: frame.read_u8(1)? == 0,
        is_collision_detected: frame.read_u8(2)? == 1,
        is_double_tapped: frame.read_u8(3)? == 1,
        orientation: frame.read_u8(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_flags() {
        let state = decode(&ByteFrame::from_slice(&[0x01, 0x00, 0x01, 0x00, 0x03])).unwrap();
        assert_eq!(
            state,
            SensorState {
                is_sloped: true,
                is_collision_detected: true,
                is_double_tapped: false,
                orientation: 3,
            }
        );
    }

    #[test]
    fn level_cube_is_not_sloped() {
        let state = decode(&ByteFrame::from_slice(&[0x01, 0x01, 0x00, 0x01, 0x01])).unwrap();
        assert!(!state.is_sloped);
        assert!(state.is_double_tapped);
    }

    #[test]
    fn requires_five_bytes() {
        let err = decode(&ByteFrame::from_slice(&[0x01, 0x01, 0x00, 0x00])).unwrap_err();
        assert!(matches!(err, FrameError::Parse { what: "sensor", .. }));
    }

    #[test]
    fn rejects_other_information_types() {
        let err = decode(&ByteFrame::from_slice(&[0x02, 0x01, 0x00, 0x00, 0x01])).unwrap_err();
        assert!(matches!(err, FrameError::Parse { .. }));
    }
}
