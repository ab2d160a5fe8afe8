use serde::{Deserialize, Serialize};

use super::card::StandardId;
use crate::error::{FrameError, Result};
use crate::frame::ByteFrame;

const POSITION_ID: u8 = 0x01;
const STANDARD_ID: u8 = 0x02;
const POSITION_ID_MISSED: u8 = 0x03;
const STANDARD_ID_MISSED: u8 = 0x04;

/// Absolute position read from a mat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionId {
    /// Cube centre.
    pub x: u16,
    pub y: u16,
    /// Cube heading in degrees.
    pub angle: u16,
    /// Position of the id sensor itself.
    pub sensor_x: u16,
    pub sensor_y: u16,
}

/// Standard id read from a card or sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardIdInfo {
    pub card_id: StandardId,
    pub angle: u16,
}

/// Which kind of id went out of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdMissed {
    Position,
    Standard,
}

/// One id-detection notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdReading {
    Position(PositionId),
    Standard(StandardIdInfo),
    Missed(IdMissed),
}

/// Decode an id packet. The first byte selects the layout:
///
/// ```text
/// 0x01  x:u16 y:u16 angle:u16 sensor_x:u16 sensor_y:u16   (11 bytes)
/// 0x02  card:u32 angle:u16                                (7 bytes)
/// 0x03  position id missed
/// 0x04  standard id missed
/// ```
pub fn decode(frame: &ByteFrame) -> Result<IdReading> {
    if frame.is_empty() {
        return Err(FrameError::too_short("id", 1, 0));
    }

    match frame.read_u8(0)? {
        POSITION_ID => {
            if frame.len() < 11 {
                return Err(FrameError::too_short("position id", 11, frame.len()));
            }
            Ok(IdReading::Position(PositionId {
                x: frame.read_u16_le(1)?,
                y: frame.read_u16_le(3)?,
                angle: frame.read_u16_le(5)?,
                sensor_x: frame.read_u16_le(7)?,
                sensor_y: frame.read_u16_le(9)?,
            }))
        }
        STANDARD_ID => {
            if frame.len() < 7 {
                return Err(FrameError::too_short("standard id", 7, frame.len()));
            }
            Ok(IdReading::Standard(StandardIdInfo {
                card_id: StandardId::from_raw(frame.read_u32_le(1)?),
                angle: frame.read_u16_le(5)?,
            }))
        }
        POSITION_ID_MISSED => Ok(IdReading::Missed(IdMissed::Position)),
        STANDARD_ID_MISSED => Ok(IdReading::Missed(IdMissed::Standard)),
        other => Err(FrameError::parse(
            "id",
            format!("unknown information type {other:#04x}"),
        )),
    }
}
