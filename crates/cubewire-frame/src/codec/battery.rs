use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::frame::ByteFrame;

/// Battery level notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryInfo {
    /// Remaining charge, 0-100 %.
    pub level: u8,
}

/// Decode a battery packet: `[level]`.
pub fn decode(frame: &ByteFrame) -> Result<BatteryInfo> {
    if frame.is_empty() {
        return Err(FrameError::too_short("battery", 1, 0));
    }
    Ok(BatteryInfo {
        level: frame.read_u8(0)?,
    })
}
