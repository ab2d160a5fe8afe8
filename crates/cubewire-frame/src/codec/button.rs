use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::frame::ByteFrame;

/// The only button id the protocol defines.
pub const FUNCTION_BUTTON: u8 = 0x01;

/// Button state notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonInfo {
    pub id: u8,
    pub pressed: bool,
}

/// Decode a button packet: `[id, state]`; any non-zero state means pressed.
pub fn decode(frame: &ByteFrame) -> Result<ButtonInfo> {
    if frame.len() < 2 {
        return Err(FrameError::too_short("button", 2, frame.len()));
    }
    let id = frame.read_u8(0)?;
    if id != FUNCTION_BUTTON {
        return Err(FrameError::parse("button", format!("unknown button id {id}")));
    }
    Ok(ButtonInfo {
        id,
        pressed: frame.read_u8(1)? != 0,
    })
}
