use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};
use crate::frame::{ByteFrame, TextEncoding};

const VERSION_REQUEST: u8 = 0x01;
const VERSION_RESPONSE: u8 = 0x81;
const COLLISION_THRESHOLD: u8 = 0x06;

/// Protocol version string reported by the firmware, e.g. `2.1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(major, minor)` if the version starts with two numeric components.
    pub fn major_minor(&self) -> Option<(u32, u32)> {
        let mut parts = self.0.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        Some((major, minor))
    }

    /// Move-to commands arrived with protocol 2.1.0.
    pub fn supports_move_to(&self) -> bool {
        self.major_minor()
            .is_some_and(|version| version >= (2, 1))
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ask the cube for its protocol version: `[0x01, 0x00]`.
pub fn encode_version_request() -> ByteFrame {
    ByteFrame::from_slice(&[VERSION_REQUEST, 0x00])
}

/// Decode a configuration notification.
///
/// Returns `Ok(None)` for well-formed responses that carry no version.
pub fn decode_version_response(frame: &ByteFrame) -> Result<Option<ProtocolVersion>> {
    if frame.is_empty() {
        return Err(FrameError::too_short("configuration", 1, 0));
    }
    if frame.read_u8(0)? != VERSION_RESPONSE {
        return Ok(None);
    }
    if frame.len() < 7 {
        return Err(FrameError::too_short("protocol version", 7, frame.len()));
    }
    let version = frame.decode_text(TextEncoding::Ascii, 2, 7)?;
    Ok(Some(ProtocolVersion(version)))
}

/// Set the collision detection threshold: `[0x06, 0x00, threshold]`.
pub fn encode_set_collision_threshold(threshold: u8) -> ByteFrame {
    ByteFrame::from_slice(&[COLLISION_THRESHOLD, 0x00, threshold])
}
