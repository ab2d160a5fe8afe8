use serde::{Deserialize, Serialize};

use super::{byte, duration_units, Encoded};
use crate::error::{FrameError, Result};
use crate::frame::ByteFrame;

/// Most operations a single scenario packet can carry.
pub const MAX_OPERATIONS: usize = 29;

const TURN_OFF: u8 = 0x01;
const TURN_ON: u8 = 0x03;
const SCENARIO: u8 = 0x04;
const LIGHT_COUNT: u8 = 0x01;
const LIGHT_ID: u8 = 0x01;

/// One timed colour step. Channels outside 0-255 are clamped on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightOperation {
    /// 0 keeps the light on until the next command.
    pub duration_ms: u32,
    pub red: i32,
    pub green: i32,
    pub blue: i32,
}

impl LightOperation {
    pub fn new(duration_ms: u32, red: i32, green: i32, blue: i32) -> Self {
        Self {
            duration_ms,
            red,
            green,
            blue,
        }
    }

    fn normalize(&self) -> (u8, [u8; 3], LightOperation) {
        let duration = duration_units(self.duration_ms, 0);
        let rgb = [
            byte(i64::from(self.red)),
            byte(i64::from(self.green)),
            byte(i64::from(self.blue)),
        ];
        let normalized = LightOperation {
            duration_ms: u32::from(duration) * 10,
            red: i32::from(rgb[0]),
            green: i32::from(rgb[1]),
            blue: i32::from(rgb[2]),
        };
        (duration, rgb, normalized)
    }
}

/// Normalized scenario as sent to the cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightScenario {
    pub operations: Vec<LightOperation>,
    /// 0 repeats forever.
    pub repeat_count: u8,
    /// Total play time; 0 when the scenario repeats forever.
    pub total_duration_ms: u32,
}

/// `[0x03, duration, 0x01, 0x01, r, g, b]`
pub fn encode_turn_on(operation: &LightOperation) -> Result<Encoded<LightOperation>> {
    let (duration, [red, green, blue], normalized) = operation.normalize();
    let frame = ByteFrame::try_from_values([
        TURN_ON, duration, LIGHT_COUNT, LIGHT_ID, red, green, blue,
    ])?;
    Ok(Encoded::new(frame, normalized))
}

/// `[0x04, repeat, count, (duration, 0x01, 0x01, r, g, b) * count]`
///
/// Only the first [`MAX_OPERATIONS`] operations are sent.
pub fn encode_scenario(
    operations: &[LightOperation],
    repeat_count: i32,
) -> Result<Encoded<LightScenario>> {
    if operations.is_empty() {
        return Err(FrameError::InvalidArgument("light scenario has no operations"));
    }

    let operations = &operations[..operations.len().min(MAX_OPERATIONS)];
    let repeat_count = byte(i64::from(repeat_count));

    let mut frame = ByteFrame::alloc(3 + 6 * operations.len());
    frame.write_u8(0, SCENARIO)?;
    frame.write_u8(1, repeat_count)?;
    frame.write_u8(2, operations.len() as u8)?;

    let mut total_units = 0u32;
    let mut normalized = Vec::with_capacity(operations.len());
    for (i, operation) in operations.iter().enumerate() {
        let (duration, [red, green, blue], op) = operation.normalize();
        let base = 3 + 6 * i;
        frame.write_u8(base, duration)?;
        frame.write_u8(base + 1, LIGHT_COUNT)?;
        frame.write_u8(base + 2, LIGHT_ID)?;
        frame.write_u8(base + 3, red)?;
        frame.write_u8(base + 4, green)?;
        frame.write_u8(base + 5, blue)?;
        total_units += u32::from(duration);
        normalized.push(op);
    }

    Ok(Encoded::new(
        frame,
        LightScenario {
            operations: normalized,
            repeat_count,
            total_duration_ms: total_units * 10 * u32::from(repeat_count),
        },
    ))
}

/// `[0x01]`
pub fn encode_turn_off() -> ByteFrame {
    ByteFrame::from_slice(&[TURN_OFF])
}
