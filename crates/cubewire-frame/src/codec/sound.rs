use serde::{Deserialize, Serialize};

use super::{byte, clamp, duration_units, Encoded};
use crate::error::Result;
use crate::frame::ByteFrame;

/// Most notes a single sequence packet can carry.
pub const MAX_OPERATIONS: usize = 59;

/// Highest built-in sound effect id.
pub const MAX_PRESET_ID: u8 = 10;

const STOP: u8 = 0x01;
const PRESET: u8 = 0x02;
const SEQUENCE: u8 = 0x03;
const FULL_VOLUME: u8 = 0xFF;

/// One note of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundOperation {
    /// Clamped to 10..=2550 ms on encode.
    pub duration_ms: u32,
    /// MIDI note number; 128 is silence.
    pub note: u8,
}

impl SoundOperation {
    pub fn new(duration_ms: u32, note: u8) -> Self {
        Self { duration_ms, note }
    }
}

/// Normalized preset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSound {
    pub sound_id: u8,
}

/// Normalized sequence as sent to the cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundSequence {
    pub operations: Vec<SoundOperation>,
    /// 0 repeats forever.
    pub repeat_count: u8,
    /// Total play time; 0 when the sequence repeats forever.
    pub total_duration_ms: u32,
}

/// `[0x02, sound_id, 0xFF]` with the id clamped to 0..=10.
pub fn encode_preset(sound_id: i32) -> Result<Encoded<PresetSound>> {
    let sound_id = clamp(i64::from(sound_id), 0, i64::from(MAX_PRESET_ID)) as u8;
    let frame = ByteFrame::try_from_values([PRESET, sound_id, FULL_VOLUME])?;
    Ok(Encoded::new(frame, PresetSound { sound_id }))
}

/// `[0x03, repeat, count, (duration, note, 0xFF) * count]`
///
/// Only the first [`MAX_OPERATIONS`] notes are sent.
pub fn encode_sequence(
    operations: &[SoundOperation],
    repeat_count: i32,
) -> Result<Encoded<SoundSequence>> {
    let operations = &operations[..operations.len().min(MAX_OPERATIONS)];
    let repeat_count = byte(i64::from(repeat_count));

    let mut frame = ByteFrame::alloc(3 + 3 * operations.len());
    frame.write_u8(0, SEQUENCE)?;
    frame.write_u8(1, repeat_count)?;
    frame.write_u8(2, operations.len() as u8)?;

    let mut total_units = 0u32;
    let mut normalized = Vec::with_capacity(operations.len());
    for (i, operation) in operations.iter().enumerate() {
        let duration = duration_units(operation.duration_ms, 1);
        let base = 3 + 3 * i;
        frame.write_u8(base, duration)?;
        frame.write_u8(base + 1, operation.note)?;
        frame.write_u8(base + 2, FULL_VOLUME)?;
        total_units += u32::from(duration);
        normalized.push(SoundOperation::new(u32::from(duration) * 10, operation.note));
    }

    Ok(Encoded::new(
        frame,
        SoundSequence {
            operations: normalized,
            repeat_count,
            total_duration_ms: total_units * 10 * u32::from(repeat_count),
        },
    ))
}

/// `[0x01]`
pub fn encode_stop() -> ByteFrame {
    ByteFrame::from_slice(&[STOP])
}
