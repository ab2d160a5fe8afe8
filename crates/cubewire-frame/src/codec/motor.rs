use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{clamp, duration_units, Encoded};
use crate::error::{FrameError, Result};
use crate::frame::ByteFrame;
use crate::tag::OperationIdAllocator;

/// Highest wheel power the firmware accepts.
pub const MAX_SPEED: u8 = 115;

/// Most targets a single move-to packet can carry.
pub const MAX_TARGETS_PER_OPERATION: usize = 29;

/// Rotate type meaning "do not rotate at the target".
pub const ROTATE_TYPE_NONE: u8 = 0x05;

/// Rotate type that is kept even when no angle is given.
pub const ROTATE_TYPE_KEEP: u8 = 0x06;

/// Coordinate sentinel meaning "keep the current value".
pub const UNCHANGED_COORDINATE: u16 = 0xFFFF;

const MAX_ANGLE: i64 = 0x1FFF;

const MOVE: u8 = 0x02;
const MOVE_TO_MULTIPLE: u8 = 0x04;
const MOVE_TO_RESPONSE: u8 = 0x83;
const MOVE_TO_MULTIPLE_RESPONSE: u8 = 0x84;

const LEFT_MOTOR: u8 = 0x01;
const RIGHT_MOTOR: u8 = 0x02;
const FORWARD: u8 = 0x01;
const BACKWARD: u8 = 0x02;

/// Normalized timed wheel command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveData {
    /// Signed left wheel power after capping.
    pub left: i32,
    /// Signed right wheel power after capping.
    pub right: i32,
    /// 0 drives until the next command.
    pub duration_ms: u32,
}

/// One waypoint of a move-to command. Unset fields keep the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveToTarget {
    pub x: Option<u16>,
    pub y: Option<u16>,
    /// Heading at the target, clamped to 0..=0x1FFF.
    pub angle: Option<u16>,
    pub rotate_type: Option<u8>,
}

/// Move-to behaviour shared by every target of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveToOptions {
    pub move_type: u8,
    pub max_speed: u8,
    pub speed_type: u8,
    /// Device-side timeout in seconds (0 uses the firmware default).
    pub timeout: u8,
    /// Replace an in-flight move-to instead of queueing after it.
    pub overwrite: bool,
    /// Filled in by the encoder with the allocated operation id.
    pub operation_id: Option<u8>,
}

impl Default for MoveToOptions {
    fn default() -> Self {
        Self {
            move_type: 0,
            max_speed: MAX_SPEED,
            speed_type: 0,
            timeout: 0,
            overwrite: true,
            operation_id: None,
        }
    }
}

/// Normalized move-to command as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveToData {
    pub targets: Vec<MoveToTarget>,
    pub options: MoveToOptions,
}

impl MoveToData {
    /// Operation id allocated for this request.
    pub fn operation_id(&self) -> u8 {
        self.options.operation_id.unwrap_or_default()
    }
}

/// Move-to completion reported by the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorResponse {
    pub operation_id: u8,
    pub reason: u8,
}

impl MotorResponse {
    /// Reached the target.
    pub const REASON_SUCCESS: u8 = 0x00;
    /// Superseded by a newer command; not a failure.
    pub const REASON_OVERWRITTEN: u8 = 0x05;

    /// Whether the response ends the request successfully.
    pub fn is_success(&self) -> bool {
        matches!(self.reason, Self::REASON_SUCCESS | Self::REASON_OVERWRITTEN)
    }
}

fn wheel(speed: i32) -> (i32, u8, u8) {
    let sign = if speed > 0 { 1 } else { -1 };
    let direction = if speed > 0 { FORWARD } else { BACKWARD };
    let power = speed.unsigned_abs().min(u32::from(MAX_SPEED)) as u8;
    (sign, direction, power)
}

/// `[0x02, 0x01, left_dir, left_power, 0x02, right_dir, right_power, duration]`
///
/// Stopped and negative wheels both use the backward direction byte.
pub fn encode_move(left: i32, right: i32, duration_ms: u32) -> Result<Encoded<MoveData>> {
    let (left_sign, left_dir, left_power) = wheel(left);
    let (right_sign, right_dir, right_power) = wheel(right);
    let duration = duration_units(duration_ms, 0);

    let frame = ByteFrame::try_from_values([
        MOVE,
        LEFT_MOTOR,
        left_dir,
        left_power,
        RIGHT_MOTOR,
        right_dir,
        right_power,
        duration,
    ])?;

    Ok(Encoded::new(
        frame,
        MoveData {
            left: left_sign * i32::from(left_power),
            right: right_sign * i32::from(right_power),
            duration_ms: u32::from(duration) * 10,
        },
    ))
}

/// Encode a multi-target move-to request, allocating a fresh operation id.
///
/// ```text
/// header  0x04 op_id timeout move_type max_speed speed_type 0x00 append
/// target  x:u16 y:u16 (rotate_type << 13 | angle):u16
/// ```
///
/// Only the first [`MAX_TARGETS_PER_OPERATION`] targets are sent.
pub fn encode_move_to(
    tags: &OperationIdAllocator,
    targets: &[MoveToTarget],
    options: MoveToOptions,
) -> Result<Encoded<MoveToData>> {
    let targets = &targets[..targets.len().min(MAX_TARGETS_PER_OPERATION)];
    let operation_id = tags.next();
    trace!(operation_id, targets = targets.len(), "encoding move-to");

    let mut frame = ByteFrame::alloc(8 + 6 * targets.len());
    frame.write_u8(0, MOVE_TO_MULTIPLE)?;
    frame.write_u8(1, operation_id)?;
    frame.write_u8(2, options.timeout)?;
    frame.write_u8(3, options.move_type)?;
    frame.write_u8(4, options.max_speed)?;
    frame.write_u8(5, options.speed_type)?;
    frame.write_u8(6, 0x00)?;
    frame.write_u8(7, if options.overwrite { 0 } else { 1 })?;

    for (i, target) in targets.iter().enumerate() {
        let base = 8 + 6 * i;
        let angle = clamp(i64::from(target.angle.unwrap_or(0)), 0, MAX_ANGLE) as u16;
        let mut rotate_type = target.rotate_type.unwrap_or(0x00);
        if target.angle.is_none() && target.rotate_type != Some(ROTATE_TYPE_KEEP) {
            rotate_type = ROTATE_TYPE_NONE;
        }
        // Three bits of rotate type above thirteen bits of angle.
        let packed = (u16::from(rotate_type & 0x07) << 13) | angle;

        frame.write_u16_le(base, target.x.unwrap_or(UNCHANGED_COORDINATE))?;
        frame.write_u16_le(base + 2, target.y.unwrap_or(UNCHANGED_COORDINATE))?;
        frame.write_u16_le(base + 4, packed)?;
    }

    Ok(Encoded::new(
        frame,
        MoveToData {
            targets: targets.to_vec(),
            options: MoveToOptions {
                operation_id: Some(operation_id),
                ..options
            },
        },
    ))
}

/// Decode a move-to response: `[0x83 | 0x84, operation_id, reason]`.
pub fn decode_response(frame: &ByteFrame) -> Result<MotorResponse> {
    if frame.len() != 3 {
        return Err(FrameError::parse(
            "motor response",
            format!("expected 3 bytes, got {}", frame.len()),
        ));
    }
    match frame.read_u8(0)? {
        MOVE_TO_RESPONSE | MOVE_TO_MULTIPLE_RESPONSE => Ok(MotorResponse {
            operation_id: frame.read_u8(1)?,
            reason: frame.read_u8(2)?,
        }),
        other => Err(FrameError::parse(
            "motor response",
            format!("unknown response type {other:#04x}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn move_bytes() {
        let encoded = encode_move(50, -50, 1000).unwrap();
        assert_eq!(
            encoded.frame.as_bytes(),
            &[0x02, 1, 1, 50, 2, 2, 50, 100]
        );
        assert_eq!(
            encoded.data,
            MoveData {
                left: 50,
                right: -50,
                duration_ms: 1000
            }
        );
    }

    #[test]
    fn stopped_wheel_uses_backward_direction() {
        let encoded = encode_move(0, 0, 0).unwrap();
        assert_eq!(encoded.frame.as_bytes(), &[0x02, 1, 2, 0, 2, 2, 0, 0]);
        assert_eq!(encoded.data.left, 0);
    }

    #[test]
    fn power_is_capped() {
        let encoded = encode_move(500, i32::MIN, 10).unwrap();
        assert_eq!(encoded.frame.as_bytes()[3], MAX_SPEED);
        assert_eq!(encoded.frame.as_bytes()[6], MAX_SPEED);
        assert_eq!(encoded.data.left, 115);
        assert_eq!(encoded.data.right, -115);
    }

    #[test]
    fn move_to_header_and_targets() {
        let tags = OperationIdAllocator::new();
        let targets = [
            MoveToTarget {
                x: Some(200),
                y: Some(300),
                angle: Some(90),
                rotate_type: Some(0x00),
            },
            MoveToTarget {
                x: None,
                y: Some(250),
                angle: None,
                rotate_type: None,
            },
        ];
        let options = MoveToOptions {
            move_type: 0,
            max_speed: 80,
            speed_type: 1,
            timeout: 5,
            overwrite: false,
            operation_id: None,
        };

        let encoded = encode_move_to(&tags, &targets, options).unwrap();
        assert_eq!(
            encoded.frame.as_bytes(),
            &[
                0x04, 1, 5, 0, 80, 1, 0, 1, //
                0xc8, 0x00, 0x2c, 0x01, 0x5a, 0x00, //
                0xff, 0xff, 0xfa, 0x00, 0x00, 0xa0,
            ]
        );
        assert_eq!(encoded.data.operation_id(), 1);
        assert_eq!(encoded.data.options.operation_id, Some(1));
    }

    #[test]
    fn rotate_keep_survives_missing_angle() {
        let tags = OperationIdAllocator::new();
        let target = MoveToTarget {
            x: Some(1),
            y: Some(1),
            angle: None,
            rotate_type: Some(ROTATE_TYPE_KEEP),
        };
        let encoded = encode_move_to(&tags, &[target], MoveToOptions::default()).unwrap();
        let packed = encoded.frame.read_u16_le(12).unwrap();
        assert_eq!(packed >> 13, u16::from(ROTATE_TYPE_KEEP));
        assert_eq!(packed & 0x1FFF, 0);
    }

    #[test]
    fn angle_is_clamped_to_thirteen_bits() {
        let tags = OperationIdAllocator::new();
        let target = MoveToTarget {
            angle: Some(0xFFFF),
            rotate_type: Some(0x01),
            ..MoveToTarget::default()
        };
        let encoded = encode_move_to(&tags, &[target], MoveToOptions::default()).unwrap();
        assert_eq!(encoded.frame.read_u16_le(12).unwrap(), (1 << 13) | 0x1FFF);
    }

    #[test]
    fn move_to_allocates_sequential_ids_and_caps_targets() {
        let tags = OperationIdAllocator::new();
        let targets = vec![MoveToTarget::default(); 40];
        let first = encode_move_to(&tags, &targets, MoveToOptions::default()).unwrap();
        let second = encode_move_to(&tags, &targets[..1], MoveToOptions::default()).unwrap();

        assert_eq!(first.data.targets.len(), MAX_TARGETS_PER_OPERATION);
        assert_eq!(first.frame.len(), 8 + 6 * MAX_TARGETS_PER_OPERATION);
        assert_eq!(first.data.operation_id(), 1);
        assert_eq!(second.data.operation_id(), 2);
        assert_eq!(first.frame.as_bytes()[7], 0, "overwrite defaults on");
    }

    #[test]
    fn response_decoding() {
        let response = decode_response(&ByteFrame::from_slice(&[0x83, 7, 0])).unwrap();
        assert_eq!(
            response,
            MotorResponse {
                operation_id: 7,
                reason: 0
            }
        );
        assert!(response.is_success());

        let response = decode_response(&ByteFrame::from_slice(&[0x84, 9, 5])).unwrap();
        assert!(response.is_success());
        let response = decode_response(&ByteFrame::from_slice(&[0x84, 9, 1])).unwrap();
        assert!(!response.is_success());
    }

    proptest! {
        #[test]
        fn response_rejects_wrong_length(bytes in proptest::collection::vec(any::<u8>(), 0..8)) {
            prop_assume!(bytes.len() != 3);
            prop_assert!(decode_response(&ByteFrame::from_slice(&bytes)).is_err());
        }

        #[test]
        fn response_rejects_unknown_type(kind in any::<u8>(), id in any::<u8>(), reason in any::<u8>()) {
            prop_assume!(kind != 0x83 && kind != 0x84);
            let result = decode_response(&ByteFrame::from_slice(&[kind, id, reason]));
            let is_parse_error = matches!(result, Err(FrameError::Parse { .. }));
            prop_assert!(is_parse_error);
        }

        #[test]
        fn power_and_sign_follow_speed(left in any::<i32>(), right in any::<i32>(), duration_ms in any::<u32>()) {
            let encoded = encode_move(left, right, duration_ms).unwrap();
            let bytes = encoded.frame.as_bytes();
            prop_assert!(bytes[3] <= MAX_SPEED);
            prop_assert!(bytes[6] <= MAX_SPEED);
            prop_assert_eq!(bytes[2], if left > 0 { 1 } else { 2 });
            prop_assert_eq!(bytes[5], if right > 0 { 1 } else { 2 });
            prop_assert_eq!(encoded.data.left > 0, left > 0);
            prop_assert_eq!(encoded.data.right > 0, right > 0);
            prop_assert_eq!(bytes[7], (duration_ms / 10).min(255) as u8);
        }
    }
}
