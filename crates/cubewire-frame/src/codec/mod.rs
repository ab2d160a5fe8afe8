//! Per-characteristic packet codecs.
//!
//! Encoders return an [`Encoded`] pair: the wire frame plus the normalized
//! command that was actually sent (after clamping and capping).

pub mod battery;
pub mod button;
pub mod card;
pub mod configuration;
pub mod id;
pub mod light;
pub mod motor;
pub mod sensor;
pub mod sound;

use crate::frame::ByteFrame;

/// Saturate `value` into `min..=max`.
pub fn clamp(value: i64, min: i64, max: i64) -> i64 {
    value.max(min).min(max)
}

/// Device durations travel as a byte counting 10 ms units.
pub(crate) fn duration_units(duration_ms: u32, min: i64) -> u8 {
    // Bounded to 0..=255 by the clamp.
    clamp(i64::from(duration_ms / 10), min, 255) as u8
}

pub(crate) fn byte(value: i64) -> u8 {
    clamp(value, 0, 255) as u8
}

/// A wire frame together with the normalized command it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded<T> {
    pub frame: ByteFrame,
    pub data: T,
}

impl<T> Encoded<T> {
    pub(crate) fn new(frame: ByteFrame, data: T) -> Self {
        Self { frame, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_saturates_both_ends() {
        assert_eq!(clamp(-5, 0, 255), 0);
        assert_eq!(clamp(300, 0, 255), 255);
        assert_eq!(clamp(42, 0, 255), 42);
    }

    #[test]
    fn duration_is_truncated_to_ten_millisecond_units() {
        assert_eq!(duration_units(0, 0), 0);
        assert_eq!(duration_units(9, 0), 0);
        assert_eq!(duration_units(9, 1), 1);
        assert_eq!(duration_units(1_999, 0), 199);
        assert_eq!(duration_units(60_000, 0), 255);
        assert_eq!(duration_units(u32::MAX, 0), 255);
    }
}
