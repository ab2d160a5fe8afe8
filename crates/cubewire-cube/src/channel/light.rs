use std::time::Duration;

use cubewire_frame::codec::light;
use cubewire_frame::{LightOperation, LightScenario};
use cubewire_transport::CharacteristicId;

use super::{Channel, ChannelSpec};
use crate::error::Result;

/// Indicator LED. Write-only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Light;

pub type LightChannel = Channel<Light>;

impl ChannelSpec for Light {
    const ID: CharacteristicId = CharacteristicId::Light;
}

impl Channel<Light> {
    /// Light one colour, for `operation.duration_ms` or until the next command.
    pub fn turn_on(&self, operation: &LightOperation) -> Result<LightOperation> {
        let encoded = light::encode_turn_on(operation)?;
        let duration = Duration::from_millis(u64::from(encoded.data.duration_ms));
        self.issue(&encoded.frame, duration)?;
        Ok(encoded.data)
    }

    /// Play a colour scenario; `repeat_count` 0 loops forever.
    pub fn turn_on_scenario(
        &self,
        operations: &[LightOperation],
        repeat_count: i32,
    ) -> Result<LightScenario> {
        let encoded = light::encode_scenario(operations, repeat_count)?;
        let duration = Duration::from_millis(u64::from(encoded.data.total_duration_ms));
        self.issue(&encoded.frame, duration)?;
        Ok(encoded.data)
    }

    pub fn turn_off(&self) -> Result<()> {
        self.issue(&light::encode_turn_off(), Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use cubewire_frame::FrameError;

    use super::super::testing;
    use super::*;
    use crate::error::CubeError;
    use crate::timer::TimerState;

    #[test]
    fn turn_on_writes_and_arms_timer() {
        let h = testing::plain(Light);
        let data = h
            .channel
            .turn_on(&LightOperation::new(1_000, 255, 0, 0))
            .unwrap();
        assert_eq!(data.duration_ms, 1_000);
        assert_eq!(
            h.transport.last_write(CharacteristicId::Light).unwrap().as_ref(),
            &[0x03, 100, 0x01, 0x01, 255, 0, 0]
        );
        assert!(matches!(h.channel.timer_state(), TimerState::Armed { .. }));
    }

    #[test]
    fn turn_off_cancels_pending_timer() {
        let h = testing::plain(Light);
        h.channel
            .turn_on(&LightOperation::new(2_000, 0, 255, 0))
            .unwrap();
        h.channel.turn_off().unwrap();
        assert_eq!(h.channel.timer_state(), TimerState::Idle);
        assert_eq!(
            h.transport.last_write(CharacteristicId::Light).unwrap().as_ref(),
            &[0x01]
        );
    }

    #[test]
    fn infinite_light_does_not_arm() {
        let h = testing::plain(Light);
        h.channel.turn_on(&LightOperation::new(0, 1, 2, 3)).unwrap();
        assert_eq!(h.channel.timer_state(), TimerState::Idle);
    }

    #[test]
    fn empty_scenario_writes_nothing() {
        let h = testing::plain(Light);
        let err = h.channel.turn_on_scenario(&[], 1).unwrap_err();
        assert!(matches!(
            err,
            CubeError::Frame(FrameError::InvalidArgument(_))
        ));
        assert!(h.transport.writes(CharacteristicId::Light).is_empty());
    }

    #[test]
    fn scenario_arms_for_total_duration() {
        let h = testing::plain(Light);
        let scenario = h
            .channel
            .turn_on_scenario(&[LightOperation::new(500, 0, 0, 255)], 4)
            .unwrap();
        assert_eq!(scenario.total_duration_ms, 2_000);
        let TimerState::Armed { expires_at } = h.channel.timer_state() else {
            panic!("scenario should arm the timer");
        };
        assert!(expires_at > std::time::Instant::now() + Duration::from_millis(1_500));
    }
}
