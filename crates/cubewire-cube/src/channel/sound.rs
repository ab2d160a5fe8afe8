use std::time::Duration;

use cubewire_frame::codec::sound;
use cubewire_frame::{PresetSound, SoundOperation, SoundSequence};
use cubewire_transport::CharacteristicId;

use super::{Channel, ChannelSpec};
use crate::error::Result;

/// Speaker. Write-only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sound;

pub type SoundChannel = Channel<Sound>;

impl ChannelSpec for Sound {
    const ID: CharacteristicId = CharacteristicId::Sound;
}

impl Channel<Sound> {
    /// Play one of the built-in effects (0-10).
    pub fn play_preset(&self, sound_id: i32) -> Result<PresetSound> {
        let encoded = sound::encode_preset(sound_id)?;
        self.issue(&encoded.frame, Duration::ZERO)?;
        Ok(encoded.data)
    }

    /// Play a note sequence; `repeat_count` 0 loops forever.
    pub fn play(&self, operations: &[SoundOperation], repeat_count: i32) -> Result<SoundSequence> {
        let encoded = sound::encode_sequence(operations, repeat_count)?;
        let duration = Duration::from_millis(u64::from(encoded.data.total_duration_ms));
        self.issue(&encoded.frame, duration)?;
        Ok(encoded.data)
    }

    pub fn stop(&self) -> Result<()> {
        self.issue(&sound::encode_stop(), Duration::ZERO)
    }
}
