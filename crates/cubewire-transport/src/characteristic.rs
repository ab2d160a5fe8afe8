//! Characteristic identities of the cube's GATT service.
//!
//! All characteristics share the base UUID `10b201XX-5b3b-4571-9508-cf3efcd7bbae`
//! and differ only in the `XX` byte.

use std::fmt;

use uuid::Uuid;

/// Primary service exposing every characteristic below.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x10b20100_5b3b_4571_9508_cf3efcd7bbae);

const BASE_UUID: u128 = 0x10b20100_5b3b_4571_9508_cf3efcd7bbae;

/// One logical BLE characteristic of the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CharacteristicId {
    /// Position and standard id detection (mat / card reader).
    Id,
    /// Wheel control and move-to responses.
    Motor,
    /// Indicator LED.
    Light,
    /// Speaker.
    Sound,
    /// Motion sensor (slope, collision, double tap, orientation).
    Sensor,
    /// Top button.
    Button,
    /// Battery level.
    Battery,
    /// Device configuration and protocol version.
    Configuration,
}

impl CharacteristicId {
    /// Every characteristic the cube exposes.
    pub const ALL: [CharacteristicId; 8] = [
        CharacteristicId::Id,
        CharacteristicId::Motor,
        CharacteristicId::Light,
        CharacteristicId::Sound,
        CharacteristicId::Sensor,
        CharacteristicId::Button,
        CharacteristicId::Battery,
        CharacteristicId::Configuration,
    ];

    fn suffix(self) -> u8 {
        match self {
            CharacteristicId::Id => 0x01,
            CharacteristicId::Motor => 0x02,
            CharacteristicId::Light => 0x03,
            CharacteristicId::Sound => 0x04,
            CharacteristicId::Sensor => 0x06,
            CharacteristicId::Button => 0x07,
            CharacteristicId::Battery => 0x08,
            CharacteristicId::Configuration => 0xff,
        }
    }

    /// The 128-bit GATT UUID of this characteristic.
    pub fn uuid(self) -> Uuid {
        Uuid::from_u128(BASE_UUID | (u128::from(self.suffix()) << 96))
    }

    /// Resolve a discovered UUID back to a characteristic.
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.uuid() == uuid)
    }

    /// Short lowercase name, also used as the event topic prefix.
    pub fn name(self) -> &'static str {
        match self {
            CharacteristicId::Id => "id",
            CharacteristicId::Motor => "motor",
            CharacteristicId::Light => "light",
            CharacteristicId::Sound => "sound",
            CharacteristicId::Sensor => "sensor",
            CharacteristicId::Button => "button",
            CharacteristicId::Battery => "battery",
            CharacteristicId::Configuration => "configuration",
        }
    }

    /// Returns true if the device pushes notifications on this characteristic.
    pub fn notifies(self) -> bool {
        !matches!(self, CharacteristicId::Light | CharacteristicId::Sound)
    }
}

impl fmt::Display for CharacteristicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_follow_base_layout() {
        assert_eq!(
            CharacteristicId::Battery.uuid().to_string(),
            "10b20108-5b3b-4571-9508-cf3efcd7bbae"
        );
        assert_eq!(
            CharacteristicId::Configuration.uuid().to_string(),
            "10b201ff-5b3b-4571-9508-cf3efcd7bbae"
        );
        assert_eq!(
            SERVICE_UUID.to_string(),
            "10b20100-5b3b-4571-9508-cf3efcd7bbae"
        );
    }

    #[test]
    fn uuid_lookup_roundtrips_every_characteristic() {
        for id in CharacteristicId::ALL {
            assert_eq!(CharacteristicId::from_uuid(id.uuid()), Some(id));
        }
        assert_eq!(CharacteristicId::from_uuid(SERVICE_UUID), None);
    }

    #[test]
    fn light_and_sound_are_write_only() {
        assert!(!CharacteristicId::Light.notifies());
        assert!(!CharacteristicId::Sound.notifies());
        assert!(CharacteristicId::Sensor.notifies());
        assert!(CharacteristicId::Configuration.notifies());
    }
}
