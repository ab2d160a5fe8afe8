use cubewire_frame::codec::sensor;
use cubewire_frame::{ByteFrame, SensorState};
use cubewire_transport::CharacteristicId;
use parking_lot::Mutex;

use super::{Channel, ChannelSpec, Notifying};
use crate::error::Result;
use crate::event::{Event, EventSink};

/// Motion sensor with edge-triggered events.
///
/// Slope and orientation events fire only when the value differs from the
/// previous sample; collision and double-tap fire on every sample that
/// reports them. The first sample always reports slope and orientation.
#[derive(Debug, Default)]
pub struct Sensor {
    previous: Mutex<Option<SensorState>>,
}

pub type SensorChannel = Channel<Sensor>;

impl Sensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last sample seen through notifications.
    pub fn last_state(&self) -> Option<SensorState> {
        *self.previous.lock()
    }

    fn changes(&self, state: SensorState) -> Vec<Event> {
        let previous = self.previous.lock().replace(state);
        let mut events = Vec::with_capacity(4);
        if previous.map(|p| p.is_sloped) != Some(state.is_sloped) {
            events.push(Event::SensorSlope {
                is_sloped: state.is_sloped,
            });
        }
        if state.is_collision_detected {
            events.push(Event::SensorCollision {
                is_collision_detected: true,
            });
        }
        if state.is_double_tapped {
            events.push(Event::SensorDoubleTap {
                is_double_tapped: true,
            });
        }
        if previous.map(|p| p.orientation) != Some(state.orientation) {
            events.push(Event::SensorOrientation {
                orientation: state.orientation,
            });
        }
        events
    }
}

impl ChannelSpec for Sensor {
    const ID: CharacteristicId = CharacteristicId::Sensor;
}

impl Notifying for Sensor {
    type Value = SensorState;

    const REQUIRE_DATA: bool = true;

    fn decode(&self, frame: &ByteFrame) -> cubewire_frame::Result<SensorState> {
        sensor::decode(frame)
    }

    fn dispatch(&self, value: SensorState, sink: &dyn EventSink) {
        for event in self.changes(value) {
            sink.publish(event);
        }
    }
}

impl Channel<Sensor> {
    /// Read the current sample. Fails with `NoData` when the cube returns
    /// nothing; an undecodable sample reads as `None`.
    pub fn sensor_state(&self) -> Result<Option<SensorState>> {
        self.read()
    }

    pub fn slope_status(&self) -> Result<Option<bool>> {
        Ok(self.read()?.map(|state| state.is_sloped))
    }

    pub fn collision_status(&self) -> Result<Option<bool>> {
        Ok(self.read()?.map(|state| state.is_collision_detected))
    }

    pub fn double_tap_status(&self) -> Result<Option<bool>> {
        Ok(self.read()?.map(|state| state.is_double_tapped))
    }

    pub fn orientation(&self) -> Result<Option<u8>> {
        Ok(self.read()?.map(|state| state.orientation))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use crate::error::CubeError;

    #[test]
    fn first_sample_reports_slope_and_orientation() {
        let h = testing::notifying(Sensor::new());
        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x01, 0x00, 0x00, 0x01]);
        assert_eq!(
            h.events.drain(),
            vec![
                Event::SensorSlope { is_sloped: false },
                Event::SensorOrientation { orientation: 1 },
            ]
        );
    }

    #[test]
    fn unchanged_state_only_reports_pulses() {
        let h = testing::notifying(Sensor::new());
        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x01, 0x00, 0x00, 0x01]);
        h.events.drain();

        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x01, 0x01, 0x00, 0x01]);
        assert_eq!(
            h.events.drain(),
            vec![Event::SensorCollision {
                is_collision_detected: true
            }]
        );

        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x01, 0x00, 0x01, 0x01]);
        assert_eq!(
            h.events.drain(),
            vec![Event::SensorDoubleTap {
                is_double_tapped: true
            }]
        );
    }

    #[test]
    fn changes_are_reported_once() {
        let h = testing::notifying(Sensor::new());
        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x01, 0x00, 0x00, 0x01]);
        h.events.drain();

        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x00, 0x00, 0x00, 0x03]);
        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x00, 0x00, 0x00, 0x03]);
        assert_eq!(
            h.events.drain(),
            vec![
                Event::SensorSlope { is_sloped: true },
                Event::SensorOrientation { orientation: 3 },
            ]
        );
        assert_eq!(h.channel.profile().last_state().unwrap().orientation, 3);
    }

    #[test]
    fn malformed_sample_keeps_previous_state() {
        let h = testing::notifying(Sensor::new());
        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x01, 0x00, 0x00, 0x01]);
        h.transport.notify(CharacteristicId::Sensor, &[0x01, 0x00]);
        h.transport.notify(CharacteristicId::Sensor, &[0x02, 0x00, 0x00, 0x00, 0x05]);
        assert_eq!(h.events.drain().len(), 2);
        assert_eq!(h.channel.profile().last_state().unwrap().orientation, 1);
    }

    #[test]
    fn read_without_data_is_an_error() {
        let h = testing::plain(Sensor::new());
        let err = h.channel.slope_status().unwrap_err();
        assert!(matches!(err, CubeError::NoData(CharacteristicId::Sensor)));

        h.transport
            .set_read_value(CharacteristicId::Sensor, vec![0x01u8, 0x00, 0x01, 0x00, 0x06]);
        assert_eq!(h.channel.slope_status().unwrap(), Some(true));
        assert_eq!(h.channel.collision_status().unwrap(), Some(true));
        assert_eq!(h.channel.double_tap_status().unwrap(), Some(false));
        assert_eq!(h.channel.orientation().unwrap(), Some(6));
    }
}
