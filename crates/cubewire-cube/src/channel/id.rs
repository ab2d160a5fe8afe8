use cubewire_frame::codec::id;
use cubewire_frame::{ByteFrame, IdMissed, IdReading};
use cubewire_transport::CharacteristicId;

use super::{Channel, ChannelSpec, Notifying};
use crate::error::Result;
use crate::event::{Event, EventSink};

/// Mat position and card detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdDetection;

pub type IdChannel = Channel<IdDetection>;

impl ChannelSpec for IdDetection {
    const ID: CharacteristicId = CharacteristicId::Id;
}

impl Notifying for IdDetection {
    type Value = IdReading;

    fn decode(&self, frame: &ByteFrame) -> cubewire_frame::Result<IdReading> {
        id::decode(frame)
    }

    fn dispatch(&self, value: IdReading, sink: &dyn EventSink) {
        let event = match value {
            IdReading::Position(position) => Event::PositionId(position),
            IdReading::Standard(standard) => Event::StandardId(standard),
            IdReading::Missed(IdMissed::Position) => Event::PositionIdMissed,
            IdReading::Missed(IdMissed::Standard) => Event::StandardIdMissed,
        };
        sink.publish(event);
    }
}

impl Channel<IdDetection> {
    pub fn id_status(&self) -> Result<Option<IdReading>> {
        self.read()
    }
}
