use cubewire_frame::codec::battery;
use cubewire_frame::{BatteryInfo, ByteFrame};
use cubewire_transport::CharacteristicId;

use super::{Channel, ChannelSpec, Notifying};
use crate::error::Result;
use crate::event::{Event, EventSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct Battery;

pub type BatteryChannel = Channel<Battery>;

impl ChannelSpec for Battery {
    const ID: CharacteristicId = CharacteristicId::Battery;
}

impl Notifying for Battery {
    type Value = BatteryInfo;

    fn decode(&self, frame: &ByteFrame) -> cubewire_frame::Result<BatteryInfo> {
        battery::decode(frame)
    }

    fn dispatch(&self, value: BatteryInfo, sink: &dyn EventSink) {
        sink.publish(Event::Battery(value));
    }
}

impl Channel<Battery> {
    /// Current charge, or `None` if the cube returned nothing usable.
    pub fn battery_status(&self) -> Result<Option<BatteryInfo>> {
        self.read()
    }
}
