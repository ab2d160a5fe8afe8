use cubewire_frame::codec::button;
use cubewire_frame::{ButtonInfo, ByteFrame};
use cubewire_transport::CharacteristicId;

use super::{Channel, ChannelSpec, Notifying};
use crate::error::Result;
use crate::event::{Event, EventSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct Button;

pub type ButtonChannel = Channel<Button>;

impl ChannelSpec for Button {
    const ID: CharacteristicId = CharacteristicId::Button;
}

impl Notifying for Button {
    type Value = ButtonInfo;

    fn decode(&self, frame: &ByteFrame) -> cubewire_frame::Result<ButtonInfo> {
        button::decode(frame)
    }

    fn dispatch(&self, value: ButtonInfo, sink: &dyn EventSink) {
        sink.publish(Event::ButtonPress(value));
    }
}

impl Channel<Button> {
    pub fn button_status(&self) -> Result<Option<ButtonInfo>> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;

    #[test]
    fn press_and_release_are_published() {
        let h = testing::notifying(Button);
        h.transport.notify(CharacteristicId::Button, &[0x01, 0x80]);
        h.transport.notify(CharacteristicId::Button, &[0x01, 0x00]);
        assert_eq!(
            h.events.drain(),
            vec![
                Event::ButtonPress(ButtonInfo {
                    id: button::FUNCTION_BUTTON,
                    pressed: true
                }),
                Event::ButtonPress(ButtonInfo {
                    id: button::FUNCTION_BUTTON,
                    pressed: false
                }),
            ]
        );
    }

    #[test]
    fn short_read_is_absent() {
        let h = testing::plain(Button);
        h.transport.set_read_value(CharacteristicId::Button, vec![0x01u8]);
        assert_eq!(h.channel.button_status().unwrap(), None);
    }
}
