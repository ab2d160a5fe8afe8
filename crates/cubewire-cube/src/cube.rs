//! A connected cube: transport, channels, and the device's event bus.

use std::sync::Arc;

use cubewire_frame::{
    BatteryInfo, ButtonInfo, IdReading, LightOperation, LightScenario, MotorResponse, MoveData,
    MoveToOptions, MoveToTarget, PresetSound, ProtocolVersion, SensorState, SoundOperation,
    SoundSequence,
};
use cubewire_transport::{CharacteristicId, Transport};
use tracing::{debug, info, warn};

use crate::channel::battery::Battery;
use crate::channel::button::Button;
use crate::channel::configuration::Configuration;
use crate::channel::id::IdDetection;
use crate::channel::light::Light;
use crate::channel::motor::{Motor, PendingMove};
use crate::channel::sensor::Sensor;
use crate::channel::sound::Sound;
use crate::channel::{Channel, ChannelSpec, Notifying};
use crate::config::CubeConfig;
use crate::error::{CubeError, Result};
use crate::event::{EventBus, EventSink, Subscription, Topic};

#[derive(Default)]
struct Channels {
    id: Option<Arc<Channel<IdDetection>>>,
    motor: Option<Arc<Channel<Motor>>>,
    light: Option<Arc<Channel<Light>>>,
    sound: Option<Arc<Channel<Sound>>>,
    sensor: Option<Arc<Channel<Sensor>>>,
    button: Option<Arc<Channel<Button>>>,
    battery: Option<Arc<Channel<Battery>>>,
    configuration: Option<Arc<Channel<Configuration>>>,
}

impl Channels {
    fn detach_all(&self) {
        fn detach<S: Notifying>(channel: &Option<Arc<Channel<S>>>) {
            if let Some(channel) = channel {
                if let Err(err) = channel.detach() {
                    debug!(channel = %S::ID, error = %err, "detach failed");
                }
            }
        }
        detach(&self.id);
        detach(&self.motor);
        detach(&self.sensor);
        detach(&self.button);
        detach(&self.battery);
        detach(&self.configuration);
    }

    fn cancel_timers(&self) {
        if let Some(motor) = &self.motor {
            motor.cancel_timer();
            motor.cancel_pending();
        }
        if let Some(light) = &self.light {
            light.cancel_timer();
        }
        if let Some(sound) = &self.sound {
            sound.cancel_timer();
        }
        if let Some(configuration) = &self.configuration {
            configuration.cancel_pending();
        }
    }
}

/// One cube session.
///
/// `connect` discovers the characteristics the device exposes and builds a
/// channel for each. Accessors for characteristics the device lacks fail
/// with [`CubeError::MissingCharacteristic`].
pub struct Cube {
    transport: Arc<dyn Transport>,
    bus: Arc<EventBus>,
    config: CubeConfig,
    channels: Channels,
}

impl Cube {
    pub fn new(transport: Arc<dyn Transport>, config: CubeConfig) -> Self {
        Self::with_event_bus(transport, Arc::new(EventBus::new()), config)
    }

    /// Publish this cube's events into an existing bus.
    pub fn with_event_bus(
        transport: Arc<dyn Transport>,
        bus: Arc<EventBus>,
        config: CubeConfig,
    ) -> Self {
        Self {
            transport,
            bus,
            config,
            channels: Channels::default(),
        }
    }

    pub fn device_id(&self) -> &str {
        self.transport.device_id()
    }

    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Connect, discover characteristics, and negotiate the protocol version.
    ///
    /// A version query that times out is logged and the session continues
    /// with the version unknown.
    pub fn connect(&mut self) -> Result<()> {
        self.transport.connect()?;
        let discovered = self.transport.characteristics()?;
        info!(device = %self.device_id(), characteristics = discovered.len(), "cube connected");

        let mut channels = Channels::default();
        for id in discovered {
            match id {
                CharacteristicId::Id => channels.id = Some(self.attach(IdDetection)?),
                CharacteristicId::Motor => channels.motor = Some(self.attach(Motor::new())?),
                CharacteristicId::Light => channels.light = Some(self.build(Light)),
                CharacteristicId::Sound => channels.sound = Some(self.build(Sound)),
                CharacteristicId::Sensor => channels.sensor = Some(self.attach(Sensor::new())?),
                CharacteristicId::Button => channels.button = Some(self.attach(Button)?),
                CharacteristicId::Battery => channels.battery = Some(self.attach(Battery)?),
                CharacteristicId::Configuration => {
                    channels.configuration = Some(self.attach(Configuration::new())?)
                }
            }
        }
        self.channels = channels;

        if self.config.query_version_on_connect {
            self.negotiate_version()?;
        }
        if let Some(threshold) = self.config.collision_threshold {
            self.set_collision_threshold(threshold)?;
        }
        Ok(())
    }

    fn build<S: ChannelSpec>(&self, profile: S) -> Arc<Channel<S>> {
        let sink: Arc<dyn EventSink> = self.bus.clone();
        Arc::new(Channel::new(profile, Arc::clone(&self.transport), sink))
    }

    fn attach<S: Notifying>(&self, profile: S) -> Result<Arc<Channel<S>>> {
        let channel = self.build(profile);
        channel.attach()?;
        Ok(channel)
    }

    fn negotiate_version(&self) -> Result<()> {
        let Some(configuration) = &self.channels.configuration else {
            warn!(device = %self.device_id(), "no configuration characteristic; protocol version unknown");
            return Ok(());
        };
        match configuration.ble_protocol_version(self.config.version_query_timeout()) {
            Ok(version) => {
                if let Some(motor) = &self.channels.motor {
                    motor.init(version);
                }
                Ok(())
            }
            Err(CubeError::Timeout(after)) => {
                warn!(device = %self.device_id(), ?after, "protocol version query timed out");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Detach every channel, stop pending timers and waits, and disconnect.
    pub fn disconnect(&mut self) -> Result<()> {
        let channels = std::mem::take(&mut self.channels);
        channels.detach_all();
        channels.cancel_timers();
        self.transport.disconnect()?;
        info!(device = %self.device_id(), "cube disconnected");
        Ok(())
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn subscribe(&self, topics: &[Topic]) -> Subscription {
        self.bus.subscribe(topics)
    }

    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.channels
            .configuration
            .as_ref()
            .and_then(|configuration| configuration.cached_version())
    }

    pub fn id(&self) -> Result<&Channel<IdDetection>> {
        present(&self.channels.id)
    }

    pub fn motor(&self) -> Result<&Channel<Motor>> {
        present(&self.channels.motor)
    }

    pub fn light(&self) -> Result<&Channel<Light>> {
        present(&self.channels.light)
    }

    pub fn sound(&self) -> Result<&Channel<Sound>> {
        present(&self.channels.sound)
    }

    pub fn sensor(&self) -> Result<&Channel<Sensor>> {
        present(&self.channels.sensor)
    }

    pub fn button(&self) -> Result<&Channel<Button>> {
        present(&self.channels.button)
    }

    pub fn battery(&self) -> Result<&Channel<Battery>> {
        present(&self.channels.battery)
    }

    pub fn configuration(&self) -> Result<&Channel<Configuration>> {
        present(&self.channels.configuration)
    }

    pub fn move_wheels(&self, left: i32, right: i32, duration_ms: u32) -> Result<MoveData> {
        self.motor()?.move_wheels(left, right, duration_ms)
    }

    pub fn stop(&self) -> Result<MoveData> {
        self.motor()?.stop()
    }

    /// Move to `targets`, waiting up to the configured move-to timeout.
    pub fn move_to(&self, targets: &[MoveToTarget], options: MoveToOptions) -> Result<MotorResponse> {
        self.motor()?
            .move_to(targets, options, self.config.move_to_timeout())
    }

    pub fn begin_move_to(&self, targets: &[MoveToTarget], options: MoveToOptions) -> Result<PendingMove> {
        self.motor()?.begin_move_to(targets, options)
    }

    #[cfg(feature = "async")]
    pub async fn move_to_async(
        &self,
        targets: &[MoveToTarget],
        options: MoveToOptions,
    ) -> Result<MotorResponse> {
        self.motor()?
            .move_to_async(targets, options, self.config.move_to_timeout())
            .await
    }

    pub fn turn_on_light(&self, operation: &LightOperation) -> Result<LightOperation> {
        self.light()?.turn_on(operation)
    }

    pub fn turn_on_light_scenario(
        &self,
        operations: &[LightOperation],
        repeat_count: i32,
    ) -> Result<LightScenario> {
        self.light()?.turn_on_scenario(operations, repeat_count)
    }

    pub fn turn_off_light(&self) -> Result<()> {
        self.light()?.turn_off()
    }

    pub fn play_preset_sound(&self, sound_id: i32) -> Result<PresetSound> {
        self.sound()?.play_preset(sound_id)
    }

    pub fn play_sound(&self, operations: &[SoundOperation], repeat_count: i32) -> Result<SoundSequence> {
        self.sound()?.play(operations, repeat_count)
    }

    pub fn stop_sound(&self) -> Result<()> {
        self.sound()?.stop()
    }

    pub fn battery_status(&self) -> Result<Option<BatteryInfo>> {
        self.battery()?.battery_status()
    }

    pub fn button_status(&self) -> Result<Option<ButtonInfo>> {
        self.button()?.button_status()
    }

    pub fn id_status(&self) -> Result<Option<IdReading>> {
        self.id()?.id_status()
    }

    pub fn sensor_state(&self) -> Result<Option<SensorState>> {
        self.sensor()?.sensor_state()
    }

    pub fn set_collision_threshold(&self, threshold: u8) -> Result<()> {
        self.configuration()?.set_collision_threshold(threshold)
    }
}

fn present<S: ChannelSpec>(channel: &Option<Arc<Channel<S>>>) -> Result<&Channel<S>> {
    channel
        .as_deref()
        .ok_or(CubeError::MissingCharacteristic(S::ID))
}

impl std::fmt::Debug for Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cube")
            .field("device_id", &self.device_id())
            .field("connected", &self.is_connected())
            .field("protocol_version", &self.protocol_version())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cubewire_transport::MemoryTransport;

    use super::*;
    use crate::event::Event;

    fn quick() -> CubeConfig {
        CubeConfig {
            version_query_timeout_ms: 50,
            move_to_timeout_ms: 200,
            ..CubeConfig::default()
        }
    }

    fn scripted(transport: &MemoryTransport) {
        transport.set_write_responder(CharacteristicId::Configuration, |request| {
            (request == [0x01, 0x00]).then(|| b"\x81\x002.1.0".to_vec())
        });
    }

    #[test]
    fn connect_negotiates_version() {
        let transport = Arc::new(MemoryTransport::new("cube-1"));
        scripted(&transport);
        let mut cube = Cube::new(transport.clone(), quick());
        cube.connect().unwrap();

        assert!(cube.is_connected());
        assert_eq!(cube.protocol_version().unwrap().as_str(), "2.1.0");
        assert_eq!(
            cube.motor().unwrap().profile().protocol_version(),
            cube.protocol_version()
        );
        for id in [
            CharacteristicId::Id,
            CharacteristicId::Motor,
            CharacteristicId::Sensor,
            CharacteristicId::Button,
            CharacteristicId::Battery,
            CharacteristicId::Configuration,
        ] {
            assert!(transport.is_subscribed(id), "{id} should be subscribed");
        }
        assert!(!transport.is_subscribed(CharacteristicId::Light));
    }

    #[test]
    fn silent_cube_connects_without_version() {
        let transport = Arc::new(MemoryTransport::new("cube-2"));
        let mut cube = Cube::new(transport, quick());
        cube.connect().unwrap();
        assert!(cube.protocol_version().is_none());
        assert!(cube.motor().is_ok());
    }

    #[test]
    fn missing_characteristic_is_reported() {
        let transport = Arc::new(MemoryTransport::with_characteristics(
            "cube-3",
            &[CharacteristicId::Battery, CharacteristicId::Light],
        ));
        let mut cube = Cube::new(transport, quick());
        cube.connect().unwrap();

        assert!(matches!(
            cube.move_wheels(10, 10, 0),
            Err(CubeError::MissingCharacteristic(CharacteristicId::Motor))
        ));
        assert!(cube.turn_on_light(&LightOperation::new(0, 1, 1, 1)).is_ok());
    }

    #[test]
    fn collision_threshold_applied_on_connect() {
        let transport = Arc::new(MemoryTransport::new("cube-4"));
        scripted(&transport);
        let config = CubeConfig {
            collision_threshold: Some(7),
            ..quick()
        };
        let mut cube = Cube::new(transport.clone(), config);
        cube.connect().unwrap();
        assert_eq!(
            transport
                .last_write(CharacteristicId::Configuration)
                .unwrap()
                .as_ref(),
            &[0x06, 0x00, 7]
        );
    }

    #[test]
    fn disconnect_detaches_channels() {
        let transport = Arc::new(MemoryTransport::new("cube-5"));
        let mut cube = Cube::new(transport.clone(), quick());
        cube.connect().unwrap();
        let events = cube.subscribe(&[Topic::Battery]);

        cube.disconnect().unwrap();
        assert!(!cube.is_connected());
        assert!(!transport.notify(CharacteristicId::Battery, &[40]));
        assert!(events.recv_timeout(Duration::from_millis(10)).is_none());
        assert!(matches!(
            cube.battery_status(),
            Err(CubeError::MissingCharacteristic(_))
        ));
    }

    #[test]
    fn events_reach_subscribers() {
        let transport = Arc::new(MemoryTransport::new("cube-6"));
        let mut cube = Cube::new(transport.clone(), quick());
        cube.connect().unwrap();
        let events = cube.subscribe(&[Topic::ButtonPress]);

        transport.notify(CharacteristicId::Button, &[0x01, 0x80]);
        assert_eq!(
            events.recv_timeout(Duration::from_secs(1)),
            Some(Event::ButtonPress(ButtonInfo {
                id: 1,
                pressed: true
            }))
        );
    }
}
