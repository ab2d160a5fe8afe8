//! Typed notification events and the per-device event bus.
//!
//! Channels never call user code directly. They publish [`Event`]s into an
//! [`EventSink`]; the default sink is an [`EventBus`] that fans each event out
//! to every [`Subscription`] registered for its [`Topic`]. Publishing is
//! non-blocking, so it is safe from the transport's notification context.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use cubewire_frame::{
    BatteryInfo, ButtonInfo, MotorResponse, PositionId, ProtocolVersion, StandardIdInfo,
};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

/// Event names, one per kind of device notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Topic {
    #[serde(rename = "battery:battery")]
    Battery,
    #[serde(rename = "button:press")]
    ButtonPress,
    #[serde(rename = "id:position-id")]
    PositionId,
    #[serde(rename = "id:standard-id")]
    StandardId,
    #[serde(rename = "id:position-id-missed")]
    PositionIdMissed,
    #[serde(rename = "id:standard-id-missed")]
    StandardIdMissed,
    #[serde(rename = "sensor:slope")]
    SensorSlope,
    #[serde(rename = "sensor:collision")]
    SensorCollision,
    #[serde(rename = "sensor:double-tap")]
    SensorDoubleTap,
    #[serde(rename = "sensor:orientation")]
    SensorOrientation,
    #[serde(rename = "motor:response")]
    MotorResponse,
    #[serde(rename = "configuration:ble-protocol-version")]
    BleProtocolVersion,
}

impl Topic {
    pub const ALL: [Topic; 12] = [
        Topic::Battery,
        Topic::ButtonPress,
        Topic::PositionId,
        Topic::StandardId,
        Topic::PositionIdMissed,
        Topic::StandardIdMissed,
        Topic::SensorSlope,
        Topic::SensorCollision,
        Topic::SensorDoubleTap,
        Topic::SensorOrientation,
        Topic::MotorResponse,
        Topic::BleProtocolVersion,
    ];

    /// Wire-style name, e.g. `sensor:collision`.
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Battery => "battery:battery",
            Topic::ButtonPress => "button:press",
            Topic::PositionId => "id:position-id",
            Topic::StandardId => "id:standard-id",
            Topic::PositionIdMissed => "id:position-id-missed",
            Topic::StandardIdMissed => "id:standard-id-missed",
            Topic::SensorSlope => "sensor:slope",
            Topic::SensorCollision => "sensor:collision",
            Topic::SensorDoubleTap => "sensor:double-tap",
            Topic::SensorOrientation => "sensor:orientation",
            Topic::MotorResponse => "motor:response",
            Topic::BleProtocolVersion => "configuration:ble-protocol-version",
        }
    }

    /// Inverse of [`Topic::as_str`].
    pub fn from_name(name: &str) -> Option<Topic> {
        Topic::ALL.into_iter().find(|topic| topic.as_str() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded notification, tagged with its topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "topic", content = "payload")]
pub enum Event {
    #[serde(rename = "battery:battery")]
    Battery(BatteryInfo),
    #[serde(rename = "button:press")]
    ButtonPress(ButtonInfo),
    #[serde(rename = "id:position-id")]
    PositionId(PositionId),
    #[serde(rename = "id:standard-id")]
    StandardId(StandardIdInfo),
    #[serde(rename = "id:position-id-missed")]
    PositionIdMissed,
    #[serde(rename = "id:standard-id-missed")]
    StandardIdMissed,
    #[serde(rename = "sensor:slope")]
    SensorSlope { is_sloped: bool },
    #[serde(rename = "sensor:collision")]
    SensorCollision { is_collision_detected: bool },
    #[serde(rename = "sensor:double-tap")]
    SensorDoubleTap { is_double_tapped: bool },
    #[serde(rename = "sensor:orientation")]
    SensorOrientation { orientation: u8 },
    #[serde(rename = "motor:response")]
    MotorResponse(MotorResponse),
    #[serde(rename = "configuration:ble-protocol-version")]
    BleProtocolVersion(ProtocolVersion),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Battery(_) => Topic::Battery,
            Event::ButtonPress(_) => Topic::ButtonPress,
            Event::PositionId(_) => Topic::PositionId,
            Event::StandardId(_) => Topic::StandardId,
            Event::PositionIdMissed => Topic::PositionIdMissed,
            Event::StandardIdMissed => Topic::StandardIdMissed,
            Event::SensorSlope { .. } => Topic::SensorSlope,
            Event::SensorCollision { .. } => Topic::SensorCollision,
            Event::SensorDoubleTap { .. } => Topic::SensorDoubleTap,
            Event::SensorOrientation { .. } => Topic::SensorOrientation,
            Event::MotorResponse(_) => Topic::MotorResponse,
            Event::BleProtocolVersion(_) => Topic::BleProtocolVersion,
        }
    }
}

/// Destination for events published by channels.
///
/// Implementations must not block: `publish` runs on the transport's
/// notification context.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: Event);
}

/// Identifies one subscription on an [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    /// `None` receives every topic.
    topics: Option<HashSet<Topic>>,
    tx: mpsc::Sender<Event>,
}

impl Subscriber {
    fn wants(&self, topic: Topic) -> bool {
        self.topics
            .as_ref()
            .map_or(true, |topics| topics.contains(&topic))
    }
}

/// Per-device fan-out of events to subscribers.
///
/// Subscribers whose receiving half has been dropped are pruned on the next
/// publish.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive events for the given topics; an empty slice means all of them.
    pub fn subscribe(&self, topics: &[Topic]) -> Subscription {
        if topics.is_empty() {
            return self.register(None);
        }
        self.register(Some(topics.iter().copied().collect()))
    }

    /// Receive every event.
    pub fn subscribe_all(&self) -> Subscription {
        self.register(None)
    }

    fn register(&self, topics: Option<HashSet<Topic>>) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(Subscriber { id, topics, tx });
        Subscription { id, rx }
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: Event) {
        let topic = event.topic();
        let mut delivered = 0usize;
        self.subscribers.lock().retain(|subscriber| {
            if !subscriber.wants(topic) {
                return true;
            }
            let alive = subscriber.tx.send(event.clone()).is_ok();
            delivered += usize::from(alive);
            alive
        });
        trace!(%topic, delivered, "event published");
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Receiving end of an [`EventBus`] subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event, or `None` if nothing arrives within `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Every event already queued, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_round_trip() {
        for topic in Topic::ALL {
            assert_eq!(Topic::from_name(topic.as_str()), Some(topic));
        }
        assert_eq!(Topic::from_name("sensor:shake"), None);
        assert_eq!(Topic::SensorDoubleTap.to_string(), "sensor:double-tap");
    }

    #[test]
    fn events_serialize_with_topic_tag() {
        let json = serde_json::to_value(Event::SensorCollision {
            is_collision_detected: true,
        })
        .unwrap();
        assert_eq!(json["topic"], "sensor:collision");
        assert_eq!(json["payload"]["is_collision_detected"], true);

        let json = serde_json::to_value(Event::BleProtocolVersion(ProtocolVersion::new("2.1.0")))
            .unwrap();
        assert_eq!(json["topic"], Topic::BleProtocolVersion.as_str());
        assert_eq!(json["payload"], "2.1.0");
    }

    #[test]
    fn subscribers_only_see_their_topics() {
        let bus = EventBus::new();
        let battery = bus.subscribe(&[Topic::Battery]);
        let everything = bus.subscribe(&[]);

        bus.publish(Event::Battery(BatteryInfo { level: 70 }));
        bus.publish(Event::PositionIdMissed);

        assert_eq!(battery.drain(), vec![Event::Battery(BatteryInfo { level: 70 })]);
        assert_eq!(everything.drain().len(), 2);
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe(&[Topic::ButtonPress]);
        drop(bus.subscribe(&[Topic::ButtonPress]));
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(Event::ButtonPress(ButtonInfo {
            id: 1,
            pressed: true,
        }));
        assert_eq!(bus.subscriber_count(), 1);
        assert!(kept.try_recv().is_some());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let subscription = bus.subscribe(&[Topic::StandardIdMissed]);
        assert!(bus.unsubscribe(subscription.id()));
        assert!(!bus.unsubscribe(subscription.id()));

        bus.publish(Event::StandardIdMissed);
        assert!(subscription.try_recv().is_none());
    }
}
