//! Generic per-characteristic orchestration.
//!
//! A [`Channel`] pairs one characteristic with its codec profile. Every
//! channel can write commands and owns a [`CommandTimer`]; channels whose
//! profile implements [`Notifying`] can also attach to the transport,
//! decode incoming packets, and read the current value on demand.

pub mod battery;
pub mod button;
pub mod configuration;
pub mod id;
pub mod light;
pub mod motor;
pub mod sensor;
pub mod sound;

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use cubewire_frame::ByteFrame;
use cubewire_transport::{CharacteristicId, Transport};
use tracing::{debug, trace, warn};

use crate::error::{CubeError, Result};
use crate::event::EventSink;
use crate::timer::{CommandTimer, TimerState};

/// Binds a profile type to the characteristic it drives.
pub trait ChannelSpec: Send + Sync + 'static {
    const ID: CharacteristicId;
}

/// Profile for a characteristic that produces notifications and reads.
pub trait Notifying: ChannelSpec {
    type Value: Send + fmt::Debug;

    /// When true, a read that yields no bytes fails with
    /// [`CubeError::NoData`] instead of returning `None`.
    const REQUIRE_DATA: bool = false;

    fn decode(&self, frame: &ByteFrame) -> cubewire_frame::Result<Self::Value>;

    /// Turn a decoded notification into events and internal state updates.
    fn dispatch(&self, value: Self::Value, sink: &dyn EventSink);
}

pub struct Channel<S> {
    profile: S,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn EventSink>,
    timer: CommandTimer,
}

impl<S: ChannelSpec> Channel<S> {
    pub fn new(profile: S, transport: Arc<dyn Transport>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            profile,
            transport,
            sink,
            timer: CommandTimer::new(S::ID),
        }
    }

    pub fn id(&self) -> CharacteristicId {
        S::ID
    }

    pub fn profile(&self) -> &S {
        &self.profile
    }

    /// Write a command without touching the timer.
    pub fn write(&self, frame: &ByteFrame) -> Result<()> {
        trace!(channel = %S::ID, bytes = ?frame, "write");
        self.transport.write(S::ID, frame.as_bytes())?;
        Ok(())
    }

    /// Cancel the pending timer, write `frame`, and arm for `duration`.
    pub fn issue(&self, frame: &ByteFrame, duration: Duration) -> Result<()> {
        self.timer.issue(|| {
            self.write(frame)?;
            Ok(duration)
        })
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn cancel_timer(&self) -> bool {
        self.timer.cancel()
    }
}

impl<S: Notifying> Channel<S> {
    /// Subscribe to notifications. The transport only holds a weak reference.
    pub fn attach(self: &Arc<Self>) -> Result<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.transport.subscribe(
            S::ID,
            Arc::new(move |bytes: &[u8]| {
                if let Some(channel) = weak.upgrade() {
                    channel.on_data(bytes);
                }
            }),
        )?;
        debug!(channel = %S::ID, "attached");
        Ok(())
    }

    pub fn detach(&self) -> Result<()> {
        self.transport.unsubscribe(S::ID)?;
        debug!(channel = %S::ID, "detached");
        Ok(())
    }

    /// Handle one notification. Malformed packets are logged and dropped.
    pub fn on_data(&self, bytes: &[u8]) {
        let frame = ByteFrame::from_slice(bytes);
        match self.profile.decode(&frame) {
            Ok(value) => {
                trace!(channel = %S::ID, ?value, "notification");
                self.profile.dispatch(value, self.sink.as_ref());
            }
            Err(err) => {
                warn!(channel = %S::ID, bytes = ?frame, error = %err, "dropping malformed notification");
            }
        }
    }

    /// Read and decode the current value.
    ///
    /// Transport errors are returned. An undecodable value reads as `None`.
    pub fn read(&self) -> Result<Option<S::Value>> {
        let Some(bytes) = self.transport.read(S::ID)? else {
            if S::REQUIRE_DATA {
                return Err(CubeError::NoData(S::ID));
            }
            return Ok(None);
        };
        if bytes.is_empty() && S::REQUIRE_DATA {
            return Err(CubeError::NoData(S::ID));
        }

        match self.profile.decode(&ByteFrame::from_slice(&bytes)) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                debug!(channel = %S::ID, error = %err, "read value did not decode");
                Ok(None)
            }
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Channel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("profile", &self.profile)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use cubewire_transport::{MemoryTransport, Transport};

    use super::{Channel, ChannelSpec, Notifying};
    use crate::event::{EventBus, Subscription};

    pub(crate) struct Harness<S> {
        pub transport: Arc<MemoryTransport>,
        pub channel: Arc<Channel<S>>,
        pub events: Subscription,
    }

    /// Connected memory transport plus an attached channel and an
    /// all-topics subscription.
    pub(crate) fn notifying<S: Notifying>(profile: S) -> Harness<S> {
        let harness = plain(profile);
        harness.channel.attach().unwrap();
        harness
    }

    pub(crate) fn plain<S: ChannelSpec>(profile: S) -> Harness<S> {
        let transport = Arc::new(MemoryTransport::new("cube-test"));
        transport.connect().unwrap();
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe_all();
        let channel = Arc::new(Channel::new(profile, transport.clone(), bus));
        Harness {
            transport,
            channel,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use cubewire_frame::BatteryInfo;

    use super::battery::Battery;
    use super::testing;
    use super::*;
    use crate::event::Event;

    #[test]
    fn notifications_flow_through_decode_and_dispatch() {
        let h = testing::notifying(Battery);
        assert!(h.transport.notify(CharacteristicId::Battery, &[55]));
        assert_eq!(
            h.events.drain(),
            vec![Event::Battery(BatteryInfo { level: 55 })]
        );
    }

    #[test]
    fn malformed_notification_is_dropped() {
        let h = testing::notifying(Battery);
        h.transport.notify(CharacteristicId::Battery, &[]);
        assert!(h.events.drain().is_empty());
    }

    #[test]
    fn detach_stops_notifications() {
        let h = testing::notifying(Battery);
        h.channel.detach().unwrap();
        assert!(!h.transport.notify(CharacteristicId::Battery, &[10]));
    }

    #[test]
    fn dropped_channel_ignores_late_notifications() {
        let h = testing::notifying(Battery);
        let transport = Arc::clone(&h.transport);
        drop(h);
        assert!(transport.notify(CharacteristicId::Battery, &[10]));
    }

    #[test]
    fn issue_failure_surfaces_transport_error() {
        let h = testing::plain(Battery);
        h.transport.fail_writes(true);
        let err = h
            .channel
            .issue(&ByteFrame::from_slice(&[1]), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, CubeError::Transport(_)));
        assert_eq!(h.channel.timer_state(), TimerState::Idle);
    }
}
