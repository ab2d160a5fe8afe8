use std::sync::Arc;
use std::time::Duration;

use cubewire_frame::codec::configuration;
use cubewire_frame::{ByteFrame, ProtocolVersion};
use cubewire_transport::CharacteristicId;
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use super::{Channel, ChannelSpec, Notifying};
use crate::error::Result;
use crate::event::{Event, EventSink};
use crate::reply::{PendingReply, Waiters};

/// Where the protocol version negotiation stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionState {
    Unknown,
    AwaitingResponse,
    Known(ProtocolVersion),
}

/// Configuration characteristic: protocol version query and device settings.
pub struct Configuration {
    version: RwLock<Option<ProtocolVersion>>,
    waiters: Arc<Waiters<(), ProtocolVersion>>,
}

pub type ConfigurationChannel = Channel<Configuration>;

impl Configuration {
    pub fn new() -> Self {
        Self {
            version: RwLock::new(None),
            waiters: Arc::new(Waiters::new()),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("version", &*self.version.read())
            .finish_non_exhaustive()
    }
}

impl ChannelSpec for Configuration {
    const ID: CharacteristicId = CharacteristicId::Configuration;
}

impl Notifying for Configuration {
    type Value = Option<ProtocolVersion>;

    fn decode(&self, frame: &ByteFrame) -> cubewire_frame::Result<Option<ProtocolVersion>> {
        configuration::decode_version_response(frame)
    }

    fn dispatch(&self, value: Option<ProtocolVersion>, sink: &dyn EventSink) {
        let Some(version) = value else {
            trace!("configuration response without a version");
            return;
        };
        *self.version.write() = Some(version.clone());
        let woken = self.waiters.resolve(&(), version.clone());
        debug!(%version, woken, "protocol version received");
        sink.publish(Event::BleProtocolVersion(version));
    }
}

impl Channel<Configuration> {
    /// Record a version learned elsewhere.
    pub fn init(&self, version: ProtocolVersion) {
        *self.profile().version.write() = Some(version);
    }

    pub fn cached_version(&self) -> Option<ProtocolVersion> {
        self.profile().version.read().clone()
    }

    pub fn version_state(&self) -> VersionState {
        if let Some(version) = self.cached_version() {
            return VersionState::Known(version);
        }
        if self.profile().waiters.is_waiting(&()) {
            VersionState::AwaitingResponse
        } else {
            VersionState::Unknown
        }
    }

    /// Send a version request and return a handle for the reply.
    pub fn begin_version_query(&self) -> Result<PendingReply<ProtocolVersion>> {
        let reply = self.profile().waiters.register(());
        self.write(&configuration::encode_version_request())?;
        Ok(reply)
    }

    /// The protocol version, querying the cube if it is not yet known.
    pub fn ble_protocol_version(&self, timeout: Duration) -> Result<ProtocolVersion> {
        if let Some(version) = self.cached_version() {
            return Ok(version);
        }
        let version = self.begin_version_query()?.wait(timeout)?;
        info!(%version, "negotiated protocol version");
        Ok(version)
    }

    #[cfg(feature = "async")]
    pub async fn ble_protocol_version_async(&self, timeout: Duration) -> Result<ProtocolVersion> {
        if let Some(version) = self.cached_version() {
            return Ok(version);
        }
        let reply = self.profile().waiters.register_async(());
        self.write(&configuration::encode_version_request())?;
        let version = reply.wait(timeout).await?;
        info!(%version, "negotiated protocol version");
        Ok(version)
    }

    /// Collision sensitivity; the value is passed through unchanged.
    pub fn set_collision_threshold(&self, threshold: u8) -> Result<()> {
        self.write(&configuration::encode_set_collision_threshold(threshold))
    }

    /// Abort an outstanding version query.
    pub fn cancel_pending(&self) -> usize {
        self.profile().waiters.cancel_all()
    }
}
