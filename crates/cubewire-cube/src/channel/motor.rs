use std::sync::Arc;
use std::time::Duration;

use cubewire_frame::codec::motor;
use cubewire_frame::{
    ByteFrame, MotorResponse, MoveData, MoveToData, MoveToOptions, MoveToTarget,
    OperationIdAllocator, ProtocolVersion,
};
use cubewire_transport::CharacteristicId;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{Channel, ChannelSpec, Notifying};
use crate::error::{CubeError, Result};
use crate::event::{Event, EventSink};
use crate::reply::{PendingReply, ReplyCanceller, Waiters};

/// Wheel motors, including move-to requests correlated by operation id.
pub struct Motor {
    tags: OperationIdAllocator,
    waiters: Arc<Waiters<u8, MotorResponse>>,
    protocol: RwLock<Option<ProtocolVersion>>,
}

pub type MotorChannel = Channel<Motor>;

impl Motor {
    pub fn new() -> Self {
        Self {
            tags: OperationIdAllocator::new(),
            waiters: Arc::new(Waiters::new()),
            protocol: RwLock::new(None),
        }
    }

    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.protocol.read().clone()
    }
}

impl Default for Motor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Motor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Motor")
            .field("last_operation_id", &self.tags.current())
            .field("protocol", &*self.protocol.read())
            .finish_non_exhaustive()
    }
}

impl ChannelSpec for Motor {
    const ID: CharacteristicId = CharacteristicId::Motor;
}

impl Notifying for Motor {
    type Value = MotorResponse;

    fn decode(&self, frame: &ByteFrame) -> cubewire_frame::Result<MotorResponse> {
        motor::decode_response(frame)
    }

    fn dispatch(&self, value: MotorResponse, sink: &dyn EventSink) {
        let woken = self.waiters.resolve(&value.operation_id, value);
        debug!(
            operation_id = value.operation_id,
            reason = value.reason,
            woken,
            "motor response"
        );
        sink.publish(Event::MotorResponse(value));
    }
}

/// An accepted move-to request awaiting its completion response.
#[derive(Debug)]
pub struct PendingMove {
    data: MoveToData,
    reply: PendingReply<MotorResponse>,
}

impl PendingMove {
    pub fn operation_id(&self) -> u8 {
        self.data.operation_id()
    }

    /// The normalized request as written.
    pub fn data(&self) -> &MoveToData {
        &self.data
    }

    pub fn canceller(&self) -> ReplyCanceller<MotorResponse> {
        self.reply.canceller()
    }

    /// Wait for the cube to finish the move. Reasons other than success or
    /// "overwritten" fail with [`CubeError::MoveToFailed`].
    pub fn wait(self, timeout: Duration) -> Result<MotorResponse> {
        completed(self.reply.wait(timeout)?)
    }
}

fn completed(response: MotorResponse) -> Result<MotorResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(CubeError::MoveToFailed {
            operation_id: response.operation_id,
            reason: response.reason,
        })
    }
}

impl Channel<Motor> {
    /// Record the negotiated protocol version.
    pub fn init(&self, version: ProtocolVersion) {
        if !version.supports_move_to() {
            warn!(%version, "firmware predates protocol 2.1.0; move-to is unavailable");
        }
        *self.profile().protocol.write() = Some(version);
    }

    /// Drive both wheels; positive is forward. `duration_ms` 0 runs until the
    /// next command.
    pub fn move_wheels(&self, left: i32, right: i32, duration_ms: u32) -> Result<MoveData> {
        let encoded = motor::encode_move(left, right, duration_ms)?;
        let duration = Duration::from_millis(u64::from(encoded.data.duration_ms));
        self.issue(&encoded.frame, duration)?;
        Ok(encoded.data)
    }

    pub fn stop(&self) -> Result<MoveData> {
        self.move_wheels(0, 0, 0)
    }

    /// Write a move-to request and return a handle for its completion.
    ///
    /// The waiter is registered before the write, so a response that arrives
    /// during the write is not lost.
    pub fn begin_move_to(
        &self,
        targets: &[MoveToTarget],
        options: MoveToOptions,
    ) -> Result<PendingMove> {
        self.check_protocol();
        let encoded = motor::encode_move_to(&self.profile().tags, targets, options)?;
        let reply = self
            .profile()
            .waiters
            .register(encoded.data.operation_id());
        self.issue(&encoded.frame, Duration::ZERO)?;
        Ok(PendingMove {
            data: encoded.data,
            reply,
        })
    }

    /// Move to the given targets and block until the cube reports completion.
    pub fn move_to(
        &self,
        targets: &[MoveToTarget],
        options: MoveToOptions,
        timeout: Duration,
    ) -> Result<MotorResponse> {
        self.begin_move_to(targets, options)?.wait(timeout)
    }

    #[cfg(feature = "async")]
    pub async fn move_to_async(
        &self,
        targets: &[MoveToTarget],
        options: MoveToOptions,
        timeout: Duration,
    ) -> Result<MotorResponse> {
        self.check_protocol();
        let encoded = motor::encode_move_to(&self.profile().tags, targets, options)?;
        let reply = self
            .profile()
            .waiters
            .register_async(encoded.data.operation_id());
        self.issue(&encoded.frame, Duration::ZERO)?;
        completed(reply.wait(timeout).await?)
    }

    /// Abort every outstanding move-to wait with [`CubeError::Cancelled`].
    pub fn cancel_pending(&self) -> usize {
        self.profile().waiters.cancel_all()
    }

    fn check_protocol(&self) {
        match self.profile().protocol_version() {
            Some(version) if version.supports_move_to() => {}
            Some(version) => {
                warn!(%version, "move-to requires protocol 2.1.0 or later");
            }
            None => warn!("move-to issued before the protocol version is known"),
        }
    }
}
