use std::time::Duration;

use cubewire_transport::CharacteristicId;

/// Errors that can occur while driving a cube.
#[derive(Debug, thiserror::Error)]
pub enum CubeError {
    /// Encoding rejected an argument, or a read could not be decoded.
    #[error("frame error: {0}")]
    Frame(#[from] cubewire_frame::FrameError),

    /// Transport-level error, passed through unchanged.
    #[error("transport error: {0}")]
    Transport(#[from] cubewire_transport::TransportError),

    /// No reply arrived before the deadline.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The wait was cancelled before a reply arrived.
    #[error("wait cancelled")]
    Cancelled,

    /// The cube ended a move-to request with a failure reason.
    #[error("move-to operation {operation_id} failed with reason {reason:#04x}")]
    MoveToFailed { operation_id: u8, reason: u8 },

    /// The characteristic returned no bytes.
    #[error("no data available on {0}")]
    NoData(CharacteristicId),

    /// The connected cube does not expose this characteristic.
    #[error("cube has no {0} characteristic")]
    MissingCharacteristic(CharacteristicId),

    /// The command timer task could not be started.
    #[error("failed to start command timer: {0}")]
    Timer(std::io::Error),
}

pub type Result<T> = std::result::Result<T, CubeError>;
