use crate::characteristic::CharacteristicId;

/// Errors surfaced by a transport implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device is not connected.
    #[error("device not connected")]
    NotConnected,

    /// The device does not expose the requested characteristic.
    #[error("characteristic {0} not available on device")]
    UnknownCharacteristic(CharacteristicId),

    /// Writing to a characteristic failed.
    #[error("write to {id} failed: {reason}")]
    WriteFailed { id: CharacteristicId, reason: String },

    /// Reading a characteristic failed.
    #[error("read from {id} failed: {reason}")]
    ReadFailed { id: CharacteristicId, reason: String },

    /// An I/O error occurred in the underlying stack.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
