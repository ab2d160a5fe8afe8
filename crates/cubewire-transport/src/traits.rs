use std::sync::Arc;

use bytes::Bytes;

use crate::characteristic::CharacteristicId;
use crate::error::Result;

/// Callback invoked with the raw bytes of every notification.
///
/// Runs on the transport's own context (typically a background I/O thread),
/// so it must not block.
pub type NotifyHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Read/write/subscribe access to one connected cube.
///
/// Implementations wrap a concrete BLE stack. Channels hold the transport as
/// `Arc<dyn Transport>` and never retry: errors are returned unchanged to the
/// immediate caller.
pub trait Transport: Send + Sync {
    /// Stable identifier of the peripheral (address or platform id).
    fn device_id(&self) -> &str;

    /// Establish the connection.
    fn connect(&self) -> Result<()>;

    /// Tear the connection down.
    fn disconnect(&self) -> Result<()>;

    /// Whether the connection is currently up.
    fn is_connected(&self) -> bool;

    /// Characteristics discovered on the cube's service.
    fn characteristics(&self) -> Result<Vec<CharacteristicId>>;

    /// Write a complete packet to a characteristic (fire-and-forget).
    fn write(&self, id: CharacteristicId, bytes: &[u8]) -> Result<()>;

    /// Read the current value of a characteristic.
    ///
    /// Returns `Ok(None)` when the device answers with no bytes.
    fn read(&self, id: CharacteristicId) -> Result<Option<Bytes>>;

    /// Start receiving notifications for a characteristic.
    ///
    /// Subscribing again replaces the previous handler.
    fn subscribe(&self, id: CharacteristicId, handler: NotifyHandler) -> Result<()>;

    /// Stop receiving notifications for a characteristic.
    fn unsubscribe(&self, id: CharacteristicId) -> Result<()>;
}
