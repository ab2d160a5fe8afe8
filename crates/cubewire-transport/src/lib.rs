//! Characteristic identities and the transport abstraction for cubewire.
//!
//! This is the lowest layer. Every channel talks to the device through the
//! [`Transport`] trait defined here; discovery and the BLE stack itself live
//! outside this workspace.

pub mod characteristic;
pub mod error;
pub mod memory;
pub mod traits;

pub use characteristic::{CharacteristicId, SERVICE_UUID};
pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use traits::{NotifyHandler, Transport};
