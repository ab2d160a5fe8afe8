//! Byte frames and packet codecs for the cube's BLE protocol.
//!
//! Every characteristic speaks a small fixed-format binary packet:
//! - A leading discriminant byte selects the sub-format
//! - Multi-byte fields are little-endian
//! - Single-byte fields are unsigned and clamped, never rejected
//!
//! Codecs are pure functions from domain values to [`ByteFrame`]s and back.
//! The only state lives in [`OperationIdAllocator`].

pub mod codec;
pub mod error;
pub mod frame;
pub mod tag;

pub use codec::battery::BatteryInfo;
pub use codec::button::ButtonInfo;
pub use codec::card::StandardId;
pub use codec::configuration::ProtocolVersion;
pub use codec::id::{IdMissed, IdReading, PositionId, StandardIdInfo};
pub use codec::light::{LightOperation, LightScenario};
pub use codec::motor::{MotorResponse, MoveData, MoveToData, MoveToOptions, MoveToTarget};
pub use codec::sensor::SensorState;
pub use codec::sound::{PresetSound, SoundOperation, SoundSequence};
pub use codec::{clamp, Encoded};
pub use error::{FrameError, Result};
pub use frame::{ByteFrame, TextEncoding};
pub use tag::OperationIdAllocator;
