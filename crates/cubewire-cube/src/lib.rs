//! Command and notification orchestration for a connected cube.
//!
//! Each characteristic gets a [`Channel`] that:
//! - Encodes commands and writes them through the [`Transport`](cubewire_transport::Transport)
//! - Keeps one [`CommandTimer`] so a new command supersedes a timed one
//! - Decodes notifications and publishes typed [`Event`]s
//!
//! Commands answered asynchronously by the cube (move-to completion, the
//! protocol version) return a [`PendingReply`] that must be waited on with a
//! deadline. [`Cube`] ties the channels of one device together.

pub mod channel;
pub mod config;
pub mod cube;
pub mod error;
pub mod event;
pub mod reply;
pub mod timer;

pub use channel::battery::{Battery, BatteryChannel};
pub use channel::button::{Button, ButtonChannel};
pub use channel::configuration::{Configuration, ConfigurationChannel, VersionState};
pub use channel::id::{IdChannel, IdDetection};
pub use channel::light::{Light, LightChannel};
pub use channel::motor::{Motor, MotorChannel, PendingMove};
pub use channel::sensor::{Sensor, SensorChannel};
pub use channel::sound::{Sound, SoundChannel};
pub use channel::{Channel, ChannelSpec, Notifying};
pub use config::CubeConfig;
pub use cube::Cube;
pub use error::{CubeError, Result};
pub use event::{Event, EventBus, EventSink, Subscription, SubscriptionId, Topic};
#[cfg(feature = "async")]
pub use reply::AsyncPendingReply;
pub use reply::{PendingReply, ReplyCanceller};
pub use timer::{CommandTimer, TimerState};
