//! Binary protocol codecs and command orchestration for BLE toy-robot cubes.
//!
//! # Crate Structure
//!
//! - [`transport`]: characteristic identities, the `Transport` trait, and an
//!   in-memory simulated cube
//! - [`frame`]: byte frames and the per-characteristic packet codecs
//! - [`cube`]: channels, command timers, reply rendezvous, events, and the
//!   `Cube` session
//!
//! [`Settings`] loads a cube configuration plus logging preferences from
//! JSON. With the `logging` feature, [`init_logging`] installs a
//! `tracing-subscriber` formatter.

/// Re-export transport types.
pub mod transport {
    pub use cubewire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cubewire_frame::*;
}

/// Re-export orchestration types.
pub mod cube {
    pub use cubewire_cube::*;
}

pub mod logging;
pub mod settings;

#[cfg(feature = "logging")]
pub use logging::init_logging;
pub use logging::{LogFormat, LogLevel};
pub use settings::{LogSettings, Settings, SettingsError};
