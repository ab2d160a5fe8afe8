use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Controls how a [`Cube`](crate::Cube) session behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    /// How long to wait for the protocol version reply.
    pub version_query_timeout_ms: u64,
    /// How long `Cube::move_to` waits for the cube to report completion.
    pub move_to_timeout_ms: u64,
    /// Query the protocol version as part of `connect`.
    pub query_version_on_connect: bool,
    /// Collision threshold applied right after connecting.
    pub collision_threshold: Option<u8>,
}

impl CubeConfig {
    pub fn version_query_timeout(&self) -> Duration {
        Duration::from_millis(self.version_query_timeout_ms)
    }

    pub fn move_to_timeout(&self) -> Duration {
        Duration::from_millis(self.move_to_timeout_ms)
    }
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            version_query_timeout_ms: 3_000,
            move_to_timeout_ms: 10_000,
            query_version_on_connect: true,
            collision_threshold: None,
        }
    }
}
