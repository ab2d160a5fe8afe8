use std::path::{Path, PathBuf};

use cubewire_cube::CubeConfig;
use serde::{Deserialize, Serialize};

use crate::logging::{LogFormat, LogLevel};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Settings text is not valid JSON for [`Settings`].
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    pub level: LogLevel,
}

/// Everything needed to start a session, as one JSON document:
///
/// ```json
/// {
///   "cube": { "move_to_timeout_ms": 5000, "collision_threshold": 7 },
///   "log": { "format": "json", "level": "debug" }
/// }
/// ```
///
/// Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cube: CubeConfig,
    pub log: LogSettings,
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Install the configured log formatter.
    #[cfg(feature = "logging")]
    pub fn init_logging(&self) {
        crate::logging::init_logging(self.log.format, self.log.level);
    }
}
