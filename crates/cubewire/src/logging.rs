use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

/// Install a stderr formatter. Does nothing if a subscriber is already set.
#[cfg(feature = "logging")]
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_lowercase() {
        let level: LogLevel = serde_json::from_str(r#""debug""#).unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert_eq!(
            level.as_filter(),
            tracing::level_filters::LevelFilter::DEBUG
        );
        assert!(serde_json::from_str::<LogFormat>(r#""yaml""#).is_err());
    }

    #[cfg(feature = "logging")]
    #[test]
    fn init_twice_is_harmless() {
        init_logging(LogFormat::Json, LogLevel::Warn);
        init_logging(LogFormat::Text, LogLevel::Trace);
    }
}
