use std::str::FromStr;

use eyre::eyre;
use serde::Deserialize;
use serde::Serialize;
use tracing::level_filters::LevelFilter;

use crate::config::LoggingConfig;
use crate::error::EngineResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

impl FromStr for LogLevel {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "off" => Ok(Self::Off),
            other => Err(eyre!("Unknown log level {other:?}")),
        }
    }
}

/// Resolves the effective level; `RUST_LOG` wins over the config file when it
/// names a plain level.
pub fn effective_level(config: &LoggingConfig, rust_log: Option<&str>) -> LogLevel {
    rust_log
        .and_then(|value| value.parse().ok())
        .unwrap_or(config.level)
}

pub fn init_logging(config: &LoggingConfig) -> EngineResult<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = effective_level(config, rust_log.as_deref());
    tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_max_level(LevelFilter::from(level))
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names() {
        assert_eq!("TRACE".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!(" warning ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn rust_log_overrides_config() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
        };
        assert_eq!(effective_level(&config, None), LogLevel::Warn);
        assert_eq!(effective_level(&config, Some("debug")), LogLevel::Debug);
        // Directive syntax is not a plain level, so the config wins.
        assert_eq!(
            effective_level(&config, Some("d3d12_engine=trace")),
            LogLevel::Warn
        );
    }

    #[test]
    fn maps_to_level_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::OFF);
        assert_eq!(LevelFilter::from(LogLevel::Info), LevelFilter::INFO);
    }
}
