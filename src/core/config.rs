//! Logging core configuration
//!
//! Defaults are 3 buffers of 200 bytes each. Every field can be overridden from JSON or,
//! for the sizing knobs and the level, from the environment.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BUFFER_SIZE: usize = 200;
pub const DEFAULT_BUFFER_COUNT: usize = 3;
pub const DEFAULT_MAX_BATCH: usize = 20;
pub const DEFAULT_WAKE_INTERVAL_MS: u64 = 100;

pub const ENV_BUFFER_SIZE: &str = "RDA_LOG_BUFSIZ";
pub const ENV_BUFFER_COUNT: &str = "RDA_LOG_NBUFFERS";
pub const ENV_LEVEL: &str = "RDA_LOG_LEVEL";

/// Sizing and behavior of a [`LoggingCore`](crate::LoggingCore).
///
/// # Example
///
/// ```
/// use rda_log::{LoggerConfig, LogLevel};
///
/// let config = LoggerConfig::from_json(r#"{ "buffer_count": 8, "level": "Warn" }"#).unwrap();
/// assert_eq!(config.buffer_count, 8);
/// assert_eq!(config.buffer_size, 200);
/// assert_eq!(config.level, LogLevel::Warn);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Bytes per buffer, including the reserved trailing-newline slot
    pub buffer_size: usize,
    /// Number of preallocated buffers; never grows
    pub buffer_count: usize,
    /// Initial severity threshold
    pub level: LogLevel,
    /// Buffers the consumer writes per wake before re-checking the queue
    pub max_batch: usize,
    /// Periodic consumer wake-up even without a publish signal
    pub wake_interval_ms: u64,
    pub timestamp_format: TimestampFormat,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            buffer_count: DEFAULT_BUFFER_COUNT,
            level: LogLevel::default(),
            max_batch: DEFAULT_MAX_BATCH,
            wake_interval_ms: DEFAULT_WAKE_INTERVAL_MS,
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl LoggerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Usable bytes per buffer: everything but the newline slot.
    #[inline]
    pub fn payload_capacity(&self) -> usize {
        self.buffer_size.saturating_sub(1)
    }

    #[inline]
    pub fn wake_interval(&self) -> Duration {
        Duration::from_millis(self.wake_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size < 2 {
            return Err(LoggerError::config(
                "BufferPool",
                format!("buffer_size must be >= 2, got {}", self.buffer_size),
            ));
        }
        if self.buffer_count == 0 {
            return Err(LoggerError::config("BufferPool", "buffer_count must be > 0"));
        }
        if self.max_batch == 0 {
            return Err(LoggerError::config("LogConsumer", "max_batch must be > 0"));
        }
        if !self.timestamp_format.is_valid() {
            return Err(LoggerError::config(
                "TimestampFormat",
                format!("invalid strftime pattern: {:?}", self.timestamp_format),
            ));
        }
        if self.wake_interval_ms == 0 {
            return Err(LoggerError::config(
                "LogConsumer",
                "wake_interval_ms must be > 0",
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: LoggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                path.display().to_string(),
                e,
            )
        })?;
        Self::from_json(&json)
    }

    /// Defaults overridden by `RDA_LOG_BUFSIZ`, `RDA_LOG_NBUFFERS` and
    /// `RDA_LOG_LEVEL`.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_BUFFER_SIZE) {
            self.buffer_size = parse_env_usize(ENV_BUFFER_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BUFFER_COUNT) {
            self.buffer_count = parse_env_usize(ENV_BUFFER_COUNT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LEVEL) {
            self.level = raw
                .parse()
                .map_err(|e: String| LoggerError::config(ENV_LEVEL, e))?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_env_usize(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| LoggerError::config(key, format!("expected a number, got '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.buffer_size, 200);
        assert_eq!(config.buffer_count, 3);
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.max_batch, 20);
        assert_eq!(config.payload_capacity(), 199);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_custom_timestamp() {
        let config = LoggerConfig {
            timestamp_format: TimestampFormat::Custom("%Q".to_string()),
            ..LoggerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));

        let json = r#"{ "timestamp_format": { "Custom": "%Y %Q" } }"#;
        assert!(LoggerConfig::from_json(json).is_err());
        let json = r#"{ "timestamp_format": { "Custom": "%Y-%m-%d" } }"#;
        assert!(LoggerConfig::from_json(json).is_ok());
    }

    #[test]
    fn test_validate_rejects_degenerate_sizes() {
        let mut config = LoggerConfig::default();
        config.buffer_size = 1;
        assert!(matches!(
            config.validate(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));

        let mut config = LoggerConfig::default();
        config.buffer_count = 0;
        assert!(config.validate().is_err());

        let mut config = LoggerConfig::default();
        config.max_batch = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = LoggerConfig::from_json(
            r#"{ "buffer_size": 64, "timestamp_format": "UnixMillis" }"#,
        )
        .expect("valid json");
        assert_eq!(config.buffer_size, 64);
        assert_eq!(config.buffer_count, DEFAULT_BUFFER_COUNT);
        assert_eq!(config.timestamp_format, TimestampFormat::UnixMillis);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            LoggerConfig::from_json("{ not json"),
            Err(LoggerError::JsonError(_))
        ));
        assert!(matches!(
            LoggerConfig::from_json(r#"{ "buffer_count": 0 }"#),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BUFFER_SIZE, "512"),
            (ENV_BUFFER_COUNT, " 16 "),
            (ENV_LEVEL, "verbose"),
        ]
        .into_iter()
        .collect();

        let config = LoggerConfig::default()
            .with_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .expect("valid overrides");
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.buffer_count, 16);
        assert_eq!(config.level, LogLevel::Verbose);
    }

    #[test]
    fn test_env_override_garbage() {
        let err = LoggerConfig::default()
            .with_env_overrides(|key| (key == ENV_BUFFER_COUNT).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_BUFFER_COUNT));
    }
}
