//! Process-wide logging core
//!
//! Most programs want one core shared by every module. [`global`] creates it
//! on first use from the environment (see [`LoggerConfig::from_env`]) and
//! writes to stderr; call [`init`] first to choose the configuration and
//! sink yourself. The global core lives until [`shutdown`] is called or the
//! process exits. Nothing stops it automatically, so call [`shutdown`]
//! before exit to flush pending lines.

use crate::core::{LogLevel, LoggerConfig, LoggerError, LoggingCore, Result, Sink};
use crate::sinks::StderrSink;
use std::sync::OnceLock;

static GLOBAL: OnceLock<LoggingCore> = OnceLock::new();

/// The process-wide core, created on first call.
///
/// An invalid environment configuration is reported on stderr and the
/// defaults are used instead.
pub fn global() -> &'static LoggingCore {
    GLOBAL.get_or_init(|| {
        let config = LoggerConfig::from_env().unwrap_or_else(|e| {
            eprintln!(
                "[LOGGER WARNING] Ignoring logging environment: {}. Using defaults.",
                e
            );
            LoggerConfig::default()
        });
        LoggingCore::new(config, StderrSink::new())
            .unwrap_or_else(|_| LoggingCore::builder().build())
    })
}

/// Install the process-wide core with an explicit configuration and sink.
///
/// Fails if the configuration is invalid or a global core already exists,
/// whether from an earlier `init` or from a call to [`global`].
pub fn init(config: LoggerConfig, sink: impl Sink + 'static) -> Result<&'static LoggingCore> {
    let core = LoggingCore::new(config, sink)?;
    GLOBAL
        .set(core)
        .map_err(|_| LoggerError::config("global", "global logging core already initialized"))?;
    Ok(global())
}

/// Whether [`global`] or [`init`] has created the process-wide core.
pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

/// Change the process-wide threshold.
pub fn set_level(level: LogLevel) {
    global().set_level(level);
}

/// Flush and stop the process-wide core. Does nothing if it was never created.
pub fn shutdown() {
    if let Some(core) = GLOBAL.get() {
        core.shutdown();
    }
}
