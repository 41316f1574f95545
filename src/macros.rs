//! Logging macros for ergonomic log message formatting.
//!
//! Every macro takes the core as its first argument, then a format string
//! and arguments as with `println!`. The level is checked before anything is
//! formatted, so a filtered call costs one atomic load.
//!
//! # Examples
//!
//! ```
//! use rda_log::prelude::*;
//! use rda_log::{error, info, verbose};
//!
//! let sink = MemorySink::new();
//! let core = LoggingCore::builder().sink(sink.clone()).build();
//!
//! info!(core, "Server started");
//! error!(core, "Request {} failed: {}", 17, "timeout");
//! verbose!(core, "filtered at the default Info threshold");
//!
//! core.shutdown();
//! assert_eq!(sink.len(), 2);
//! ```
//!
//! The process-wide core works the same way:
//!
//! ```no_run
//! rda_log::warn!(rda_log::global(), "disk {}% full", 91);
//! ```

/// Name of the enclosing function, without its module path.
///
/// Closures report the function they are defined in.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(__f);
        let name = name.strip_suffix("::__f").unwrap_or(name);
        let name = name.trim_end_matches("::{{closure}}");
        match name.rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }};
}

/// [`CallSite`](crate::CallSite) for the place this macro is expanded.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(module_path!(), $crate::function_name!(), line!())
    };
}

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rda_log::prelude::*;
/// # let core = LoggingCore::builder().sink(MemorySink::new()).build();
/// use rda_log::log;
/// log!(core, LogLevel::Info, "Simple message");
/// log!(core, LogLevel::Error, "Error code: {}", 500);
/// # core.shutdown();
/// ```
#[macro_export]
macro_rules! log {
    ($core:expr, $level:expr, $($arg:tt)+) => {{
        let core = &$core;
        let level = $level;
        if core.enabled(level) {
            core.write(level, &$crate::call_site!(), format_args!($($arg)+));
        }
    }};
}

/// Log a message that passes every threshold.
#[macro_export]
macro_rules! always {
    ($core:expr, $($arg:tt)+) => {
        $crate::log!($core, $crate::LogLevel::Always, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rda_log::prelude::*;
/// # let core = LoggingCore::builder().sink(MemorySink::new()).build();
/// use rda_log::error;
/// error!(core, "Failed to connect to database");
/// error!(core, "Error code: {}, message: {}", 500, "Internal error");
/// # core.shutdown();
/// ```
#[macro_export]
macro_rules! error {
    ($core:expr, $($arg:tt)+) => {
        $crate::log!($core, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($core:expr, $($arg:tt)+) => {
        $crate::log!($core, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($core:expr, $($arg:tt)+) => {
        $crate::log!($core, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a verbose-level message.
///
/// Filtered out unless the threshold has been raised to `Verbose`.
#[macro_export]
macro_rules! verbose {
    ($core:expr, $($arg:tt)+) => {
        $crate::log!($core, $crate::LogLevel::Verbose, $($arg)+)
    };
}

/// Debug-build-only message, logged at `Always`.
///
/// Compiles to nothing observable in release builds; the arguments are not
/// evaluated there.
#[macro_export]
macro_rules! debug {
    ($core:expr, $($arg:tt)+) => {{
        if cfg!(debug_assertions) {
            $crate::log!($core, $crate::LogLevel::Always, $($arg)+);
        }
    }};
}
