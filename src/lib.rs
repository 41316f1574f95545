//! # rda_log
//!
//! An asynchronous, thread-safe logging core built around a fixed pool of
//! preallocated buffers.
//!
//! ## How it works
//!
//! - **Level gate**: one atomic threshold. A filtered call costs a single
//!   load and never touches the pool.
//! - **Per-thread streams**: each producer thread formats straight into a
//!   buffer it owns, so concurrent messages never interleave.
//! - **Spew queue**: completed lines are queued in order and a background
//!   consumer thread writes them to a [`Sink`] outside any lock.
//! - **Bounded memory**: buffers are allocated once and recycled. When all
//!   of them are busy, messages are dropped and counted rather than blocking
//!   the caller.
//!
//! ## Example
//!
//! ```
//! use rda_log::prelude::*;
//! use rda_log::{error, info, verbose};
//!
//! let sink = MemorySink::new();
//! let core = LoggingCore::builder()
//!     .min_level(LogLevel::Warn)
//!     .buffer_count(8)
//!     .sink(sink.clone())
//!     .build();
//!
//! error!(core, "disk {} unavailable", "/dev/sdb");
//! info!(core, "not shown at Warn");
//!
//! core.set_level(LogLevel::Verbose);
//! verbose!(core, "now shown");
//!
//! core.shutdown();
//! assert_eq!(sink.len(), 2);
//! ```

pub mod core;
pub mod global;
pub mod macros;
pub mod sinks;

pub use global::{global, set_level, shutdown};

pub mod prelude {
    pub use crate::core::{
        CallSite, ConsumerState, LevelGate, LifecycleState, LogLevel, LoggerConfig, LoggerError,
        LoggerMetrics, LoggingCore, LoggingCoreBuilder, PoolSnapshot, Result, ShutdownGuard, Sink,
        TimestampFormat,
    };
    pub use crate::sinks::{ChannelSink, MemorySink, StderrSink};
}

pub use crate::core::{
    Buffer, BufferId, BufferPool, CallSite, ConsumerState, LevelGate, LifecycleState, LogLevel,
    LoggerConfig, LoggerError, LoggerMetrics, LoggingCore, LoggingCoreBuilder, PoolSnapshot,
    Result, ShutdownGuard, Sink, SpewQueue, TimestampFormat,
};
pub use sinks::{ChannelSink, MemorySink, StderrSink};
