//! Core logging types: buffers, the pool and queue they cycle through, the
//! consumer thread and the [`LoggingCore`] that ties them together.

pub mod buffer;
pub mod buffer_pool;
pub mod config;
pub mod consumer;
pub mod error;
pub mod lifecycle;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod sink;
pub mod spew_queue;
pub(crate) mod stream;
pub mod timestamp;

pub use buffer::{Buffer, BufferId};
pub use buffer_pool::{BufferPool, PoolSnapshot};
pub use config::LoggerConfig;
pub use consumer::{ConsumerState, CONSUMER_THREAD_NAME};
pub use error::{LoggerError, Result};
pub use lifecycle::LifecycleState;
pub use log_level::{LevelGate, LogLevel};
pub use logger::{LoggingCore, LoggingCoreBuilder, ShutdownGuard};
pub use metrics::LoggerMetrics;
pub use sink::Sink;
pub use spew_queue::SpewQueue;
pub use stream::CallSite;
pub use timestamp::TimestampFormat;
