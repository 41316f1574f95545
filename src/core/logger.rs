//! The logging core: level gate, buffer pool, spew queue, consumer thread
//! and lifecycle behind one shareable handle.

use super::{
    buffer_pool::{BufferPool, PoolSnapshot},
    config::LoggerConfig,
    consumer::{self, ConsumerState, ConsumerStatus},
    error::Result,
    lifecycle::{Lifecycle, LifecycleState},
    log_level::{LevelGate, LogLevel},
    metrics::LoggerMetrics,
    sink::Sink,
    spew_queue::SpewQueue,
    stream::{self, CallSite},
    timestamp::TimestampFormat,
};
use crate::sinks::StderrSink;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_CORE_ID: AtomicU64 = AtomicU64::new(1);

/// Everything producers and the consumer thread share.
pub(crate) struct CoreShared {
    /// Keys this core's per-thread streams; never reused.
    pub(crate) id: u64,
    pub(crate) config: LoggerConfig,
    pub(crate) gate: LevelGate,
    pub(crate) pool: BufferPool,
    pub(crate) queue: SpewQueue,
    pub(crate) metrics: LoggerMetrics,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) consumer_state: ConsumerStatus,
    /// Handed to the consumer thread on start.
    sink: Mutex<Option<Box<dyn Sink>>>,
}

/// Asynchronous logging core.
///
/// Cloning is cheap and every clone refers to the same pool, queue and
/// consumer thread. The consumer starts lazily on the first message that
/// passes the level gate, or explicitly via [`ensure_started`].
///
/// Call [`shutdown`] to flush and stop the consumer. Dropping the last
/// clone does the same, so an abandoned core never leaves its thread
/// behind.
///
/// # Example
///
/// ```
/// use rda_log::prelude::*;
/// use rda_log::info;
///
/// let sink = MemorySink::new();
/// let core = LoggingCore::builder()
///     .buffer_count(8)
///     .sink(sink.clone())
///     .build();
///
/// info!(core, "listening on port {}", 8080);
/// core.shutdown();
///
/// assert_eq!(sink.len(), 1);
/// assert!(sink.lines()[0].ends_with("listening on port 8080\n"));
/// ```
///
/// [`ensure_started`]: LoggingCore::ensure_started
/// [`shutdown`]: LoggingCore::shutdown
#[derive(Clone)]
pub struct LoggingCore {
    handle: Arc<CoreHandle>,
}

/// Owned by the user-facing clones only; the consumer thread holds
/// `CoreShared` directly, so this drops exactly when the last clone does.
struct CoreHandle {
    shared: Arc<CoreShared>,
}

impl Drop for CoreHandle {
    fn drop(&mut self) {
        self.shared.lifecycle.shutdown(&self.shared.queue);
    }
}

impl LoggingCore {
    /// Create a core with `config`, writing to `sink`.
    pub fn new(config: LoggerConfig, sink: impl Sink + 'static) -> Result<Self> {
        Self::from_parts(config, Box::new(sink))
    }

    fn from_parts(config: LoggerConfig, sink: Box<dyn Sink>) -> Result<Self> {
        config.validate()?;
        let pool = BufferPool::new(config.buffer_size, config.buffer_count);
        let queue = SpewQueue::attached_to(&pool);
        let shared = Arc::new(CoreShared {
            id: NEXT_CORE_ID.fetch_add(1, Ordering::Relaxed),
            gate: LevelGate::new(config.level),
            config,
            pool,
            queue,
            metrics: LoggerMetrics::new(),
            lifecycle: Lifecycle::new(),
            consumer_state: ConsumerStatus::new(),
            sink: Mutex::new(Some(sink)),
        });
        Ok(Self {
            handle: Arc::new(CoreHandle { shared }),
        })
    }

    /// Start a builder with the default configuration.
    #[must_use]
    pub fn builder() -> LoggingCoreBuilder {
        LoggingCoreBuilder::new()
    }

    /// Populate the pool and launch the consumer thread, exactly once.
    ///
    /// Cheap after the first call. Fails with
    /// [`LoggerStopped`](crate::LoggerError::LoggerStopped) once the core has
    /// been shut down.
    pub fn ensure_started(&self) -> Result<()> {
        let shared = &self.handle.shared;
        shared.lifecycle.start_once(|| {
            shared.pool.ensure_populated();
            let sink = shared
                .sink
                .lock()
                .take()
                .unwrap_or_else(|| Box::new(StderrSink::new()));
            consumer::spawn(Arc::clone(shared), sink)
        })
    }

    /// Whether a message at `level` would pass the gate.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.handle.shared.gate.allows(level)
    }

    /// Emit one log line.
    ///
    /// Below the gate this returns after a single atomic load. Otherwise the
    /// line is formatted into the calling thread's buffer and queued for the
    /// consumer; if no buffer is available the message is dropped and
    /// counted. This never waits for a buffer.
    pub fn write(&self, level: LogLevel, site: &CallSite, args: fmt::Arguments<'_>) {
        if !self.handle.shared.gate.allows(level) {
            return;
        }
        if self.ensure_started().is_err() {
            stream::record_drop(&self.handle.shared);
            return;
        }
        stream::emit(&self.handle.shared, level, site, args);
    }

    /// Change the threshold for every thread, effective immediately.
    pub fn set_level(&self, level: LogLevel) {
        self.handle.shared.gate.set(level);
    }

    /// Current threshold.
    pub fn level(&self) -> LogLevel {
        self.handle.shared.gate.get()
    }

    /// Stop the consumer after it has written everything already queued.
    ///
    /// Idempotent and callable from any thread, including concurrently.
    /// Blocks until the consumer has terminated. Messages published after
    /// this point are dropped; a line another thread is formatting at the
    /// same moment may be lost.
    pub fn shutdown(&self) {
        self.handle.shared.lifecycle.shutdown(&self.handle.shared.queue);
    }

    /// RAII handle that calls [`shutdown`](LoggingCore::shutdown) on drop.
    #[must_use = "the core is shut down as soon as the guard is dropped"]
    pub fn shutdown_guard(&self) -> ShutdownGuard {
        ShutdownGuard { core: self.clone() }
    }

    /// Lifecycle state of the core.
    pub fn state(&self) -> LifecycleState {
        self.handle.shared.lifecycle.state()
    }

    /// What the consumer thread is doing right now.
    pub fn consumer_state(&self) -> ConsumerState {
        self.handle.shared.consumer_state.get()
    }

    /// True between the first message and shutdown.
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Return the calling thread's buffer to the pool.
    ///
    /// Happens automatically at thread exit; useful for long-lived threads
    /// that are done logging.
    pub fn detach_current_thread(&self) {
        stream::detach(self.handle.shared.id);
    }

    /// Free-list and queue contents, for tests and debugging.
    pub fn snapshot(&self) -> PoolSnapshot {
        self.handle.shared.pool.ensure_populated();
        self.handle.shared.pool.snapshot()
    }

    /// Print `label` followed by the pool snapshot to stderr.
    pub fn debug_dump(&self, label: &str) {
        eprintln!("{}\n{}", label, self.snapshot());
    }

    /// Counters shared by producers and the consumer.
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.handle.shared.metrics
    }

    /// Validated configuration the core was built with.
    pub fn config(&self) -> &LoggerConfig {
        &self.handle.shared.config
    }

    /// The core's buffer pool.
    pub fn pool(&self) -> &BufferPool {
        &self.handle.shared.pool
    }
}

impl fmt::Debug for LoggingCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingCore")
            .field("id", &self.handle.shared.id)
            .field("level", &self.level())
            .field("state", &self.state())
            .field("pool", &self.handle.shared.pool)
            .finish()
    }
}

/// Shuts the core down when dropped.
///
/// ```
/// use rda_log::prelude::*;
///
/// let core = LoggingCore::builder().sink(MemorySink::new()).build();
/// {
///     let _guard = core.shutdown_guard();
///     rda_log::warn!(core, "work in progress");
/// }
/// assert_eq!(core.state(), LifecycleState::Terminated);
/// ```
pub struct ShutdownGuard {
    core: LoggingCore,
}

impl ShutdownGuard {
    /// The guarded core.
    pub fn core(&self) -> &LoggingCore {
        &self.core
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.core.shutdown();
    }
}

/// Builder for constructing a [`LoggingCore`] with a fluent API
///
/// # Example
/// ```
/// use rda_log::prelude::*;
/// use std::time::Duration;
///
/// let core = LoggingCore::builder()
///     .buffer_size(256)
///     .buffer_count(16)
///     .min_level(LogLevel::Verbose)
///     .max_batch(8)
///     .wake_interval(Duration::from_millis(50))
///     .sink(StderrSink::new())
///     .build();
/// assert_eq!(core.pool().capacity(), 16);
/// ```
pub struct LoggingCoreBuilder {
    config: LoggerConfig,
    sink: Option<Box<dyn Sink>>,
}

impl LoggingCoreBuilder {
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            sink: None,
        }
    }

    /// Replace the whole configuration
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.config.buffer_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn buffer_count(mut self, count: usize) -> Self {
        self.config.buffer_count = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn max_batch(mut self, max: usize) -> Self {
        self.config.max_batch = max;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn wake_interval(mut self, interval: Duration) -> Self {
        self.config.wake_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.config.timestamp_format = format;
        self
    }

    /// Set the destination. Defaults to [`StderrSink`].
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn try_build(self) -> Result<LoggingCore> {
        let sink = self.sink.unwrap_or_else(|| Box::new(StderrSink::new()));
        LoggingCore::from_parts(self.config, sink)
    }

    /// Build the core.
    ///
    /// # Panics
    ///
    /// If the configuration is invalid; use [`try_build`] to handle that.
    ///
    /// [`try_build`]: LoggingCoreBuilder::try_build
    pub fn build(self) -> LoggingCore {
        match self.try_build() {
            Ok(core) => core,
            Err(e) => panic!("invalid logging core configuration: {}", e),
        }
    }
}

impl Default for LoggingCoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
