//! Per-thread log streams
//!
//! Each producer thread keeps one [`ThreadLocalLogStream`] per logging core
//! it writes to. The stream owns at most one buffer; a message is formatted
//! straight into it, terminated, published to the spew queue, and replaced
//! with a fresh buffer from the pool. When the pool is exhausted the stream
//! simply holds nothing and messages are dropped until a buffer comes back.

use super::buffer::Buffer;
use super::log_level::LogLevel;
use super::logger::CoreShared;
use super::timestamp::TimestampFormat;
use chrono::Utc;
use std::cell::RefCell;
use std::fmt::{self, Write};
use std::sync::{Arc, Weak};

/// Where a message was logged from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub module: &'static str,
    pub function: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(module: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            module,
            function,
            line,
        }
    }
}

thread_local! {
    static STREAMS: RefCell<Vec<ThreadLocalLogStream>> = const { RefCell::new(Vec::new()) };
}

pub(crate) struct ThreadLocalLogStream {
    core_id: u64,
    core: Weak<CoreShared>,
    active: Option<Buffer>,
}

impl ThreadLocalLogStream {
    fn register(shared: &Arc<CoreShared>) -> Self {
        let active = shared.pool.acquire();
        if active.is_none() {
            shared.metrics.record_exhausted();
        }
        Self {
            core_id: shared.id,
            core: Arc::downgrade(shared),
            active,
        }
    }

    /// Format one complete message and hand it off. Returns `false` when the
    /// message was dropped.
    fn write(
        &mut self,
        shared: &CoreShared,
        level: LogLevel,
        site: &CallSite,
        args: fmt::Arguments<'_>,
    ) -> bool {
        if self.active.is_none() {
            self.active = shared.pool.acquire();
        }
        let Some(mut buffer) = self.active.take() else {
            return false;
        };

        let truncated = {
            let mut out = buffer.writer();
            // BufferWriter never fails; a failing Display impl just ends the line early.
            let _ = write_header(&mut out, &shared.config.timestamp_format, level, site);
            let _ = out.write_fmt(args);
            out.truncated()
        };
        if truncated {
            shared.metrics.record_truncated();
        }

        buffer.terminate_line();
        self.end_message(shared, buffer)
    }

    fn end_message(&mut self, shared: &CoreShared, buffer: Buffer) -> bool {
        let published = shared.queue.publish(buffer);
        if published {
            shared.metrics.record_published();
        }

        self.active = shared.pool.acquire();
        if self.active.is_none() {
            shared.metrics.record_exhausted();
        }
        published
    }
}

impl Drop for ThreadLocalLogStream {
    fn drop(&mut self) {
        if let Some(buffer) = self.active.take() {
            if let Some(shared) = self.core.upgrade() {
                shared.pool.release(buffer);
            }
        }
    }
}

/// `"<timestamp> <Level> [<module>><function>><line>] "`
///
/// A timestamp that fails to format falls back to the default format, so
/// the level and call site are always present.
pub(crate) fn write_header<W: Write>(
    out: &mut W,
    timestamps: &TimestampFormat,
    level: LogLevel,
    site: &CallSite,
) -> fmt::Result {
    let now = Utc::now();
    if timestamps.write_to(out, &now).is_err() {
        TimestampFormat::default().write_to(out, &now)?;
    }
    write!(
        out,
        " {} [{}>{}>{}] ",
        level, site.module, site.function, site.line
    )
}

/// Write one message through the calling thread's stream for `shared`.
///
/// Messages are dropped, never waited on, when the pool is exhausted, when
/// this thread is already inside a write (a payload that logs while being
/// formatted), or when thread-local storage is being torn down.
pub(crate) fn emit(
    shared: &Arc<CoreShared>,
    level: LogLevel,
    site: &CallSite,
    args: fmt::Arguments<'_>,
) {
    let written = STREAMS
        .try_with(|streams| {
            let Ok(mut streams) = streams.try_borrow_mut() else {
                return false;
            };
            let idx = match streams.iter().position(|s| s.core_id == shared.id) {
                Some(idx) => idx,
                None => {
                    // Streams of cores that no longer exist are dead weight.
                    streams.retain(|s| s.core.strong_count() > 0);
                    streams.push(ThreadLocalLogStream::register(shared));
                    streams.len() - 1
                }
            };
            streams[idx].write(shared, level, site, args)
        })
        .unwrap_or(false);

    if !written {
        record_drop(shared);
    }
}

/// Count a dropped message; report the first and every 1000th on stderr.
pub(crate) fn record_drop(shared: &CoreShared) {
    let dropped = shared.metrics.record_dropped();
    if dropped != 0 && (dropped + 1) % 1000 != 0 {
        return;
    }
    if shared.queue.is_shutdown_requested() {
        eprintln!(
            "[LOGGER WARNING] Logging core is shut down, {} messages dropped.",
            dropped + 1
        );
    } else {
        eprintln!(
            "[LOGGER WARNING] No log buffer available, {} messages dropped. \
             Consider increasing buffer_count.",
            dropped + 1
        );
    }
}

/// Drop the calling thread's stream for `core_id`, returning its buffer.
pub(crate) fn detach(core_id: u64) {
    let _ = STREAMS.try_with(|streams| {
        if let Ok(mut streams) = streams.try_borrow_mut() {
            streams.retain(|s| s.core_id != core_id);
        }
    });
}
