//! Logger metrics for observability
//!
//! Counters for the degrade-gracefully paths of the logging core: messages
//! dropped on buffer exhaustion, truncated messages and sink failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rda_log::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dropped();
/// metrics.record_logged();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.total_logged(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Lines the consumer wrote to the sink
    total_logged: AtomicU64,

    /// Buffers handed to the spew queue
    published: AtomicU64,

    /// Messages lost because no buffer was available or the core was stopped
    dropped_count: AtomicU64,

    /// Times a producer failed to obtain a replacement buffer
    exhaustion_events: AtomicU64,

    /// Messages cut short to fit their buffer
    truncated_count: AtomicU64,

    /// Sink write or flush failures (including panics)
    sink_failures: AtomicU64,
}

impl LoggerMetrics {
    /// All counters start at zero.
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            published: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            exhaustion_events: AtomicU64::new(0),
            truncated_count: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    /// Lines written to the sink.
    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    /// Messages handed to the spew queue.
    #[inline]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Messages lost to pool exhaustion or shutdown.
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Times a producer found the free list empty.
    #[inline]
    pub fn exhaustion_events(&self) -> u64 {
        self.exhaustion_events.load(Ordering::Relaxed)
    }

    /// Messages cut to fit their buffer.
    #[inline]
    pub fn truncated_count(&self) -> u64 {
        self.truncated_count.load(Ordering::Relaxed)
    }

    /// Sink writes or flushes that failed or panicked.
    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    /// Record a line written to the sink. Returns the previous count.
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a message queued for the consumer. Returns the previous count.
    #[inline]
    pub fn record_published(&self) -> u64 {
        self.published.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a dropped message. Returns the previous count.
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an empty free list. Returns the previous count.
    #[inline]
    pub fn record_exhausted(&self) -> u64 {
        self.exhaustion_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a truncated message. Returns the previous count.
    #[inline]
    pub fn record_truncated(&self) -> u64 {
        self.truncated_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a failed sink call. Returns the previous count.
    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been logged or dropped yet.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.total_logged() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.published.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.exhaustion_events.store(0, Ordering::Relaxed);
        self.truncated_count.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            published: AtomicU64::new(self.published()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            exhaustion_events: AtomicU64::new(self.exhaustion_events()),
            truncated_count: AtomicU64::new(self.truncated_count()),
            sink_failures: AtomicU64::new(self.sink_failures()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.total_logged(), 0);
        assert_eq!(metrics.published(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.exhaustion_events(), 0);
        assert_eq!(metrics.truncated_count(), 0);
        assert_eq!(metrics.sink_failures(), 0);
    }

    #[test]
    fn test_metrics_record_dropped() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_dropped(), 0); // Returns previous value
        assert_eq!(metrics.dropped_count(), 1);
        metrics.record_dropped();
        assert_eq!(metrics.dropped_count(), 2);
    }

    #[test]
    fn test_metrics_drop_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_logged();
        }
        for _ in 0..10 {
            metrics.record_dropped();
        }

        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_dropped();
        metrics.record_truncated();
        metrics.record_sink_failure();

        metrics.reset();

        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.truncated_count(), 0);
        assert_eq!(metrics.sink_failures(), 0);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_published();
        metrics.record_logged();

        let snapshot = metrics.clone();
        metrics.record_logged();

        assert_eq!(snapshot.total_logged(), 1);
        assert_eq!(metrics.total_logged(), 2);
        assert_eq!(snapshot.published(), 1);
    }
}
