//! Background consumer thread
//!
//! Waits on the spew queue, writes each detached buffer to the sink outside
//! the pool lock, and returns the buffers to the pool. At most `max_batch`
//! buffers are written per wake so a flood of messages cannot hold off the
//! shutdown check; anything left over is picked up on the next cycle.

use super::buffer::Buffer;
use super::lifecycle::Lifecycle;
use super::logger::CoreShared;
use super::sink::Sink;
use std::any::Any;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const CONSUMER_THREAD_NAME: &str = "rda-log-consumer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConsumerState {
    Idle = 0,
    Draining = 1,
    Terminating = 2,
    Terminated = 3,
}

/// Lock-free mirror of the consumer's state for introspection.
#[derive(Debug)]
pub(crate) struct ConsumerStatus(AtomicU8);

impl ConsumerStatus {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(ConsumerState::Idle as u8))
    }

    pub(crate) fn get(&self) -> ConsumerState {
        match self.0.load(Ordering::Acquire) {
            0 => ConsumerState::Idle,
            1 => ConsumerState::Draining,
            2 => ConsumerState::Terminating,
            _ => ConsumerState::Terminated,
        }
    }

    fn set(&self, state: ConsumerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

pub(crate) fn spawn(shared: Arc<CoreShared>, sink: Box<dyn Sink>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(CONSUMER_THREAD_NAME.to_string())
        .spawn(move || LogConsumer { shared, sink }.run())
}

/// Marks the lifecycle `Terminated` however the consumer exits, so shutdown
/// callers are released even if the loop itself panics.
struct TerminationGuard<'a>(&'a Lifecycle);

impl Drop for TerminationGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_terminated();
    }
}

struct LogConsumer {
    shared: Arc<CoreShared>,
    sink: Box<dyn Sink>,
}

impl LogConsumer {
    fn run(self) {
        let shared = Arc::clone(&self.shared);
        let _guard = TerminationGuard(&shared.lifecycle);
        // The sink is dropped at the end of `drive`, before the guard fires.
        self.drive();
    }

    fn drive(mut self) {
        let shared = Arc::clone(&self.shared);
        let max_batch = shared.config.max_batch;
        let interval = shared.config.wake_interval();

        loop {
            shared.consumer_state.set(ConsumerState::Idle);
            let wake = shared.queue.wait_for_work(max_batch, interval);
            if !wake.batch.is_empty() {
                shared.consumer_state.set(ConsumerState::Draining);
                self.write_batch(wake.batch);
            }
            if wake.shutdown {
                break;
            }
        }

        // Shutdown was requested: nothing new can be queued, so drain what is left.
        shared.consumer_state.set(ConsumerState::Terminating);
        loop {
            let batch = shared.queue.drain_up_to(max_batch);
            if batch.is_empty() {
                break;
            }
            self.write_batch(batch);
        }
        self.flush_sink();
        shared.consumer_state.set(ConsumerState::Terminated);
    }

    /// Write every buffer, flush once, then recycle the whole batch.
    fn write_batch(&mut self, batch: Vec<Buffer>) {
        for buffer in &batch {
            let sink = &mut self.sink;
            match catch_unwind(AssertUnwindSafe(|| sink.write_line(buffer.as_bytes()))) {
                Ok(Ok(())) => {
                    self.shared.metrics.record_logged();
                }
                Ok(Err(e)) => {
                    self.report_failure(format_args!(
                        "[LOGGER ERROR] Sink '{}' failed: {}",
                        self.sink.name(),
                        e
                    ));
                }
                Err(panic_info) => {
                    self.report_failure(format_args!(
                        "[LOGGER CRITICAL] Sink '{}' panicked: {}. Line dropped.",
                        self.sink.name(),
                        panic_message(&*panic_info)
                    ));
                }
            }
        }

        self.flush_sink();
        self.shared.pool.release_all(batch);
    }

    fn flush_sink(&mut self) {
        let sink = &mut self.sink;
        match catch_unwind(AssertUnwindSafe(|| sink.flush())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.report_failure(format_args!(
                    "[LOGGER ERROR] Sink '{}' flush failed: {}",
                    self.sink.name(),
                    e
                ));
            }
            Err(panic_info) => {
                self.report_failure(format_args!(
                    "[LOGGER CRITICAL] Sink '{}' panicked during flush: {}",
                    self.sink.name(),
                    panic_message(&*panic_info)
                ));
            }
        }
    }

    /// Count every failure; report the first and every 1000th on stderr.
    fn report_failure(&self, message: std::fmt::Arguments<'_>) {
        let failures = self.shared.metrics.record_sink_failure();
        if failures == 0 || (failures + 1) % 1000 == 0 {
            eprintln!("{} ({} sink failures so far)", message, failures + 1);
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
