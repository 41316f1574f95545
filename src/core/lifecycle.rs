//! One-time startup and idempotent shutdown of the consumer thread
//!
//! State only ever moves forward:
//! `NotStarted -> Running -> ShuttingDown -> Terminated`, or straight from
//! `NotStarted` to `Terminated` when a core is shut down before its first
//! message. Transitions happen under the control lock; reads are lock-free.
//!
//! Shutdown has no timeout. A sink that never returns keeps the consumer
//! from reaching `Terminated`, and every `shutdown` caller waits with it.

use super::error::{LoggerError, Result};
use super::spew_queue::SpewQueue;
use parking_lot::{Condvar, Mutex, Once};
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle, ThreadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecycleState {
    NotStarted = 0,
    Running = 1,
    ShuttingDown = 2,
    Terminated = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::NotStarted,
            1 => LifecycleState::Running,
            2 => LifecycleState::ShuttingDown,
            _ => LifecycleState::Terminated,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::NotStarted => "NotStarted",
            LifecycleState::Running => "Running",
            LifecycleState::ShuttingDown => "ShuttingDown",
            LifecycleState::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
struct Control {
    handle: Option<JoinHandle<()>>,
    consumer: Option<ThreadId>,
    start_error: Option<String>,
}

pub(crate) struct Lifecycle {
    state: AtomicU8,
    start: Once,
    control: Mutex<Control>,
    finished: Condvar,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::NotStarted as u8),
            start: Once::new(),
            control: Mutex::new(Control::default()),
            finished: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Run `spawn` at most once, unless the core was shut down first.
    ///
    /// Returns `Ok` while the consumer is running.
    pub(crate) fn start_once<F>(&self, spawn: F) -> Result<()>
    where
        F: FnOnce() -> io::Result<JoinHandle<()>>,
    {
        self.start.call_once(|| {
            let mut control = self.control.lock();
            if self.state() != LifecycleState::NotStarted {
                return;
            }
            match spawn() {
                Ok(handle) => {
                    control.consumer = Some(handle.thread().id());
                    control.handle = Some(handle);
                    self.set_state(LifecycleState::Running);
                }
                Err(e) => {
                    eprintln!("[LOGGER ERROR] Failed to start log consumer thread: {}", e);
                    control.start_error = Some(e.to_string());
                    self.set_state(LifecycleState::Terminated);
                }
            }
        });

        match self.state() {
            LifecycleState::Running => Ok(()),
            _ => match self.control.lock().start_error.clone() {
                Some(e) => Err(LoggerError::other(format!(
                    "log consumer thread failed to start: {}",
                    e
                ))),
                None => Err(LoggerError::LoggerStopped),
            },
        }
    }

    /// Request shutdown and wait for the consumer to finish its final drain.
    ///
    /// Safe to call any number of times from any thread. Called from the
    /// consumer thread itself it only raises the flag, since waiting there
    /// would wait on itself.
    pub(crate) fn shutdown(&self, queue: &SpewQueue) {
        let handle = {
            let mut control = self.control.lock();
            match self.state() {
                LifecycleState::Terminated => return,
                LifecycleState::NotStarted => {
                    self.set_state(LifecycleState::Terminated);
                    drop(control);
                    queue.request_shutdown();
                    return;
                }
                LifecycleState::Running => self.set_state(LifecycleState::ShuttingDown),
                LifecycleState::ShuttingDown => {}
            }

            queue.request_shutdown();
            if control.consumer == Some(thread::current().id()) {
                return;
            }
            while self.state() != LifecycleState::Terminated {
                self.finished.wait(&mut control);
            }
            control.handle.take()
        };

        // Only the first waiter gets the handle; the rest have nothing to join.
        if let Some(handle) = handle {
            if let Err(e) = handle.join() {
                eprintln!(
                    "[LOGGER ERROR] Log consumer thread panicked during shutdown: {:?}",
                    e
                );
            }
        }
    }

    pub(crate) fn mark_terminated(&self) {
        let _control = self.control.lock();
        self.set_state(LifecycleState::Terminated);
        self.finished.notify_all();
    }
}
