//! Channel-backed sink
//!
//! Forwards each line to a `crossbeam_channel` receiver, which makes it easy
//! to wait for output with a timeout. A zero-capacity channel turns every
//! write into a rendezvous, holding the consumer until the receiver takes
//! the line.

use crate::core::{LoggerError, Result, Sink};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<Vec<u8>>,
}

impl ChannelSink {
    pub fn unbounded() -> (Self, Receiver<Vec<u8>>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<Vec<u8>>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl Sink for ChannelSink {
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.sender
            .send(line.to_vec())
            .map_err(|_| LoggerError::sink("channel", "receiver disconnected"))
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "channel"
    }
}
