//! Sink implementations

pub mod channel;
pub mod memory;
pub mod stderr;

pub use channel::ChannelSink;
pub use memory::MemorySink;
pub use stderr::StderrSink;

pub use crate::core::Sink;
