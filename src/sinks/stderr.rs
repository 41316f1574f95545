//! Standard error sink, the default destination

use crate::core::{LoggerError, Result, Sink};
use std::io::{self, Write};

#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl StderrSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for StderrSink {
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        io::stderr()
            .lock()
            .write_all(line)
            .map_err(|e| LoggerError::io_operation("writing log line", "stderr", e))
    }

    fn flush(&mut self) -> Result<()> {
        io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stderr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_sink_accepts_lines() {
        let mut sink = StderrSink::new();
        assert!(sink.write_line(b"stderr sink test line\n").is_ok());
        assert!(sink.flush().is_ok());
        assert_eq!(sink.name(), "stderr");
    }
}
