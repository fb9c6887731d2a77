//! Stock sink implementations
//!
//! This module provides the sinks the runtime ships with: wrappers over the
//! process's inherited standard streams, a discarding sink, and a shared
//! in-memory capture buffer that embedding hosts (and tests) can read back.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::output::{Sink, SinkError};

/// Sink over the process's inherited standard output.
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        StdoutSink
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for StdoutSink {
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        io::stdout().write_all(data).map_err(|_| SinkError)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        io::stdout().flush().map_err(|_| SinkError)
    }
}

/// Sink over the process's inherited standard error.
pub struct StderrSink;

impl StderrSink {
    pub fn new() -> Self {
        StderrSink
    }
}

impl Default for StderrSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for StderrSink {
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        io::stderr().write_all(data).map_err(|_| SinkError)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        io::stderr().flush().map_err(|_| SinkError)
    }
}

/// Sink that accepts and discards everything.
///
/// Useful for hosts that want the runtime to run silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        NullSink
    }
}

impl Sink for NullSink {
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that captures output into a shared in-memory buffer.
///
/// Clones share the same buffer, so a host can hand one clone to the stream
/// registry and keep another to read captured output back:
///
/// ```
/// use vesper_host::{MemorySink, StreamHandle};
///
/// let capture = MemorySink::new();
/// let handle = StreamHandle::from_sink(capture.clone());
/// handle.write(b"hi\n", 1, 3);
/// assert_eq!(capture.contents(), b"hi\n");
/// ```
#[derive(Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything captured so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Drain the buffer, returning what was captured.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Sink for MemorySink {
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        self.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink_accepts_everything() {
        let mut sink = NullSink::new();
        assert_eq!(sink.write(b"discarded").unwrap(), 9);
        assert!(sink.flush().is_ok());
    }

    #[test]
    fn test_memory_sink_shared_buffer() {
        let capture = MemorySink::new();
        let mut writer = capture.clone();

        writer.write(b"one ").unwrap();
        writer.write(b"two").unwrap();
        writer.flush().unwrap();

        assert_eq!(capture.contents(), b"one two");
    }

    #[test]
    fn test_memory_sink_take_drains() {
        let capture = MemorySink::new();
        let mut writer = capture.clone();

        writer.write(b"abc").unwrap();
        assert_eq!(capture.take(), b"abc");
        assert!(capture.contents().is_empty());
    }
}
