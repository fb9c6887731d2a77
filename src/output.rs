//! Output sink trait for the Vesper runtime
//!
//! This module defines the Sink trait that allows an embedding host to supply
//! its own output destination: a terminal, a file, an in-memory buffer, a
//! socket, or nothing at all.
//!
//! Every text-emitting operation in the runtime goes through a sink via a
//! [`StreamHandle`](crate::stream::StreamHandle); no interpreter code writes
//! to the platform's standard streams directly. Replacing the sink therefore
//! redirects *all* runtime output, formatted and single-character output
//! included.

use core::fmt;

/// Error reported by a sink when a write or flush fails.
///
/// Deliberately carries no payload: at this seam a failure is just "the
/// destination did not take the bytes". Translating that into an
/// interpreter-visible error is the caller's job; this layer neither retries
/// nor escalates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkError;

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink write failure")
    }
}

impl std::error::Error for SinkError {}

/// Writable destination for interpreter output.
///
/// The interpreter uses this trait for all output operations like print,
/// emit, and error reporting. Implementations report how many bytes they
/// accepted; a count shorter than the input signals a failure on the
/// underlying destination.
pub trait Sink: Send {
    /// Write bytes to the destination, returning how many were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError>;

    /// Release any buffering on the underlying destination.
    ///
    /// May block until the destination accepts pending data.
    fn flush(&mut self) -> Result<(), SinkError>;
}
