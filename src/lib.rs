//! # Vesper Host
//!
//! Host-facing support library for the Vesper interpreter runtime.
//!
//! Two independent seams live here:
//!
//! - **Stream indirection**: every byte the interpreter emits goes through a
//!   [`StreamHandle`] resolved from a process-wide registry, so an embedding
//!   host can redirect, capture, or silence runtime output without touching
//!   interpreter internals or the process's real standard streams.
//! - **Time compatibility**: thread-safe local/UTC calendar conversion with
//!   one contract on every platform, wrapping the non-reentrant libc
//!   primitives where that is all the platform offers.
//!
//! The interpreter itself (lexer, parser, evaluator) lives elsewhere and
//! only calls into these seams.
//!
//! ## Example
//!
//! ```
//! use vesper_host::{resolve_stdout, set_stdout, reset_streams, MemorySink, StreamHandle};
//!
//! // Host captures everything the runtime prints
//! let capture = MemorySink::new();
//! set_stdout(StreamHandle::from_sink(capture.clone()));
//!
//! let out = resolve_stdout();
//! out.write(b"hi\n", 1, 3);
//! out.flush().unwrap();
//! assert_eq!(capture.contents(), b"hi\n");
//!
//! reset_streams();
//! ```

pub mod output;
pub mod sinks;
pub mod stream;
pub mod time_compat;

// Re-exports for convenience
pub use output::{Sink, SinkError};
pub use sinks::{MemorySink, NullSink, StderrSink, StdoutSink};
pub use stream::{
    resolve_stderr, resolve_stdout, reset_streams, set_stderr, set_stdout, StreamHandle,
};
pub use time_compat::{local_calendar, utc_calendar, CalendarTime};
