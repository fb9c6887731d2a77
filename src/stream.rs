//! Stream handles and the process-wide stream registry
//!
//! A [`StreamHandle`] is the runtime's opaque reference to an output sink.
//! The registry holds the two process-wide handles the interpreter knows
//! about, "standard output" and "standard error", resolved lazily on first
//! use and replaceable by the embedding host.
//!
//! Interleaved writes from multiple threads are not ordered by this layer;
//! a host needing atomic multi-field output must batch it into a single
//! `write` or `write_fmt` call.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::output::{Sink, SinkError};
use crate::sinks::{StderrSink, StdoutSink};

/// Opaque handle to a writable output sink.
///
/// Handles are cheap to clone and valid for the life of the process; clones
/// refer to the same underlying sink. Writes through the same handle from
/// multiple threads are safe, but their interleaving is unspecified.
#[derive(Clone)]
pub struct StreamHandle {
    sink: Arc<Mutex<Box<dyn Sink>>>,
}

impl StreamHandle {
    /// Wrap a host-supplied sink in a handle.
    pub fn from_sink<S: Sink + 'static>(sink: S) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    /// Write `elem_size * elem_count` bytes from `buf`, returning the number
    /// of whole elements written.
    ///
    /// Mirrors the buffered-write contract: a short count signals a failure
    /// on the underlying sink, not an error value. `buf` must hold at least
    /// `elem_size * elem_count` bytes; if it does not (or the product
    /// overflows), nothing is written and the count is 0.
    pub fn write(&self, buf: &[u8], elem_size: usize, elem_count: usize) -> usize {
        if elem_size == 0 || elem_count == 0 {
            return 0;
        }
        let total = match elem_size.checked_mul(elem_count) {
            Some(total) => total,
            None => return 0,
        };
        let data = match buf.get(..total) {
            Some(data) => data,
            None => return 0,
        };
        match self.lock().write(data) {
            Ok(accepted) => accepted / elem_size,
            Err(SinkError) => 0,
        }
    }

    /// Write a whole byte slice, returning how many bytes were accepted.
    pub fn write_all(&self, data: &[u8]) -> usize {
        match self.lock().write(data) {
            Ok(accepted) => accepted,
            Err(SinkError) => 0,
        }
    }

    /// Release any buffering on the underlying sink.
    ///
    /// May block until the sink accepts pending data.
    pub fn flush(&self) -> Result<(), SinkError> {
        self.lock().flush()
    }

    /// Formatted write, returning the number of characters written.
    ///
    /// Renders the arguments first and forwards the rendered bytes through
    /// the same single write path as [`write`](Self::write), so sink
    /// redirection also captures formatted output. The sink is held for the
    /// duration of the forwarded write, making one formatted write atomic
    /// with respect to other calls on the same handle.
    pub fn write_fmt(&self, args: fmt::Arguments<'_>) -> Result<usize, SinkError> {
        let rendered = fmt::format(args);
        let mut sink = self.lock();
        let accepted = sink.write(rendered.as_bytes())?;
        if accepted < rendered.len() {
            return Err(SinkError);
        }
        Ok(rendered.chars().count())
    }

    /// Write a single character.
    ///
    /// Returns the character back on success; `None` is the failure
    /// sentinel, distinguishable from any valid character.
    pub fn put_char(&self, c: char) -> Option<char> {
        let mut buf = [0u8; 4];
        let encoded = c.encode_utf8(&mut buf).as_bytes();
        if self.write_all(encoded) == encoded.len() {
            Some(c)
        } else {
            None
        }
    }

    /// True when both handles refer to the same underlying sink.
    pub fn same_sink(&self, other: &StreamHandle) -> bool {
        Arc::ptr_eq(&self.sink, &other.sink)
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Sink>> {
        // A panic mid-write leaves no invalid state behind, so a poisoned
        // lock is still usable.
        self.sink.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamHandle")
    }
}

/// Formatted write through a stream handle, `fprintf` style.
///
/// ```
/// use vesper_host::{sprint, MemorySink, StreamHandle};
///
/// let capture = MemorySink::new();
/// let out = StreamHandle::from_sink(capture.clone());
/// sprint!(out, "{} + {} = {}", 2, 2, 4).unwrap();
/// assert_eq!(capture.contents(), b"2 + 2 = 4");
/// ```
#[macro_export]
macro_rules! sprint {
    ($dst:expr, $($arg:tt)*) => {
        $dst.write_fmt(core::format_args!($($arg)*))
    };
}

// Process-wide registration slots. Empty until first resolution or until the
// host installs its own handles.
static STDOUT_SLOT: RwLock<Option<StreamHandle>> = RwLock::new(None);
static STDERR_SLOT: RwLock<Option<StreamHandle>> = RwLock::new(None);

/// Handle the runtime currently considers standard output.
///
/// Resolved lazily: before any host configuration this is the process's
/// inherited standard output stream. Never fails, and cheap after the first
/// call (a clone of the registered handle).
pub fn resolve_stdout() -> StreamHandle {
    resolve(&STDOUT_SLOT, || StreamHandle::from_sink(StdoutSink::new()))
}

/// Handle the runtime currently considers standard error.
///
/// Same contract as [`resolve_stdout`], defaulting to the process's
/// inherited standard error stream.
pub fn resolve_stderr() -> StreamHandle {
    resolve(&STDERR_SLOT, || StreamHandle::from_sink(StderrSink::new()))
}

/// Route all subsequent standard-output writes to `handle`.
///
/// Handles resolved before the call keep pointing at the old sink; the
/// runtime re-resolves on use, so interpreter output switches over
/// immediately.
pub fn set_stdout(handle: StreamHandle) {
    *write_slot(&STDOUT_SLOT) = Some(handle);
}

/// Route all subsequent standard-error writes to `handle`.
pub fn set_stderr(handle: StreamHandle) {
    *write_slot(&STDERR_SLOT) = Some(handle);
}

/// Clear both registration slots.
///
/// The next resolution falls back to the process's inherited streams. Meant
/// for host teardown and for tests that swap sinks.
pub fn reset_streams() {
    *write_slot(&STDOUT_SLOT) = None;
    *write_slot(&STDERR_SLOT) = None;
}

fn resolve(
    slot: &RwLock<Option<StreamHandle>>,
    default: impl FnOnce() -> StreamHandle,
) -> StreamHandle {
    if let Some(handle) = read_slot(slot).as_ref() {
        return handle.clone();
    }
    // First resolution, or a racing reset: install the default. get_or_insert
    // keeps a handle another thread installed between our two lock takes.
    write_slot(slot).get_or_insert_with(default).clone()
}

fn read_slot(
    slot: &RwLock<Option<StreamHandle>>,
) -> std::sync::RwLockReadGuard<'_, Option<StreamHandle>> {
    slot.read().unwrap_or_else(|e| e.into_inner())
}

fn write_slot(
    slot: &RwLock<Option<StreamHandle>>,
) -> std::sync::RwLockWriteGuard<'_, Option<StreamHandle>> {
    slot.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Sink, SinkError};
    use crate::sinks::MemorySink;

    // Sink that accepts a fixed number of bytes, then stops
    struct ShortSink {
        remaining: usize,
    }

    impl ShortSink {
        fn new(capacity: usize) -> Self {
            Self { remaining: capacity }
        }
    }

    impl Sink for ShortSink {
        fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
            let accepted = data.len().min(self.remaining);
            self.remaining -= accepted;
            Ok(accepted)
        }

        fn flush(&mut self) -> Result<(), SinkError> {
            Err(SinkError)
        }
    }

    #[test]
    fn test_write_returns_element_count() {
        let capture = MemorySink::new();
        let handle = StreamHandle::from_sink(capture.clone());

        assert_eq!(handle.write(b"hi\n", 1, 3), 3);
        assert!(handle.flush().is_ok());
        assert_eq!(capture.contents(), b"hi\n");
    }

    #[test]
    fn test_write_counts_whole_elements() {
        let capture = MemorySink::new();
        let handle = StreamHandle::from_sink(capture.clone());

        // 2 elements of 4 bytes each
        assert_eq!(handle.write(b"abcdwxyz", 4, 2), 2);
        assert_eq!(capture.contents(), b"abcdwxyz");
    }

    #[test]
    fn test_write_zero_sized_request() {
        let handle = StreamHandle::from_sink(MemorySink::new());
        assert_eq!(handle.write(b"abc", 0, 3), 0);
        assert_eq!(handle.write(b"abc", 3, 0), 0);
    }

    #[test]
    fn test_write_buffer_too_small_writes_nothing() {
        let capture = MemorySink::new();
        let handle = StreamHandle::from_sink(capture.clone());

        assert_eq!(handle.write(b"ab", 1, 3), 0);
        assert!(capture.contents().is_empty());
    }

    #[test]
    fn test_short_write_reports_failure() {
        // Sink takes 5 bytes, then stops: 1 whole 4-byte element made it
        let handle = StreamHandle::from_sink(ShortSink::new(5));
        assert_eq!(handle.write(b"aaaabbbbcccc", 4, 3), 1);
        assert!(handle.flush().is_err());
    }

    #[test]
    fn test_write_fmt_goes_through_the_sink() {
        let capture = MemorySink::new();
        let handle = StreamHandle::from_sink(capture.clone());

        let chars = handle
            .write_fmt(format_args!("answer: {}", 42))
            .unwrap();
        assert_eq!(chars, 10);
        assert_eq!(capture.contents(), b"answer: 42");
    }

    #[test]
    fn test_write_fmt_counts_chars_not_bytes() {
        let capture = MemorySink::new();
        let handle = StreamHandle::from_sink(capture.clone());

        // one char, two bytes in UTF-8
        assert_eq!(handle.write_fmt(format_args!("é")).unwrap(), 1);
        assert_eq!(capture.contents(), "é".as_bytes());
    }

    #[test]
    fn test_write_fmt_short_write_is_an_error() {
        let handle = StreamHandle::from_sink(ShortSink::new(3));
        assert!(handle.write_fmt(format_args!("too long")).is_err());
    }

    #[test]
    fn test_put_char_roundtrip_and_sentinel() {
        let capture = MemorySink::new();
        let handle = StreamHandle::from_sink(capture.clone());

        assert_eq!(handle.put_char('A'), Some('A'));
        assert_eq!(handle.put_char('λ'), Some('λ'));
        assert_eq!(capture.contents(), "Aλ".as_bytes());

        let full = StreamHandle::from_sink(ShortSink::new(0));
        assert_eq!(full.put_char('A'), None);
    }

    #[test]
    fn test_sprint_macro() {
        let capture = MemorySink::new();
        let handle = StreamHandle::from_sink(capture.clone());

        sprint!(handle, "{}-{}", "a", 1).unwrap();
        assert_eq!(capture.contents(), b"a-1");
    }

    #[test]
    fn test_clones_share_one_sink() {
        let capture = MemorySink::new();
        let handle = StreamHandle::from_sink(capture.clone());
        let other = handle.clone();

        handle.write(b"one ", 1, 4);
        other.write(b"two", 1, 3);

        assert!(handle.same_sink(&other));
        assert_eq!(capture.contents(), b"one two");
    }
}
