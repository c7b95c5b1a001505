//! Output management module
//!
//! Accepted lines from every worker funnel through one [`SyncOutput`], which
//! serializes writes so lines never interleave.

use std::io::{self, BufWriter, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default buffer size for the output stream (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

struct OutputState<W: Write> {
    writer: BufWriter<W>,
    bytes_written: u64,
    error: Option<io::Error>,
}

impl<W: Write> OutputState<W> {
    fn put_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\n")
    }
}

/// Thread-safe line writer.
///
/// The first write error is kept and every later write is dropped; it is
/// reported by [`SyncOutput::finish`].
pub struct SyncOutput<W: Write> {
    inner: Mutex<OutputState<W>>,
}

impl<W: Write> SyncOutput<W> {
    pub fn new(writer: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, writer)
    }

    pub fn with_capacity(buffer_size: usize, writer: W) -> Self {
        Self {
            inner: Mutex::new(OutputState {
                writer: BufWriter::with_capacity(buffer_size, writer),
                bytes_written: 0,
                error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, OutputState<W>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `line` followed by a newline.
    ///
    /// Returns false once the stream has failed.
    pub fn write_line(&self, line: &[u8]) -> bool {
        let mut state = self.state();
        if state.error.is_some() {
            return false;
        }

        match state.put_line(line) {
            Ok(()) => {
                state.bytes_written += line.len() as u64 + 1; // +1 for newline
                true
            }
            Err(e) => {
                log::warn!("Output write failed, dropping further lines: {}", e);
                state.error = Some(e);
                false
            }
        }
    }

    /// Whether an earlier write failed
    pub fn has_failed(&self) -> bool {
        self.state().error.is_some()
    }

    /// Get bytes written
    pub fn bytes_written(&self) -> u64 {
        self.state().bytes_written
    }

    /// Flush the buffer to the underlying stream
    pub fn flush(&self) -> io::Result<()> {
        let mut state = self.state();
        if let Some(ref e) = state.error {
            return Err(io::Error::new(e.kind(), e.to_string()));
        }
        state.writer.flush()
    }

    /// Flush and hand back the underlying writer, or the first error seen.
    pub fn finish(self) -> io::Result<W> {
        let state = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(e) = state.error {
            return Err(e);
        }
        state.writer.into_inner().map_err(|e| e.into_error())
    }
}
