//! Newline-aligned chunk reading and splitting
//!
//! [`ChunkReader`] pulls fixed-size blocks from the input and extends each one
//! to the next newline, so a line never straddles two chunks. [`split_lines`]
//! then cuts a chunk into lines on `\n` only.

use crate::error::{FilterError, Result};
use std::io::{BufRead, BufReader, Read};
use std::ops::Range;

/// Reference block size for a single raw read (250 KiB)
pub const DEFAULT_BLOCK_SIZE: usize = 250 * 1024;

/// Line delimiter
pub const NEWLINE: u8 = b'\n';

/// Sequential reader producing newline-aligned chunks
pub struct ChunkReader<R: Read> {
    inner: BufReader<R>,
    block_size: usize,
    offset: u64,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R, block_size: usize) -> Self {
        Self {
            inner: BufReader::with_capacity(block_size.max(1), inner),
            block_size: block_size.max(1),
            offset: 0,
        }
    }

    /// Bytes consumed from the input so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Replace the contents of `buf` with the next chunk.
    ///
    /// Returns `Ok(false)` once the input is exhausted, leaving `buf` empty.
    /// Every chunk but the last ends with [`NEWLINE`]. A chunk holds at least
    /// `block_size` bytes unless the input ends first.
    pub fn next_chunk(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        buf.clear();

        let n = match (&mut self.inner)
            .take(self.block_size as u64)
            .read_to_end(buf)
        {
            Ok(n) => n,
            Err(source) => {
                let offset = self.offset + buf.len() as u64;
                buf.clear();
                return Err(FilterError::Read { offset, source });
            }
        };

        if n == 0 {
            return Ok(false);
        }
        self.offset += n as u64;

        if buf.last() != Some(&NEWLINE) {
            let extra = self
                .inner
                .read_until(NEWLINE, buf)
                .map_err(|source| FilterError::Read {
                    offset: self.offset,
                    source,
                })?;
            self.offset += extra as u64;
        }

        Ok(true)
    }
}

/// Split `chunk` on [`NEWLINE`] into byte ranges, replacing `spans`.
///
/// A chunk ending in a newline yields a trailing empty range; callers skip
/// zero-length lines.
pub fn split_lines(chunk: &[u8], spans: &mut Vec<Range<usize>>) {
    spans.clear();

    let mut start = 0;
    for end in memchr::memchr_iter(NEWLINE, chunk) {
        spans.push(start..end);
        start = end + 1;
    }
    spans.push(start..chunk.len());
}

/// Drop one trailing carriage return
#[inline]
pub fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
