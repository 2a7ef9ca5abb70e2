//! Bounded-memory pump between a reader, a [`Codec`] and a writer.
//!
//! The engine owns two fixed staging buffers. Input is refilled only once
//! the codec has consumed everything staged, and output is drained only
//! when it is full or the codec reports end of stream, so working memory
//! stays at `2 * capacity` no matter how large the payload is.

use std::io::{ErrorKind, Read, Write};

use serde::Serialize;
use tracing::{debug, trace};

use crate::codec::{Codec, StreamStatus};
use crate::config::{check_capacity, DEFAULT_BUFFER_CAPACITY};
use crate::error::{CnkError, Result};

/// Byte counters for one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Transfer {
    /// Bytes read from the source.
    pub total_in: u64,
    /// Bytes written to the destination.
    pub total_out: u64,
}

pub struct StreamEngine {
    input: Box<[u8]>,
    output: Box<[u8]>,
}

impl Default for StreamEngine {
    fn default() -> Self {
        Self {
            input: vec![0u8; DEFAULT_BUFFER_CAPACITY].into_boxed_slice(),
            output: vec![0u8; DEFAULT_BUFFER_CAPACITY].into_boxed_slice(),
        }
    }
}

impl StreamEngine {
    pub fn new(capacity: usize) -> Result<Self> {
        check_capacity(capacity)?;
        Ok(Self {
            input: vec![0u8; capacity].into_boxed_slice(),
            output: vec![0u8; capacity].into_boxed_slice(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.input.len()
    }

    /// Move `total_input_len` bytes from `reader` through `codec` into
    /// `writer`.
    ///
    /// Returns once the codec reports end of stream and the final output
    /// has been drained. The codec is not finished here; that is the
    /// caller's job once it is done with the handle.
    pub fn run<C, R, W>(
        &mut self,
        codec: &mut C,
        reader: &mut R,
        writer: &mut W,
        total_input_len: u64,
    ) -> Result<Transfer>
    where
        C: Codec + ?Sized,
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut remaining = total_input_len;
        let mut in_pos = 0usize;
        let mut in_len = 0usize;
        let mut out_len = 0usize;
        let mut totals = Transfer::default();

        loop {
            if in_pos == in_len && remaining > 0 {
                let want = remaining.min(self.input.len() as u64) as usize;
                let got = read_full(reader, &mut self.input[..want])?;
                totals.total_in += got as u64;
                if got != want {
                    return Err(CnkError::TruncatedInput {
                        expected: total_input_len,
                        actual: totals.total_in,
                    });
                }
                in_pos = 0;
                in_len = got;
                remaining -= got as u64;
                trace!(read = got, remaining, "refilled input");
            }

            let end_of_input = remaining == 0;
            let feed = codec.feed(
                &self.input[in_pos..in_len],
                &mut self.output[out_len..],
                end_of_input,
            )?;
            in_pos += feed.consumed;
            out_len += feed.produced;

            let done = feed.status == StreamStatus::StreamEnd;
            if done || out_len == self.output.len() {
                drain(writer, &self.output[..out_len])?;
                totals.total_out += out_len as u64;
                trace!(written = out_len, "drained output");
                out_len = 0;
            }
            if done {
                break;
            }
        }

        debug!(
            total_in = totals.total_in,
            total_out = totals.total_out,
            "stream complete"
        );
        Ok(totals)
    }
}

/// Fill `buf` from `reader`, stopping early only at end of file.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn drain<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => {
                return Err(CnkError::ShortWrite {
                    expected: buf.len() as u64,
                    written: written as u64,
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::WriteZero => {
                return Err(CnkError::ShortWrite {
                    expected: buf.len() as u64,
                    written: written as u64,
                })
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
