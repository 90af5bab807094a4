//! Forward-only access to the source descriptor with one line or one byte of lookahead.
//!
//! Lookahead never seeks, so any [`BufRead`] works, including pipes.

use std::io::{self, BufRead, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use log::trace;

use crate::error::{Error, Result};
use crate::format::Block;

/// A source stream positioned somewhere inside a descriptor.
pub struct Source<R> {
    inner: R,
    /// A line read ahead by [`Source::peek_line`] and not yet consumed.
    peeked: Option<String>,
    /// Number of lines consumed so far.
    line: usize,
}

impl<R: BufRead> Source<R> {
    /// Wraps `inner`, which must be positioned at the start of the descriptor.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
            line: 0,
        }
    }

    /// Number of text lines consumed so far.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Returns the next non-blank line without its terminator, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.peeked.take() {
            self.line += 1;
            return Ok(Some(line));
        }
        let line = self.fetch_line()?;
        if line.is_some() {
            self.line += 1;
        }
        Ok(line)
    }

    /// Like [`Source::next_line`], but the end of input is an error attributed to `block`.
    pub fn expect_line(&mut self, block: Block) -> Result<String> {
        self.next_line()?.ok_or(Error::UnexpectedEnd(block))
    }

    /// Returns the next non-blank line without consuming it.
    pub fn peek_line(&mut self) -> Result<Option<&str>> {
        if self.peeked.is_none() {
            self.peeked = self.fetch_line()?;
        }
        Ok(self.peeked.as_deref())
    }

    fn fetch_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.inner.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            let line = buf.trim_end_matches(&['\r', '\n'][..]);
            if !line.trim().is_empty() {
                trace!("read line {:?}", line);
                return Ok(Some(line.to_owned()));
            }
        }
    }

    /// Returns the next byte without consuming it, or `None` at end of input.
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        debug_assert!(self.peeked.is_none(), "mixed line and byte access");
        Ok(self.inner.fill_buf()?.first().copied())
    }

    /// Reads a chunk header, checking that its tag belongs to `block`, and returns the
    /// payload length.
    pub fn read_chunk_header(&mut self, block: Block) -> Result<u32> {
        let found = self.read_u8().map_err(|err| eof_in(err, block))?;
        if found != block.tag() {
            return Err(Error::UnexpectedTag { block, found });
        }
        let length = self
            .read_u32::<LittleEndian>()
            .map_err(|err| eof_in(err, block))?;
        trace!("{block} chunk of {length} bytes");
        Ok(length)
    }

    /// Reads exactly `length` bytes of a chunk payload belonging to `block`.
    pub fn read_payload(&mut self, block: Block, length: u32) -> Result<Vec<u8>> {
        let mut payload = Vec::new();
        let read = self
            .by_ref()
            .take(u64::from(length))
            .read_to_end(&mut payload)?;
        if read != payload_len(length) {
            return Err(Error::UnexpectedEnd(block));
        }
        Ok(payload)
    }

    /// Reads a NUL-terminated string of at most `limit` bytes including the terminator,
    /// returning its bytes without the terminator.
    ///
    /// A missing terminator within `limit` bytes counts as the end of the block.
    pub fn read_cstr(&mut self, block: Block, limit: u32) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        (&mut self.inner)
            .take(u64::from(limit))
            .read_until(0, &mut bytes)?;
        if bytes.pop() != Some(0) {
            return Err(Error::UnexpectedEnd(block));
        }
        Ok(bytes)
    }
}

impl<R: BufRead> Read for Source<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        debug_assert!(self.peeked.is_none(), "mixed line and byte access");
        self.inner.read(buf)
    }
}

/// Maps a premature end of input to the block being read.
pub(crate) fn eof_in(err: io::Error, block: Block) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEnd(block)
    } else {
        Error::Io(err)
    }
}

fn payload_len(length: u32) -> usize {
    usize::try_from(length).unwrap_or(usize::MAX)
}
