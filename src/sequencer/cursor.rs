//! Byte cursor and lexical primitives
//!
//! The parser never tokenizes into strings. It reads one byte at a time and
//! pushes back a single byte of lookahead when that byte belongs to the next
//! token, so memory use stays constant in the length of a line.

use crate::error::Result;
use std::io::{ErrorKind, Read};

pub const COMMENT: u8 = b'#';

/// Check for a line terminator byte
pub fn is_line_end(b: u8) -> bool {
    b == b'\r' || b == b'\n'
}

/// Check for inter-token whitespace (not line terminators)
pub fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Byte reader with one byte of pushback
pub struct ByteCursor<R> {
    inner: R,
    pushback: Option<u8>,
}

impl<R: Read> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pushback: None,
        }
    }

    /// Read the next byte, `None` at end of input
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        if let Some(b) = self.pushback.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Return a byte so the next read yields it again
    pub fn unread(&mut self, b: u8) {
        debug_assert!(self.pushback.is_none(), "only one byte of pushback");
        self.pushback = Some(b);
    }

    /// Advance to (but not past) the next line terminator
    pub fn skip_comment(&mut self) -> Result<()> {
        while let Some(b) = self.next_byte()? {
            if is_line_end(b) {
                self.unread(b);
                break;
            }
        }
        Ok(())
    }

    /// Advance over spaces and tabs
    pub fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.next_byte()? {
            if !is_blank(b) {
                self.unread(b);
                break;
            }
        }
        Ok(())
    }

    /// Collect the rest of the line with surrounding whitespace trimmed
    ///
    /// Stops before a line terminator or comment marker; neither is consumed.
    pub fn read_rest_of_line(&mut self) -> Result<Vec<u8>> {
        self.skip_whitespace()?;
        let mut chars = Vec::new();
        while let Some(b) = self.next_byte()? {
            if is_line_end(b) || b == COMMENT {
                self.unread(b);
                break;
            }
            chars.push(b);
        }
        while chars.last().copied().is_some_and(is_blank) {
            chars.pop();
        }
        Ok(chars)
    }
}
