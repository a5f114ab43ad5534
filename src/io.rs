//! A bounds checked cursor used to read DNS messages.

use crate::errors::ParseError;
use byteorder::{ByteOrder, BE};
use std::fmt;

/// A read-only view over a DNS message that remembers how far it has read.
///
/// A response is read into memory in one go, and every decode step reads
/// through a `ByteCursor`. A failed read never moves the cursor, so a
/// caller can report exactly where decoding stopped.
///
/// Compression pointers are followed with [`ByteCursor::rebased`], which
/// hands out a second cursor over the same bytes without disturbing this one.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> ByteCursor<'a> {
        ByteCursor { buf, offset: 0 }
    }

    /// Returns the next `n` bytes, advancing the offset by `n`.
    pub fn next_bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        let end = match self.offset.checked_add(n) {
            Some(end) if end <= self.buf.len() => end,
            _ => {
                return Err(ParseError::OutOfRange {
                    offset: self.offset,
                    len: n,
                    size: self.buf.len(),
                })
            }
        };

        let bytes = &self.buf[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    /// Returns the next byte, advancing the offset by one.
    pub fn next_byte(&mut self) -> Result<u8, ParseError> {
        Ok(self.next_bytes(1)?[0])
    }

    /// Reads a big endian u16.
    pub fn next_u16(&mut self) -> Result<u16, ParseError> {
        Ok(BE::read_u16(self.next_bytes(2)?))
    }

    /// Reads a big endian u32.
    pub fn next_u32(&mut self) -> Result<u32, ParseError> {
        Ok(BE::read_u32(self.next_bytes(4)?))
    }

    /// Length of the whole underlying buffer, regardless of the offset.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Returns a new cursor over the same buffer, positioned at `offset`.
    pub fn rebased(&self, offset: usize) -> Result<ByteCursor<'a>, ParseError> {
        if offset > self.buf.len() {
            return Err(ParseError::InvalidOffset {
                offset,
                size: self.buf.len(),
            });
        }

        Ok(ByteCursor {
            buf: self.buf,
            offset,
        })
    }

    /// Returns `buf[start..end]` without moving the cursor.
    pub fn range(&self, start: usize, end: usize) -> Result<&'a [u8], ParseError> {
        match self.buf.get(start..end) {
            Some(slice) => Ok(slice),
            None => Err(ParseError::InvalidRange {
                start,
                end,
                size: self.buf.len(),
            }),
        }
    }
}

impl fmt::Debug for ByteCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteCursor(offset={}, size={})", self.offset, self.size())
    }
}
