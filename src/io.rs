//! `std::io::{Read, Write}` adapters (spec §6 "Reader/Writer").
//!
//! `Writer` buffers a UTF-8 code point across `write()` calls that split
//! it, the same way a `String`-backed writer would; it only ever fails if
//! the accumulated bytes turn out not to be valid UTF-8 at all.

use std::io;

use crate::builder::RopeBuilder;
use crate::error::RopeError;
use crate::iter::Bytes;
use crate::rope::Rope;

/// Reads a rope's content as bytes, in document order.
pub struct Reader<'a> {
    bytes: Bytes<'a>,
}

impl<'a> Reader<'a> {
    /// Wraps `rope` for byte-oriented reading.
    pub fn new(rope: &'a Rope) -> Self {
        Reader { bytes: rope.bytes() }
    }
}

impl<'a> io::Read for Reader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            match self.bytes.next() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

/// Accumulates written bytes into a [`Rope`] via a [`RopeBuilder`].
pub struct Writer {
    builder: RopeBuilder,
    leftover: Vec<u8>,
}

impl Writer {
    /// A writer starting from an empty rope.
    pub fn new() -> Self {
        Writer { builder: RopeBuilder::new(), leftover: Vec::new() }
    }

    /// Consumes the writer, producing the accumulated [`Rope`]. Fails if
    /// a UTF-8 sequence was left incomplete at the end of the stream, or
    /// if the builder recorded a deferred error.
    pub fn finish(self) -> Result<Rope, RopeError> {
        if !self.leftover.is_empty() {
            return Err(RopeError::NotACharBoundary { index: 0 });
        }
        self.builder.build()
    }
}

impl Default for Writer {
    fn default() -> Self {
        Writer::new()
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = std::mem::take(&mut self.leftover);
        data.extend_from_slice(buf);
        match std::str::from_utf8(&data) {
            Ok(s) => {
                self.builder.append(s);
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                let s = std::str::from_utf8(&data[..valid_up_to])
                    .expect("valid_up_to always bounds a valid prefix");
                self.builder.append(s);
                if e.error_len().is_some() {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid UTF-8 in written bytes"));
                }
                self.leftover = data[valid_up_to..].to_vec();
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
