//! In-memory streams: a read-only view over an owned byte buffer (or a
//! UTF-8 string's bytes), and a write-only buffer that grows exponentially
//! via `Vec`'s amortized reallocation.

use crate::error::StreamError;
use crate::traits::{Readable, Writable};

/// A read-only stream over an owned byte buffer.
pub struct MemReader {
    data: Vec<u8>,
    pos: usize,
}

impl MemReader {
    /// Wrap an owned byte vector.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Wrap a string's UTF-8 bytes (copied into an owned buffer; Rust has
    /// no lifetime-free borrowed-string stream, so this is the value-type
    /// equivalent of the spec's "string view" source).
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        Self::from_bytes(s.as_bytes().to_vec())
    }
}

impl Readable for MemReader {
    fn is_open(&self) -> bool {
        true
    }

    fn position(&mut self) -> Result<u64, StreamError> {
        Ok(self.pos as u64)
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        Ok(self.data.len() as u64)
    }

    fn seek(&mut self, pos: u64) -> Result<(), StreamError> {
        self.pos = (pos as usize).min(self.data.len());
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// A write-only stream over a growing byte buffer.
pub struct MemWriter {
    data: Vec<u8>,
    pos: usize,
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new(), pos: 0 }
    }

    /// Consume the writer, returning everything written so far.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Borrow what's been written so far without consuming the writer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Writable for MemWriter {
    fn is_open(&self) -> bool {
        true
    }

    fn position(&mut self) -> Result<u64, StreamError> {
        Ok(self.pos as u64)
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        Ok(self.data.len() as u64)
    }

    fn seek(&mut self, pos: u64) -> Result<(), StreamError> {
        self.pos = pos as usize;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        let end = self.pos + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back_via_reader() {
        let mut w = MemWriter::new();
        w.write(b"abc").unwrap();
        w.write(b"def").unwrap();
        let mut r = MemReader::from_bytes(w.into_bytes());
        assert_eq!(r.read_to_end().unwrap(), b"abcdef");
    }

    #[test]
    fn seek_then_overwrite_in_place() {
        let mut w = MemWriter::new();
        w.write(b"aaaa").unwrap();
        w.seek(1).unwrap();
        w.write(b"bb").unwrap();
        assert_eq!(w.into_bytes(), b"abba");
    }

    #[test]
    fn short_read_at_eof() {
        let mut r = MemReader::from_str("hi");
        let mut buf = [0u8; 5];
        assert_eq!(r.read(&mut buf).unwrap(), 2);
        assert_eq!(r.read(&mut buf).unwrap(), 0);
    }
}
