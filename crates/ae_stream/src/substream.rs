//! A read-only view over a byte range of some other [`Readable`].

use crate::error::StreamError;
use crate::traits::Readable;

/// A window onto `[offset, offset + size)` of a borrowed parent stream.
///
/// Every read first seeks the parent to `offset + pos`, so reading through
/// a `SubStream` moves the parent's own cursor. Callers that interleave
/// reads from the parent and from substreams derived from it must reseek
/// the parent themselves afterward.
pub struct SubStream<'a, R: Readable> {
    parent: &'a mut R,
    offset: u64,
    size: u64,
    pos: u64,
}

impl<'a, R: Readable> SubStream<'a, R> {
    /// Create a view over `size` bytes of `parent` starting at `offset`.
    pub fn new(parent: &'a mut R, offset: u64, size: u64) -> Self {
        Self { parent, offset, size, pos: 0 }
    }
}

impl<R: Readable> Readable for SubStream<'_, R> {
    fn is_open(&self) -> bool {
        self.parent.is_open()
    }

    fn position(&mut self) -> Result<u64, StreamError> {
        Ok(self.pos)
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        Ok(self.size)
    }

    fn seek(&mut self, pos: u64) -> Result<(), StreamError> {
        self.pos = pos.min(self.size);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let remaining = self.size.saturating_sub(self.pos);
        if remaining == 0 {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(remaining) as usize;
        self.parent.seek(self.offset + self.pos)?;
        let n = self.parent.read(&mut buf[..want])?;
        self.pos += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::MemReader;

    #[test]
    fn reads_only_the_window() {
        let mut parent = MemReader::from_bytes(b"0123456789".to_vec());
        let mut sub = SubStream::new(&mut parent, 3, 4);
        assert_eq!(sub.read_to_end().unwrap(), b"3456");
    }

    #[test]
    fn seek_is_relative_to_window() {
        let mut parent = MemReader::from_bytes(b"abcdefghij".to_vec());
        let mut sub = SubStream::new(&mut parent, 2, 5);
        sub.seek(2).unwrap();
        let mut buf = [0u8; 2];
        let n = sub.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ef");
    }

    #[test]
    fn read_past_window_end_is_short_not_an_error() {
        let mut parent = MemReader::from_bytes(b"abcdefghij".to_vec());
        let mut sub = SubStream::new(&mut parent, 8, 4);
        let mut buf = [0u8; 10];
        let n = sub.read(&mut buf).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..n], b"ij");
    }
}
