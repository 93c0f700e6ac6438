//! The `Readable`/`Writable` capability sets every stream implementation
//! in this crate provides.

use crate::error::StreamError;

/// A seekable source of bytes.
///
/// `read` mirrors `std::io::Read::read`: it may return fewer bytes than
/// `buf.len()` without that being an error — a short read is simply
/// end-of-stream (or end-of-availability, for a sub-range).
pub trait Readable {
    /// Whether the underlying resource is still open for reads.
    fn is_open(&self) -> bool;

    /// Current read cursor, in bytes from the start of the stream.
    fn position(&mut self) -> Result<u64, StreamError>;

    /// Total size of the stream in bytes, if known.
    fn size(&mut self) -> Result<u64, StreamError>;

    /// Move the read cursor to an absolute byte offset.
    fn seek(&mut self, pos: u64) -> Result<(), StreamError>;

    /// Read up to `buf.len()` bytes, returning the number actually read.
    /// `Ok(0)` means end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Read exactly `buf.len()` bytes, looping over short reads.
    /// Returns [`StreamError::UnexpectedEof`] if the stream ends first.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), StreamError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(StreamError::UnexpectedEof);
            }
            filled += n;
        }
        Ok(())
    }

    /// Read every remaining byte into a freshly allocated vector.
    fn read_to_end(&mut self) -> Result<Vec<u8>, StreamError> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }
}

/// A seekable sink of bytes.
pub trait Writable {
    /// Whether the underlying resource is still open for writes.
    fn is_open(&self) -> bool;

    /// Current write cursor, in bytes from the start of the stream.
    fn position(&mut self) -> Result<u64, StreamError>;

    /// Total size of the stream written so far.
    fn size(&mut self) -> Result<u64, StreamError>;

    /// Move the write cursor to an absolute byte offset.
    fn seek(&mut self, pos: u64) -> Result<(), StreamError>;

    /// Write exactly `buf.len()` bytes, looping over short writes.
    /// Returns the number of bytes written, which equals `buf.len()` on
    /// success.
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

    /// Flush any buffered data to the underlying resource.
    fn flush(&mut self) -> Result<(), StreamError>;
}
