//! Brotli-compressed stream wrappers, layered on top of any
//! [`Readable`]/[`Writable`] by adapting them to `std::io::{Read, Write}`.

use crate::error::StreamError;
use crate::traits::{Readable, Writable};
use std::io;

const BUFFER_SIZE: usize = 4 * 1024 * 1024;
const LG_WINDOW_SIZE: u32 = 22;

/// Adapts a [`Readable`] to `std::io::Read` so it can sit underneath
/// `brotli::Decompressor`.
struct ReadAdapter<R: Readable>(R);

impl<R: Readable> io::Read for ReadAdapter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0
            .read(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

/// Adapts a borrowed [`Writable`] to `std::io::Write` so it can sit
/// underneath `brotli::CompressorWriter`.
struct WriteAdapter<'a, W: Writable>(&'a mut W);

impl<W: Writable> io::Write for WriteAdapter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .write(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .flush()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

/// A stream that transparently inflates Brotli-compressed data as it is
/// read. Owns the underlying compressed stream.
pub struct BrotliReader<R: Readable> {
    inner: ::brotli::Decompressor<ReadAdapter<R>>,
}

impl<R: Readable> BrotliReader<R> {
    /// Wrap `source`, treating every byte read from it as Brotli-compressed.
    pub fn new(source: R) -> Self {
        Self { inner: ::brotli::Decompressor::new(ReadAdapter(source), BUFFER_SIZE) }
    }
}

impl<R: Readable> Readable for BrotliReader<R> {
    fn is_open(&self) -> bool {
        true
    }

    fn position(&mut self) -> Result<u64, StreamError> {
        Err(StreamError::CompressionError(
            "position is not defined for a decompressing stream".into(),
        ))
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        Err(StreamError::CompressionError(
            "size is not defined for a decompressing stream".into(),
        ))
    }

    fn seek(&mut self, _pos: u64) -> Result<(), StreamError> {
        Err(StreamError::CompressionError("a decompressing stream cannot be seeked".into()))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        use io::Read;
        self.inner
            .read(buf)
            .map_err(|e| StreamError::CompressionError(e.to_string()))
    }
}

/// A stream that transparently deflates written bytes with Brotli before
/// forwarding them to the borrowed underlying stream. Borrows rather than
/// owns its sink so the caller can reclaim it (and patch a header, for
/// example) once compression finishes.
pub struct BrotliWriter<'a, W: Writable> {
    inner: ::brotli::CompressorWriter<WriteAdapter<'a, W>>,
}

impl<'a, W: Writable> BrotliWriter<'a, W> {
    /// Wrap `sink`, compressing every byte written through this stream
    /// before it reaches `sink`. `quality` is the spec's 0.0-1.0 fraction,
    /// mapped onto Brotli's native 0..=11 quality scale.
    #[must_use]
    pub fn new(sink: &'a mut W, quality: f32) -> Self {
        let q = (quality.clamp(0.0, 1.0) * 11.0).round() as u32;
        Self {
            inner: ::brotli::CompressorWriter::new(WriteAdapter(sink), BUFFER_SIZE, q, LG_WINDOW_SIZE),
        }
    }

    /// Flush and drop the compressor, releasing the borrow on the
    /// underlying sink back to the caller.
    pub fn finish(mut self) -> Result<(), StreamError> {
        use io::Write;
        self.inner
            .flush()
            .map_err(|e| StreamError::CompressionError(e.to_string()))
    }
}

impl<W: Writable> Writable for BrotliWriter<'_, W> {
    fn is_open(&self) -> bool {
        true
    }

    fn position(&mut self) -> Result<u64, StreamError> {
        Err(StreamError::CompressionError(
            "position is not defined for a compressing stream".into(),
        ))
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        Err(StreamError::CompressionError("size is not defined for a compressing stream".into()))
    }

    fn seek(&mut self, _pos: u64) -> Result<(), StreamError> {
        Err(StreamError::CompressionError("a compressing stream cannot be seeked".into()))
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        use io::Write;
        self.inner
            .write_all(buf)
            .map_err(|e| StreamError::CompressionError(e.to_string()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        use io::Write;
        self.inner.flush().map_err(|e| StreamError::CompressionError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::{MemReader, MemWriter};

    #[test]
    fn round_trips_through_compression() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let mut sink = MemWriter::new();
        {
            let mut w = BrotliWriter::new(&mut sink, 0.7);
            w.write(&original).unwrap();
            w.finish().unwrap();
        }
        let compressed = sink.into_bytes();
        assert!(compressed.len() < original.len());

        let mut r = BrotliReader::new(MemReader::from_bytes(compressed));
        let decompressed = r.read_to_end().unwrap();
        assert_eq!(decompressed, original);
    }
}
