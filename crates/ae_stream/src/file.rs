//! File-backed streams: a positional, `stdio`-equivalent API over
//! `std::fs::File`. Opening a missing or unreadable file is a non-fatal
//! `StreamError::OpenFailed`, never a panic.

use crate::error::StreamError;
use crate::traits::{Readable, Writable};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file opened for positional reads, writes, or both.
#[derive(Debug)]
pub struct FileStream {
    file: File,
    path: PathBuf,
}

impl FileStream {
    /// Open an existing file for reading.
    pub fn open_read(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| StreamError::OpenFailed(format!("{}: {e}", path.display())))?;
        Ok(Self { file, path: path.to_path_buf() })
    }

    /// Create (truncating if it exists) a file for writing.
    pub fn create_write(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| StreamError::OpenFailed(format!("{}: {e}", path.display())))?;
        Ok(Self { file, path: path.to_path_buf() })
    }

    /// Open a file for both reading and writing in place, without
    /// truncating — used when a writer needs to seek back and patch a
    /// header after streaming the body (see the crash container codec).
    pub fn open_read_write(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| StreamError::OpenFailed(format!("{}: {e}", path.display())))?;
        Ok(Self { file, path: path.to_path_buf() })
    }

    /// Path this stream was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Readable for FileStream {
    fn is_open(&self) -> bool {
        true
    }

    fn position(&mut self) -> Result<u64, StreamError> {
        Ok(self.file.stream_position()?)
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        Ok(self.file.metadata()?.len())
    }

    fn seek(&mut self, pos: u64) -> Result<(), StreamError> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        Ok(self.file.read(buf)?)
    }
}

impl Writable for FileStream {
    fn is_open(&self) -> bool {
        true
    }

    fn position(&mut self) -> Result<u64, StreamError> {
        Ok(self.file.stream_position()?)
    }

    fn size(&mut self) -> Result<u64, StreamError> {
        Ok(self.file.metadata()?.len())
    }

    fn seek(&mut self, pos: u64) -> Result<(), StreamError> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(self.file.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ae_stream_test_{}_{name}", std::process::id()))
    }

    #[test]
    fn open_read_on_missing_file_is_non_fatal() {
        let err = FileStream::open_read(temp_path("does-not-exist")).unwrap_err();
        assert!(matches!(err, StreamError::OpenFailed(_)));
    }

    #[test]
    fn write_then_read_round_trips() {
        let path = temp_path("roundtrip.bin");
        let mut w = FileStream::create_write(&path).unwrap();
        w.write(b"hello world").unwrap();
        w.flush().unwrap();
        drop(w);

        let mut r = FileStream::open_read(&path).unwrap();
        let data = r.read_to_end().unwrap();
        assert_eq!(data, b"hello world");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn short_read_is_not_an_error() {
        let path = temp_path("short.bin");
        let mut w = FileStream::create_write(&path).unwrap();
        w.write(b"ab").unwrap();
        drop(w);

        let mut r = FileStream::open_read(&path).unwrap();
        let mut buf = [0u8; 10];
        let n = r.read(&mut buf).unwrap();
        assert_eq!(n, 2);
        std::fs::remove_file(&path).ok();
    }
}
