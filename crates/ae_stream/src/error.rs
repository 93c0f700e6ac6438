//! Stream error taxonomy shared by every reader/writer implementation.

/// Errors raised by [`crate::Readable`]/[`crate::Writable`] implementations.
///
/// A read returning fewer bytes than requested is *not* an error — that is
/// ordinary end-of-stream signalling handled by the caller via the return
/// count. `UnexpectedEof` is reserved for callers (like
/// [`crate::Readable::read_exact`]) that demand an exact byte count.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// The underlying resource (typically a file) could not be opened.
    #[error("failed to open stream: {0}")]
    OpenFailed(String),

    /// A read or write against an already-open stream failed.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// A caller that demanded an exact byte count ran out of input first.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// A Brotli encode/decode operation failed, or an unsupported operation
    /// (seek/size/position) was attempted on a compressed stream.
    #[error("compression error: {0}")]
    CompressionError(String),
}
