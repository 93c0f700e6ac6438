//! Errors raised composing or reading a crash container.

use ae_serialize::SerError;

/// Errors raised by [`crate::container::write_container`] or
/// [`crate::container::read_container`].
#[derive(thiserror::Error, Debug)]
pub enum CrashContainerError {
    /// The underlying stream failed.
    #[error("stream error: {0}")]
    Io(#[from] ae_stream::StreamError),
    /// The container's version field did not match what this codec reads.
    #[error("unsupported crash container version: {0}")]
    UnsupportedVersion(u32),
    /// The container's magic field was not `AECR`.
    #[error("magic mismatch: expected {expected:#010x}, found {found:#010x}")]
    MagicMismatch {
        /// Magic this codec expects.
        expected: u32,
        /// Magic actually present in the stream.
        found: u32,
    },
    /// The container was structurally invalid (truncated section, bad
    /// UTF-16).
    #[error("malformed crash container: {0}")]
    Malformed(String),
}

impl From<SerError> for CrashContainerError {
    fn from(e: SerError) -> Self {
        match e {
            SerError::Io(e) => Self::Io(e),
            SerError::Malformed(m) => Self::Malformed(m),
            SerError::VersionMismatch { found, .. } => Self::UnsupportedVersion(found),
            SerError::UnknownTag(tag) => Self::Malformed(format!("unknown tag: {tag:?}")),
        }
    }
}
