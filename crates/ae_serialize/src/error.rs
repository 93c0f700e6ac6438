//! Serialization error taxonomy.

/// Errors raised while encoding or decoding the binary format this crate
/// defines.
#[derive(thiserror::Error, Debug)]
pub enum SerError {
    /// The underlying stream failed.
    #[error("stream error: {0}")]
    Io(#[from] ae_stream::StreamError),

    /// A 4-byte object tag had no matching [`crate::factory::ObjectFactory`]
    /// registration.
    #[error("unknown object tag: {0:?}")]
    UnknownTag([u8; 4]),

    /// A format-version field did not match what the reader expects.
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version the reader was built for.
        expected: u32,
        /// Version actually present in the stream.
        found: u32,
    },

    /// The stream contained structurally invalid data (bad length prefix,
    /// invalid tag byte, non-UTF8 string, ...).
    #[error("malformed data: {0}")]
    Malformed(String),
}
