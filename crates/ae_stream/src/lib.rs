//! Byte stream abstractions shared by every codec and binary pack in the
//! workspace: a minimal `Readable`/`Writable` capability split over files,
//! memory buffers, byte-range sub-views, and Brotli compression.
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod brotli;
pub mod error;
pub mod file;
pub mod mem;
pub mod substream;
pub mod traits;

pub use brotli::{BrotliReader, BrotliWriter};
pub use error::StreamError;
pub use file::FileStream;
pub use mem::{MemReader, MemWriter};
pub use substream::SubStream;
pub use traits::{Readable, Writable};
