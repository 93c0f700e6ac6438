//! The crash container codec shared by the handler, sender, and server
//! binaries: a fixed header plus a Brotli-compressed payload combining
//! user context, a symbol id, a minidump, and an optional log tail.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod container;
pub mod error;

pub use container::{read_container, write_container, CrashContainer, MAGIC, VERSION};
pub use error::CrashContainerError;
