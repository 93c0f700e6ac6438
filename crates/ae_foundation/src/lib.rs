//! Shared ambient stack for the asset-compilation toolchain and build
//! server: logging setup, file-backed configuration, and timing helpers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod logging;
pub mod path_safety;
pub mod time;

pub use config::{Config, ConfigError};
pub use time::{Stopwatch, Timer};
