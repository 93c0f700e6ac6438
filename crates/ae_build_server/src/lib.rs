//! Accepts a declarative build recipe over HTTP, runs it against a
//! sandboxed per-build workspace on a scheduler worker thread, and
//! streams its log back until the build finishes or is reaped.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod android;
pub mod api;
pub mod config;
pub mod ctest;
pub mod error;
pub mod process;
pub mod recipe;
pub mod server;
pub mod types;

pub use api::BuildScriptApi;
pub use config::BuildServerConfig;
pub use error::BuildError;
pub use recipe::{interpret, parse_recipe, BuildStep};
pub use server::BuildServer;
pub use types::{BuildId, EArch, ECompiler};
