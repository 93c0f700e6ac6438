//! Gathers declarative sampler scripts, validates and deduplicates them by
//! value, and serializes the result to a versioned binary sampler pack.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod build;
pub mod error;
pub mod pack;
pub mod script;
pub mod types;

pub use build::{build, SamplerPackOutput};
pub use error::SamplerScriptError;
pub use pack::{read_pack, write_pack, SamplerPack, PACK_VERSION};
pub use script::{SamplerDecl, SamplerScript};
pub use types::{AddressMode, BorderColor, CompareOp, Filter, SamplerDesc};
