//! Gathers declarative pipeline scripts, compiles and reflects their
//! shaders, merges descriptor-set layouts to a fixpoint, and serializes the
//! result to a versioned binary pipeline pack.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod build;
pub mod error;
pub mod pack;
pub mod script;
pub mod types;

pub use build::{build, BuildOutput};
pub use error::PipelineError;
pub use pack::{read_pack, write_pack, PipelinePack};
pub use script::{ComputePipelineDecl, GraphicsPipelineDecl, MeshPipelineDecl, PipelineScript, StageDecl};
pub use types::{SectionMarker, Uid, PACK_VERSION};
