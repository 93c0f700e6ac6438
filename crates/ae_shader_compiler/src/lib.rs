//! Reflective GLSL-to-SPIR-V shader compiler: black-box compilation via an
//! external compiler binary, plus structured reflection (descriptor sets,
//! push constants, vertex/fragment I/O, workgroup sizes) over the result.
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotations;
pub mod compiler;
pub mod error;
pub mod execution_modes;
pub mod reflect;
pub mod types;

pub use compiler::compile;
pub use error::ShaderCompileError;
pub use types::{ShaderDescription, ShaderReflection, ShaderStage};

use std::path::PathBuf;

/// Compile `source` and reflect over the result in one call.
///
/// Internally this calls [`compile`] once and feeds the resulting SPIR-V
/// to [`reflect::build_reflection`] via `spirv_cross`, rather than
/// re-implementing a GLSL front end for reflection alone — `compile` and
/// reflection remain independently callable for callers (like the
/// pipeline pack builder) that already have SPIR-V in hand and want only
/// the reflection, or vice versa.
pub fn build_reflection(
    stage: ShaderStage,
    spirv_version: u32,
    entry: &str,
    source: &str,
    defines: &[String],
    include_dirs: &[PathBuf],
) -> Result<types::ShaderReflection, ShaderCompileError> {
    let spirv = compile(stage, spirv_version, entry, source, defines, include_dirs)?;
    let prologue = compiler::synthesize_prologue(stage, defines);
    let annotated_source = format!("{prologue}{source}");
    reflect::build_reflection(stage, &spirv, &annotated_source)
}
