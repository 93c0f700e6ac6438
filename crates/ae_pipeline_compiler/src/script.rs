//! Declarative pipeline scripts: RON documents deserialized with `serde`,
//! standing in for an embedded scripting VM. A build recipe's own
//! scripting surface stays untouched elsewhere; this is just the
//! pipeline declaration format, using `ron`/`serde` for the same kind of
//! declarative-data ingestion `ApplicationConfig` already does.

use ae_shader_compiler::types::ShaderStage;
use serde::{Deserialize, Serialize};

/// One `.pipeline` script: every pipeline declared in a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineScript {
    /// Graphics pipelines declared in this file.
    #[serde(default)]
    pub graphics: Vec<GraphicsPipelineDecl>,
    /// Mesh pipelines declared in this file.
    #[serde(default)]
    pub mesh: Vec<MeshPipelineDecl>,
    /// Compute pipelines declared in this file.
    #[serde(default)]
    pub compute: Vec<ComputePipelineDecl>,
}

/// One shader stage reference within a pipeline declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDecl {
    /// Stage this reference targets.
    pub stage: ShaderStage,
    /// Path to the GLSL source, resolved against the shader-search roots.
    pub file: String,
    /// Entry point name, `"main"` if omitted.
    #[serde(default = "default_entry")]
    pub entry: String,
    /// Preprocessor defines for this stage; re-sorted to canonical order
    /// when the shader description is built.
    #[serde(default)]
    pub defines: Vec<String>,
}

fn default_entry() -> String {
    "main".to_string()
}

/// A declared graphics pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsPipelineDecl {
    /// Unique name within the pack.
    pub name: String,
    /// Vertex stage, required.
    pub vertex: StageDecl,
    /// Optional tessellation-control stage.
    #[serde(default)]
    pub tess_control: Option<StageDecl>,
    /// Optional tessellation-evaluation stage.
    #[serde(default)]
    pub tess_eval: Option<StageDecl>,
    /// Optional geometry stage.
    #[serde(default)]
    pub geometry: Option<StageDecl>,
    /// Fragment stage, required.
    pub fragment: StageDecl,
    /// SPIR-V IR version shared by every stage in this pipeline.
    #[serde(default = "default_ir_version")]
    pub ir_version: u32,
}

/// A declared mesh-shading pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshPipelineDecl {
    /// Unique name within the pack.
    pub name: String,
    /// Optional task stage.
    #[serde(default)]
    pub task: Option<StageDecl>,
    /// Mesh stage, required.
    pub mesh: StageDecl,
    /// Fragment stage, required.
    pub fragment: StageDecl,
    /// SPIR-V IR version shared by every stage in this pipeline.
    #[serde(default = "default_ir_version")]
    pub ir_version: u32,
}

/// A declared compute pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputePipelineDecl {
    /// Unique name within the pack.
    pub name: String,
    /// The single compute shader.
    pub shader: StageDecl,
    /// SPIR-V IR version.
    #[serde(default = "default_ir_version")]
    pub ir_version: u32,
}

fn default_ir_version() -> u32 {
    140
}
