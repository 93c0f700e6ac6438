//! On-disk pipeline pack data model: dense UIDs into section vectors, a
//! single-byte marker in front of every section.

use ae_shader_compiler::types::{DescriptorBinding, PushConstantRange, TopologyMask};
use std::collections::BTreeMap;

/// A dense index into a pack section's record vector.
pub type Uid = u32;

/// Section markers, written in this exact order — the order the reader
/// expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SectionMarker {
    /// Pack format version, checked before anything else is read.
    Version = 0,
    /// `Vec<DescriptorSetLayout>`.
    DescriptorSetLayouts = 1,
    /// `Vec<PipelineLayout>`.
    PipelineLayouts = 2,
    /// `Vec<RenderPass>` — empty in this cut (the Vulkan render graph is
    /// out of scope); kept so the section sequence stays stable.
    RenderPasses = 3,
    /// `Vec<(name, RenderPassUid)>` — empty alongside `RenderPasses`.
    RenderPassNames = 4,
    /// `Vec<SpirvShader>`.
    SpirvShaders = 5,
    /// `Vec<GraphicsPipeline>`.
    GraphicsPipelines = 6,
    /// `Vec<MeshPipeline>`.
    MeshPipelines = 7,
    /// `Vec<ComputePipeline>`.
    ComputePipelines = 8,
    /// `Vec<RayTracingPipeline>` — enumerated but always empty.
    RayTracingPipelines = 9,
    /// `Vec<(name, PipelineUid)>`.
    PipelineNames = 10,
}

/// The pack format version this writer emits; readers reject any other
/// value.
pub const PACK_VERSION: u32 = 1;

/// A merged descriptor-set layout, deduplicated by structural hash across
/// the whole pack.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSetLayout {
    /// Bindings sorted by name for a stable on-disk form.
    pub bindings: Vec<DescriptorBinding>,
}

/// A pipeline layout: the ordered set-name/layout-UID pairs plus the
/// union of push-constant ranges across every stage in the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineLayout {
    /// `(set_name, set_index, layout_uid)`, ordered by set index.
    pub sets: Vec<(String, u8, Uid)>,
    /// Union of push-constant ranges, keyed by block name.
    pub push_constants: BTreeMap<String, PushConstantRange>,
}

/// A compiled shader stored once per unique [`ae_shader_compiler::ShaderDescription`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpirvShader {
    /// The SPIR-V word stream.
    pub words: Vec<u32>,
}

/// A graphics pipeline: up to 5 stages (vertex, tess-control, tess-eval,
/// geometry, fragment).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPipeline {
    /// UID of each populated stage's compiled SPIR-V, in stage order.
    pub stage_shaders: Vec<(ae_shader_compiler::types::ShaderStage, Uid)>,
    /// Pipeline layout UID.
    pub layout: Uid,
    /// Render-pass UID; unused (render passes are out of scope) but kept
    /// for on-disk shape stability.
    pub render_pass: Uid,
    /// Vertex attributes from the vertex stage's reflection.
    pub vertex_attributes: Vec<ae_shader_compiler::types::VertexAttribute>,
    /// Fragment outputs from the fragment stage's reflection.
    pub fragment_outputs: Vec<ae_shader_compiler::types::FragmentOutput>,
    /// Intersection of every stage's declared topology support.
    pub topology: TopologyMask,
}

/// A mesh-shading pipeline: optional task stage, mesh stage, fragment
/// stage.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPipeline {
    /// UID of each populated stage's compiled SPIR-V.
    pub stage_shaders: Vec<(ae_shader_compiler::types::ShaderStage, Uid)>,
    /// Pipeline layout UID.
    pub layout: Uid,
    /// Render-pass UID.
    pub render_pass: Uid,
    /// Fragment outputs from the fragment stage's reflection.
    pub fragment_outputs: Vec<ae_shader_compiler::types::FragmentOutput>,
}

/// A compute pipeline: a single shader.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputePipeline {
    /// Compiled compute shader UID.
    pub shader: Uid,
    /// Pipeline layout UID.
    pub layout: Uid,
}
