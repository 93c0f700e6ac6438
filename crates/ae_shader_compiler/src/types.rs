//! Data model for shader descriptions and reflection records.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of descriptor sets a pipeline layout may reference.
pub const MAX_SETS: usize = 4;

/// The pipeline stage a shader unit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Tessellation control stage.
    TessControl,
    /// Tessellation evaluation stage.
    TessEval,
    /// Geometry stage.
    Geometry,
    /// Fragment stage.
    Fragment,
    /// Compute stage.
    Compute,
    /// Mesh-shading task stage.
    Task,
    /// Mesh-shading mesh stage.
    Mesh,
    /// Ray generation stage.
    RayGen,
    /// Ray closest-hit stage.
    RayClosestHit,
    /// Ray miss stage.
    RayMiss,
}

impl ShaderStage {
    /// The `glslc`/`glslangValidator` `-fshader-stage=` value for this
    /// stage.
    #[must_use]
    pub fn compiler_flag(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tesscontrol",
            ShaderStage::TessEval => "tesseval",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
            ShaderStage::Task => "task",
            ShaderStage::Mesh => "mesh",
            ShaderStage::RayGen => "rgen",
            ShaderStage::RayClosestHit => "rchit",
            ShaderStage::RayMiss => "rmiss",
        }
    }

    /// GLSL extensions the synthesized prologue must enable for this
    /// stage.
    #[must_use]
    pub fn required_extensions(self) -> &'static [&'static str] {
        match self {
            ShaderStage::Task | ShaderStage::Mesh => &["GL_NV_mesh_shader"],
            ShaderStage::RayGen | ShaderStage::RayClosestHit | ShaderStage::RayMiss => {
                &["GL_NV_ray_tracing"]
            }
            _ => &[],
        }
    }
}

bitflags! {
    /// A set of [`ShaderStage`]s, used for push-constant ranges and
    /// descriptor-binding stage masks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StageMask: u16 {
        /// See [`ShaderStage::Vertex`].
        const VERTEX = 1 << 0;
        /// See [`ShaderStage::TessControl`].
        const TESS_CONTROL = 1 << 1;
        /// See [`ShaderStage::TessEval`].
        const TESS_EVAL = 1 << 2;
        /// See [`ShaderStage::Geometry`].
        const GEOMETRY = 1 << 3;
        /// See [`ShaderStage::Fragment`].
        const FRAGMENT = 1 << 4;
        /// See [`ShaderStage::Compute`].
        const COMPUTE = 1 << 5;
        /// See [`ShaderStage::Task`].
        const TASK = 1 << 6;
        /// See [`ShaderStage::Mesh`].
        const MESH = 1 << 7;
        /// See [`ShaderStage::RayGen`].
        const RAY_GEN = 1 << 8;
        /// See [`ShaderStage::RayClosestHit`].
        const RAY_CLOSEST_HIT = 1 << 9;
        /// See [`ShaderStage::RayMiss`].
        const RAY_MISS = 1 << 10;
    }
}

impl From<ShaderStage> for StageMask {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => StageMask::VERTEX,
            ShaderStage::TessControl => StageMask::TESS_CONTROL,
            ShaderStage::TessEval => StageMask::TESS_EVAL,
            ShaderStage::Geometry => StageMask::GEOMETRY,
            ShaderStage::Fragment => StageMask::FRAGMENT,
            ShaderStage::Compute => StageMask::COMPUTE,
            ShaderStage::Task => StageMask::TASK,
            ShaderStage::Mesh => StageMask::MESH,
            ShaderStage::RayGen => StageMask::RAY_GEN,
            ShaderStage::RayClosestHit => StageMask::RAY_CLOSEST_HIT,
            ShaderStage::RayMiss => StageMask::RAY_MISS,
        }
    }
}

bitflags! {
    /// Input topologies a shader's reflection declares support for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TopologyMask: u8 {
        /// Separate triangles.
        const TRIANGLE_LIST = 1 << 0;
        /// Triangle strip.
        const TRIANGLE_STRIP = 1 << 1;
        /// Separate lines.
        const LINE_LIST = 1 << 2;
        /// Isolated points.
        const POINT_LIST = 1 << 3;
        /// Tessellation patches; forced when a tess-control stage is
        /// present.
        const PATCH = 1 << 4;
        /// Connected line strip.
        const LINE_STRIP = 1 << 5;
        /// Fan of triangles sharing a common first vertex.
        const TRIANGLE_FAN = 1 << 6;
    }
}

impl TopologyMask {
    /// The non-patch topologies a vertex/geometry/fragment stage set
    /// supports by default when no execution mode narrows them: every
    /// classic primitive topology, excluding [`TopologyMask::PATCH`].
    #[must_use]
    pub fn classic() -> Self {
        Self::TRIANGLE_LIST
            | Self::TRIANGLE_STRIP
            | Self::LINE_LIST
            | Self::POINT_LIST
            | Self::LINE_STRIP
            | Self::TRIANGLE_FAN
    }
}

/// The identity of a shader compilation unit: `(filename, stage,
/// ir_version, defines)`. Two descriptions differing only in define order
/// are equal, because `new` canonicalizes (sorts) the define list before
/// it is ever compared or hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderDescription {
    /// Path to the GLSL source, relative to a shader-search root.
    pub filename: String,
    /// Target pipeline stage.
    pub stage: ShaderStage,
    /// SPIR-V IR version, from the `{100,110,120,130,140,150}` set §4.4
    /// describes.
    pub ir_version: u32,
    /// Preprocessor defines, canonicalized to sorted order.
    pub defines: Vec<String>,
}

impl ShaderDescription {
    /// Build a description, sorting `defines` so two descriptions that
    /// differ only in define order compare and hash equal.
    #[must_use]
    pub fn new(filename: impl Into<String>, stage: ShaderStage, ir_version: u32, mut defines: Vec<String>) -> Self {
        defines.sort();
        Self { filename: filename.into(), stage, ir_version, defines }
    }
}

/// Whether a storage-capable binding is read back by later passes or only
/// ever written to before being handed off (e.g. to a swapchain present or
/// the next pass's load), letting a driver skip preserving its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessState {
    /// The binding may be read after this shader invocation completes.
    ReadWrite,
    /// Marked `//@discard`: nothing downstream reads this binding's prior
    /// contents, so a driver may treat it as write-only.
    Discard,
}

/// The concrete resource kind a [`DescriptorBinding`] exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// A uniform buffer, with `(static_size, array_stride,
    /// dynamic_offset_index)`.
    UniformBuffer { static_size: u32, array_stride: u32, dynamic_offset_index: Option<u32> },
    /// A storage buffer, with `(static_size, array_stride,
    /// dynamic_offset_index, access)`.
    StorageBuffer { static_size: u32, array_stride: u32, dynamic_offset_index: Option<u32>, access: AccessState },
    /// A texel buffer bound for uniform (read-only) access.
    UniformTexelBuffer,
    /// A texel buffer bound for storage (read-write) access.
    StorageTexelBuffer {
        /// Whether prior contents are ever read back.
        access: AccessState,
    },
    /// A sampled image with no attached sampler.
    SampledImage(ImageType),
    /// A storage image.
    StorageImage(ImageType, AccessState),
    /// A sampled image with an attached (non-immutable) sampler.
    CombinedImage(ImageType),
    /// A sampled image with an attached immutable sampler.
    CombinedImageImmutableSampler(ImageType),
    /// A standalone sampler.
    Sampler,
    /// A standalone immutable sampler.
    ImmutableSampler,
    /// An input attachment read by a fragment shader.
    SubpassInput,
    /// A ray-tracing acceleration structure. Never produced by reflection
    /// in this cut since the ray-tracing pipeline flavor is unpopulated.
    AccelerationStructure,
}

/// Image dimensionality/format bits carried by an image-kind descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageType {
    /// `1D`/`2D`/`3D`/`Cube`/`Buffer`.
    pub dim: ImageDim,
    /// Whether the image is an array of `dim`.
    pub arrayed: bool,
    /// Whether the image is multisampled.
    pub multisampled: bool,
    /// Whether this is a depth-comparison (shadow) image.
    pub shadow: bool,
}

/// Image dimensionality, mirroring SPIR-V's `Dim` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageDim {
    /// One-dimensional.
    D1,
    /// Two-dimensional.
    D2,
    /// Three-dimensional.
    D3,
    /// Cube map.
    Cube,
    /// Texel buffer.
    Buffer,
}

/// A single binding within a descriptor set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorBinding {
    /// The name given to the uniform/resource in source.
    pub name: String,
    /// Binding index within its set.
    pub binding: u32,
    /// Array size; `1` for a non-array binding.
    pub array_size: u32,
    /// Stages that reference this binding.
    pub stage_mask: StageMask,
    /// The resource kind and its kind-specific metadata.
    pub kind: DescriptorKind,
}

/// A named push-constant range.
#[derive(Debug, Clone, PartialEq)]
pub struct PushConstantRange {
    /// Stages that reference this range.
    pub stage_mask: StageMask,
    /// Byte offset within the push-constant block.
    pub offset: u32,
    /// Byte size of the range.
    pub size: u32,
}

/// A vertex-stage input attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    /// Attribute name in source.
    pub name: String,
    /// `layout(location = N)` index.
    pub location: u32,
    /// Component count (1..=4).
    pub components: u8,
}

/// A fragment-stage color output.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentOutput {
    /// Output name in source.
    pub name: String,
    /// `layout(location = N)` index.
    pub location: u32,
}

/// Everything [`crate::build_reflection`] extracts from a compiled shader.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderReflection {
    /// Descriptor bindings, grouped by set index (`0..MAX_SETS`).
    pub sets: [Vec<DescriptorBinding>; MAX_SETS],
    /// `//@set N "name"` names given to set indices that use one, keyed by
    /// set index.
    pub set_names: BTreeMap<u8, String>,
    /// Push-constant ranges keyed by block name.
    pub push_constants: BTreeMap<String, PushConstantRange>,
    /// Vertex attributes; empty unless the stage is [`ShaderStage::Vertex`].
    pub vertex_attributes: Vec<VertexAttribute>,
    /// Fragment outputs; empty unless the stage is
    /// [`ShaderStage::Fragment`].
    pub fragment_outputs: Vec<FragmentOutput>,
    /// Specialization-constant name to id map.
    pub spec_constants: BTreeMap<String, u32>,
    /// Tessellation patch vertex count, tess-control stage only.
    pub tess_patch_size: Option<u32>,
    /// Compute/mesh/task local group size.
    pub group_size: Option<[u32; 3]>,
    /// Specialization-constant ids overriding each `group_size` component,
    /// where the workgroup dimension is spec-constant-sized.
    pub group_size_spec_ids: Option<[Option<u32>; 3]>,
    /// Input topologies this shader supports.
    pub topologies: TopologyMask,
    /// Whether the fragment stage declares early depth/stencil testing.
    pub fragment_early_depth: bool,
}
