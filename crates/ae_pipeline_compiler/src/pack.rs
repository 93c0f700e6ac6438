//! On-disk (de)serialization of a [`crate::build::BuildOutput`] into its
//! section sequence: a single-byte marker in front of every section,
//! `u32` lengths, little-endian integers throughout.

use crate::build::BuildOutput;
use crate::types::{ComputePipeline, DescriptorSetLayout, GraphicsPipeline, MeshPipeline, PipelineLayout, SectionMarker, SpirvShader, Uid, PACK_VERSION};
use ae_serialize::{Deserializer, SerError, Serializer};
use ae_shader_compiler::types::{
    AccessState, DescriptorBinding, DescriptorKind, FragmentOutput, ImageDim, ImageType, PushConstantRange,
    ShaderStage, StageMask, TopologyMask, VertexAttribute,
};
use ae_stream::{Readable, Writable};

fn expect_marker(de: &mut Deserializer, expected: SectionMarker) -> Result<(), SerError> {
    let found = de.read_u8()?;
    if found != expected as u8 {
        return Err(SerError::Malformed(format!(
            "expected section marker {} ({expected:?}), found {found}",
            expected as u8
        )));
    }
    Ok(())
}

fn image_dim_tag(dim: ImageDim) -> u8 {
    match dim {
        ImageDim::D1 => 0,
        ImageDim::D2 => 1,
        ImageDim::D3 => 2,
        ImageDim::Cube => 3,
        ImageDim::Buffer => 4,
    }
}

fn image_dim_from_tag(tag: u8) -> Result<ImageDim, SerError> {
    match tag {
        0 => Ok(ImageDim::D1),
        1 => Ok(ImageDim::D2),
        2 => Ok(ImageDim::D3),
        3 => Ok(ImageDim::Cube),
        4 => Ok(ImageDim::Buffer),
        other => Err(SerError::Malformed(format!("invalid image dim tag: {other}"))),
    }
}

fn write_image_type(ser: &mut Serializer, img: &ImageType) -> Result<(), SerError> {
    ser.write_u8(image_dim_tag(img.dim))?;
    ser.write_bool(img.arrayed)?;
    ser.write_bool(img.multisampled)?;
    ser.write_bool(img.shadow)
}

fn read_image_type(de: &mut Deserializer) -> Result<ImageType, SerError> {
    let dim = image_dim_from_tag(de.read_u8()?)?;
    let arrayed = de.read_bool()?;
    let multisampled = de.read_bool()?;
    let shadow = de.read_bool()?;
    Ok(ImageType { dim, arrayed, multisampled, shadow })
}

fn access_state_tag(access: AccessState) -> u8 {
    match access {
        AccessState::ReadWrite => 0,
        AccessState::Discard => 1,
    }
}

fn access_state_from_tag(tag: u8) -> Result<AccessState, SerError> {
    match tag {
        0 => Ok(AccessState::ReadWrite),
        1 => Ok(AccessState::Discard),
        other => Err(SerError::Malformed(format!("invalid access state tag: {other}"))),
    }
}

fn write_descriptor_kind(ser: &mut Serializer, kind: &DescriptorKind) -> Result<(), SerError> {
    match kind {
        DescriptorKind::UniformBuffer { static_size, array_stride, dynamic_offset_index } => {
            ser.write_u8(0)?;
            ser.write_u32(*static_size)?;
            ser.write_u32(*array_stride)?;
            ser.write_option(dynamic_offset_index, |s, v| s.write_u32(*v))
        }
        DescriptorKind::StorageBuffer { static_size, array_stride, dynamic_offset_index, access } => {
            ser.write_u8(1)?;
            ser.write_u32(*static_size)?;
            ser.write_u32(*array_stride)?;
            ser.write_option(dynamic_offset_index, |s, v| s.write_u32(*v))?;
            ser.write_u8(access_state_tag(*access))
        }
        DescriptorKind::UniformTexelBuffer => ser.write_u8(2),
        DescriptorKind::StorageTexelBuffer { access } => {
            ser.write_u8(3)?;
            ser.write_u8(access_state_tag(*access))
        }
        DescriptorKind::SampledImage(img) => {
            ser.write_u8(4)?;
            write_image_type(ser, img)
        }
        DescriptorKind::StorageImage(img, access) => {
            ser.write_u8(5)?;
            write_image_type(ser, img)?;
            ser.write_u8(access_state_tag(*access))
        }
        DescriptorKind::CombinedImage(img) => {
            ser.write_u8(6)?;
            write_image_type(ser, img)
        }
        DescriptorKind::CombinedImageImmutableSampler(img) => {
            ser.write_u8(7)?;
            write_image_type(ser, img)
        }
        DescriptorKind::Sampler => ser.write_u8(8),
        DescriptorKind::ImmutableSampler => ser.write_u8(9),
        DescriptorKind::SubpassInput => ser.write_u8(10),
        DescriptorKind::AccelerationStructure => ser.write_u8(11),
    }
}

fn read_descriptor_kind(de: &mut Deserializer) -> Result<DescriptorKind, SerError> {
    Ok(match de.read_u8()? {
        0 => DescriptorKind::UniformBuffer {
            static_size: de.read_u32()?,
            array_stride: de.read_u32()?,
            dynamic_offset_index: de.read_option(Deserializer::read_u32)?,
        },
        1 => DescriptorKind::StorageBuffer {
            static_size: de.read_u32()?,
            array_stride: de.read_u32()?,
            dynamic_offset_index: de.read_option(Deserializer::read_u32)?,
            access: access_state_from_tag(de.read_u8()?)?,
        },
        2 => DescriptorKind::UniformTexelBuffer,
        3 => DescriptorKind::StorageTexelBuffer { access: access_state_from_tag(de.read_u8()?)? },
        4 => DescriptorKind::SampledImage(read_image_type(de)?),
        5 => DescriptorKind::StorageImage(read_image_type(de)?, access_state_from_tag(de.read_u8()?)?),
        6 => DescriptorKind::CombinedImage(read_image_type(de)?),
        7 => DescriptorKind::CombinedImageImmutableSampler(read_image_type(de)?),
        8 => DescriptorKind::Sampler,
        9 => DescriptorKind::ImmutableSampler,
        10 => DescriptorKind::SubpassInput,
        11 => DescriptorKind::AccelerationStructure,
        other => return Err(SerError::Malformed(format!("invalid descriptor kind tag: {other}"))),
    })
}

fn write_descriptor_binding(ser: &mut Serializer, binding: &DescriptorBinding) -> Result<(), SerError> {
    ser.write_string(&binding.name)?;
    ser.write_u32(binding.binding)?;
    ser.write_u32(binding.array_size)?;
    ser.write_u16(binding.stage_mask.bits())?;
    write_descriptor_kind(ser, &binding.kind)
}

fn read_descriptor_binding(de: &mut Deserializer) -> Result<DescriptorBinding, SerError> {
    let name = de.read_string()?;
    let binding = de.read_u32()?;
    let array_size = de.read_u32()?;
    let stage_mask = StageMask::from_bits_truncate(de.read_u16()?);
    let kind = read_descriptor_kind(de)?;
    Ok(DescriptorBinding { name, binding, array_size, stage_mask, kind })
}

fn write_descriptor_set_layout(ser: &mut Serializer, layout: &DescriptorSetLayout) -> Result<(), SerError> {
    ser.write_seq(&layout.bindings, write_descriptor_binding)
}

fn read_descriptor_set_layout(de: &mut Deserializer) -> Result<DescriptorSetLayout, SerError> {
    Ok(DescriptorSetLayout { bindings: de.read_seq(read_descriptor_binding)? })
}

fn write_push_constant_range(ser: &mut Serializer, range: &PushConstantRange) -> Result<(), SerError> {
    ser.write_u16(range.stage_mask.bits())?;
    ser.write_u32(range.offset)?;
    ser.write_u32(range.size)
}

fn read_push_constant_range(de: &mut Deserializer) -> Result<PushConstantRange, SerError> {
    let stage_mask = StageMask::from_bits_truncate(de.read_u16()?);
    let offset = de.read_u32()?;
    let size = de.read_u32()?;
    Ok(PushConstantRange { stage_mask, offset, size })
}

fn write_pipeline_layout(ser: &mut Serializer, layout: &PipelineLayout) -> Result<(), SerError> {
    ser.write_seq(&layout.sets, |s, (name, idx, uid)| {
        s.write_string(name)?;
        s.write_u8(*idx)?;
        s.write_u32(*uid)
    })?;
    ser.write_sorted_map(&layout.push_constants, |s, k| s.write_string(k), write_push_constant_range)
}

fn read_pipeline_layout(de: &mut Deserializer) -> Result<PipelineLayout, SerError> {
    let sets = de.read_seq(|d| {
        let name = d.read_string()?;
        let idx = d.read_u8()?;
        let uid = d.read_u32()?;
        Ok((name, idx, uid))
    })?;
    let push_constants = de.read_sorted_map(Deserializer::read_string, read_push_constant_range)?;
    Ok(PipelineLayout { sets, push_constants })
}

fn write_spirv_shader(ser: &mut Serializer, shader: &SpirvShader) -> Result<(), SerError> {
    ser.write_seq(&shader.words, |s, w| s.write_u32(*w))
}

fn read_spirv_shader(de: &mut Deserializer) -> Result<SpirvShader, SerError> {
    Ok(SpirvShader { words: de.read_seq(Deserializer::read_u32)? })
}

fn shader_stage_tag(stage: ShaderStage) -> u8 {
    match stage {
        ShaderStage::Vertex => 0,
        ShaderStage::TessControl => 1,
        ShaderStage::TessEval => 2,
        ShaderStage::Geometry => 3,
        ShaderStage::Fragment => 4,
        ShaderStage::Compute => 5,
        ShaderStage::Task => 6,
        ShaderStage::Mesh => 7,
        ShaderStage::RayGen => 8,
        ShaderStage::RayClosestHit => 9,
        ShaderStage::RayMiss => 10,
    }
}

fn shader_stage_from_tag(tag: u8) -> Result<ShaderStage, SerError> {
    match tag {
        0 => Ok(ShaderStage::Vertex),
        1 => Ok(ShaderStage::TessControl),
        2 => Ok(ShaderStage::TessEval),
        3 => Ok(ShaderStage::Geometry),
        4 => Ok(ShaderStage::Fragment),
        5 => Ok(ShaderStage::Compute),
        6 => Ok(ShaderStage::Task),
        7 => Ok(ShaderStage::Mesh),
        8 => Ok(ShaderStage::RayGen),
        9 => Ok(ShaderStage::RayClosestHit),
        10 => Ok(ShaderStage::RayMiss),
        other => Err(SerError::Malformed(format!("invalid shader stage tag: {other}"))),
    }
}

fn write_stage_shaders(ser: &mut Serializer, stages: &[(ShaderStage, Uid)]) -> Result<(), SerError> {
    ser.write_seq(stages, |s, (stage, uid)| {
        s.write_u8(shader_stage_tag(*stage))?;
        s.write_u32(*uid)
    })
}

fn read_stage_shaders(de: &mut Deserializer) -> Result<Vec<(ShaderStage, Uid)>, SerError> {
    de.read_seq(|d| {
        let stage = shader_stage_from_tag(d.read_u8()?)?;
        let uid = d.read_u32()?;
        Ok((stage, uid))
    })
}

fn write_vertex_attribute(ser: &mut Serializer, attr: &VertexAttribute) -> Result<(), SerError> {
    ser.write_string(&attr.name)?;
    ser.write_u32(attr.location)?;
    ser.write_u8(attr.components)
}

fn read_vertex_attribute(de: &mut Deserializer) -> Result<VertexAttribute, SerError> {
    let name = de.read_string()?;
    let location = de.read_u32()?;
    let components = de.read_u8()?;
    Ok(VertexAttribute { name, location, components })
}

fn write_fragment_output(ser: &mut Serializer, out: &FragmentOutput) -> Result<(), SerError> {
    ser.write_string(&out.name)?;
    ser.write_u32(out.location)
}

fn read_fragment_output(de: &mut Deserializer) -> Result<FragmentOutput, SerError> {
    let name = de.read_string()?;
    let location = de.read_u32()?;
    Ok(FragmentOutput { name, location })
}

fn write_graphics_pipeline(ser: &mut Serializer, p: &GraphicsPipeline) -> Result<(), SerError> {
    write_stage_shaders(ser, &p.stage_shaders)?;
    ser.write_u32(p.layout)?;
    ser.write_u32(p.render_pass)?;
    ser.write_seq(&p.vertex_attributes, write_vertex_attribute)?;
    ser.write_seq(&p.fragment_outputs, write_fragment_output)?;
    ser.write_u8(p.topology.bits())
}

fn read_graphics_pipeline(de: &mut Deserializer) -> Result<GraphicsPipeline, SerError> {
    let stage_shaders = read_stage_shaders(de)?;
    let layout = de.read_u32()?;
    let render_pass = de.read_u32()?;
    let vertex_attributes = de.read_seq(read_vertex_attribute)?;
    let fragment_outputs = de.read_seq(read_fragment_output)?;
    let topology = TopologyMask::from_bits_truncate(de.read_u8()?);
    Ok(GraphicsPipeline { stage_shaders, layout, render_pass, vertex_attributes, fragment_outputs, topology })
}

fn write_mesh_pipeline(ser: &mut Serializer, p: &MeshPipeline) -> Result<(), SerError> {
    write_stage_shaders(ser, &p.stage_shaders)?;
    ser.write_u32(p.layout)?;
    ser.write_u32(p.render_pass)?;
    ser.write_seq(&p.fragment_outputs, write_fragment_output)
}

fn read_mesh_pipeline(de: &mut Deserializer) -> Result<MeshPipeline, SerError> {
    let stage_shaders = read_stage_shaders(de)?;
    let layout = de.read_u32()?;
    let render_pass = de.read_u32()?;
    let fragment_outputs = de.read_seq(read_fragment_output)?;
    Ok(MeshPipeline { stage_shaders, layout, render_pass, fragment_outputs })
}

fn write_compute_pipeline(ser: &mut Serializer, p: &ComputePipeline) -> Result<(), SerError> {
    ser.write_u32(p.shader)?;
    ser.write_u32(p.layout)
}

fn read_compute_pipeline(de: &mut Deserializer) -> Result<ComputePipeline, SerError> {
    let shader = de.read_u32()?;
    let layout = de.read_u32()?;
    Ok(ComputePipeline { shader, layout })
}

/// Write every section of `build` to `out`, in the exact marker order a
/// reader expects. `RenderPasses`/`RenderPassNames`/
/// `RayTracingPipelines` are always empty in this cut (render passes and
/// ray-tracing pipelines are out of scope), but their markers and
/// zero-length sections are still emitted so a reader sees the full
/// sequence.
pub fn write_pack(out: &mut dyn Writable, build: &BuildOutput) -> Result<(), SerError> {
    let mut ser = Serializer::new(out);

    ser.write_u8(SectionMarker::Version as u8)?;
    ser.write_u32(PACK_VERSION)?;

    ser.write_u8(SectionMarker::DescriptorSetLayouts as u8)?;
    ser.write_seq(&build.descriptor_set_layouts, write_descriptor_set_layout)?;

    ser.write_u8(SectionMarker::PipelineLayouts as u8)?;
    ser.write_seq(&build.pipeline_layouts, write_pipeline_layout)?;

    ser.write_u8(SectionMarker::RenderPasses as u8)?;
    ser.write_u32(0)?;

    ser.write_u8(SectionMarker::RenderPassNames as u8)?;
    ser.write_u32(0)?;

    ser.write_u8(SectionMarker::SpirvShaders as u8)?;
    ser.write_seq(&build.spirv_shaders, write_spirv_shader)?;

    ser.write_u8(SectionMarker::GraphicsPipelines as u8)?;
    ser.write_seq(&build.graphics, write_graphics_pipeline)?;

    ser.write_u8(SectionMarker::MeshPipelines as u8)?;
    ser.write_seq(&build.mesh, write_mesh_pipeline)?;

    ser.write_u8(SectionMarker::ComputePipelines as u8)?;
    ser.write_seq(&build.compute, write_compute_pipeline)?;

    ser.write_u8(SectionMarker::RayTracingPipelines as u8)?;
    ser.write_u32(0)?;

    ser.write_u8(SectionMarker::PipelineNames as u8)?;
    ser.write_seq(&build.pipeline_names, |s, (name, uid)| {
        s.write_string(name)?;
        s.write_u32(*uid)
    })
}

/// The deserialized contents of a pipeline pack: every section but the
/// per-pipeline build errors, which are never persisted on disk.
#[derive(Debug, Default)]
pub struct PipelinePack {
    /// See [`BuildOutput::descriptor_set_layouts`].
    pub descriptor_set_layouts: Vec<DescriptorSetLayout>,
    /// See [`BuildOutput::pipeline_layouts`].
    pub pipeline_layouts: Vec<PipelineLayout>,
    /// See [`BuildOutput::spirv_shaders`].
    pub spirv_shaders: Vec<SpirvShader>,
    /// See [`BuildOutput::graphics`].
    pub graphics: Vec<GraphicsPipeline>,
    /// See [`BuildOutput::mesh`].
    pub mesh: Vec<MeshPipeline>,
    /// See [`BuildOutput::compute`].
    pub compute: Vec<ComputePipeline>,
    /// See [`BuildOutput::pipeline_names`].
    pub pipeline_names: Vec<(String, Uid)>,
}

/// Read a pack written by [`write_pack`], rejecting any marker out of
/// sequence or a version other than [`PACK_VERSION`] as a hard
/// `Malformed`/`VersionMismatch` stop rather than a recoverable error.
pub fn read_pack(src: &mut dyn Readable) -> Result<PipelinePack, SerError> {
    let mut de = Deserializer::new(src);
    let mut pack = PipelinePack::default();

    expect_marker(&mut de, SectionMarker::Version)?;
    let version = de.read_u32()?;
    if version != PACK_VERSION {
        return Err(SerError::VersionMismatch { expected: PACK_VERSION, found: version });
    }

    expect_marker(&mut de, SectionMarker::DescriptorSetLayouts)?;
    pack.descriptor_set_layouts = de.read_seq(read_descriptor_set_layout)?;

    expect_marker(&mut de, SectionMarker::PipelineLayouts)?;
    pack.pipeline_layouts = de.read_seq(read_pipeline_layout)?;

    expect_marker(&mut de, SectionMarker::RenderPasses)?;
    let _render_passes = de.read_u32()?;

    expect_marker(&mut de, SectionMarker::RenderPassNames)?;
    let _render_pass_names = de.read_u32()?;

    expect_marker(&mut de, SectionMarker::SpirvShaders)?;
    pack.spirv_shaders = de.read_seq(read_spirv_shader)?;

    expect_marker(&mut de, SectionMarker::GraphicsPipelines)?;
    pack.graphics = de.read_seq(read_graphics_pipeline)?;

    expect_marker(&mut de, SectionMarker::MeshPipelines)?;
    pack.mesh = de.read_seq(read_mesh_pipeline)?;

    expect_marker(&mut de, SectionMarker::ComputePipelines)?;
    pack.compute = de.read_seq(read_compute_pipeline)?;

    expect_marker(&mut de, SectionMarker::RayTracingPipelines)?;
    let _ray_tracing = de.read_u32()?;

    expect_marker(&mut de, SectionMarker::PipelineNames)?;
    pack.pipeline_names = de.read_seq(|d| {
        let name = d.read_string()?;
        let uid = d.read_u32()?;
        Ok((name, uid))
    })?;

    Ok(pack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_stream::{MemReader, MemWriter};

    fn sample_build() -> BuildOutput {
        let mut build = BuildOutput::default();
        build.descriptor_set_layouts.push(DescriptorSetLayout {
            bindings: vec![DescriptorBinding {
                name: "uCamera".into(),
                binding: 0,
                array_size: 1,
                stage_mask: StageMask::VERTEX,
                kind: DescriptorKind::UniformBuffer { static_size: 64, array_stride: 0, dynamic_offset_index: None },
            }],
        });
        build.pipeline_layouts.push(PipelineLayout {
            sets: vec![("set0".into(), 0, 0)],
            push_constants: Default::default(),
        });
        build.spirv_shaders.push(SpirvShader { words: vec![0x0723_0203, 1, 2, 3] });
        build.graphics.push(GraphicsPipeline {
            stage_shaders: vec![(ShaderStage::Vertex, 0), (ShaderStage::Fragment, 0)],
            layout: 0,
            render_pass: 0,
            vertex_attributes: vec![VertexAttribute { name: "inPos".into(), location: 0, components: 3 }],
            fragment_outputs: vec![FragmentOutput { name: "outColor".into(), location: 0 }],
            topology: TopologyMask::TRIANGLE_LIST,
        });
        build.pipeline_names.push(("main_pass".into(), 0));
        build
    }

    #[test]
    fn pack_round_trips() {
        let build = sample_build();
        let mut writer = MemWriter::new();
        write_pack(&mut writer, &build).unwrap();

        let mut reader = MemReader::from_bytes(writer.into_bytes());
        let pack = read_pack(&mut reader).unwrap();

        assert_eq!(pack.descriptor_set_layouts, build.descriptor_set_layouts);
        assert_eq!(pack.pipeline_layouts, build.pipeline_layouts);
        assert_eq!(pack.spirv_shaders, build.spirv_shaders);
        assert_eq!(pack.graphics, build.graphics);
        assert_eq!(pack.pipeline_names, build.pipeline_names);
    }

    #[test]
    fn storage_kinds_round_trip_their_access_state() {
        let kinds = [
            DescriptorKind::StorageBuffer {
                static_size: 16,
                array_stride: 4,
                dynamic_offset_index: Some(0),
                access: AccessState::Discard,
            },
            DescriptorKind::StorageTexelBuffer { access: AccessState::ReadWrite },
            DescriptorKind::StorageImage(
                ImageType { dim: ImageDim::D2, arrayed: false, multisampled: false, shadow: false },
                AccessState::Discard,
            ),
        ];
        for kind in kinds {
            let mut writer = MemWriter::new();
            let mut ser = Serializer::new(&mut writer);
            write_descriptor_kind(&mut ser, &kind).unwrap();

            let mut reader = MemReader::from_bytes(writer.into_bytes());
            let mut de = Deserializer::new(&mut reader);
            assert_eq!(read_descriptor_kind(&mut de).unwrap(), kind);
        }
    }

    #[test]
    fn rejects_future_version() {
        let mut writer = MemWriter::new();
        writer.write(&[SectionMarker::Version as u8]).unwrap();
        Serializer::new(&mut writer).write_u32(PACK_VERSION + 1).unwrap();

        let mut reader = MemReader::from_bytes(writer.into_bytes());
        let err = read_pack(&mut reader).unwrap_err();
        assert!(matches!(err, SerError::VersionMismatch { .. }));
    }
}
