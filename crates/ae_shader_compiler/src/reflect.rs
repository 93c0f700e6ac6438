//! SPIR-V reflection via `spirv_cross`, following the same
//! `Ast::parse`/`get_shader_resources`/`get_decoration` walk
//! `phobos-rs`'s `shader_reflection` module uses.

use crate::error::ShaderCompileError;
use crate::execution_modes;
use crate::types::{
    AccessState, DescriptorBinding, DescriptorKind, FragmentOutput, ImageDim, ImageType,
    PushConstantRange, ShaderReflection, ShaderStage, StageMask, TopologyMask, VertexAttribute,
};
use spirv_cross::spirv::{Ast, Decoration, Module, Type};

type GlslAst = Ast<spirv_cross::glsl::Target>;

fn image_type_from(ty: &Type) -> Result<ImageType, ShaderCompileError> {
    match ty {
        Type::Image { dim, arrayed, ms, depth, .. } | Type::SampledImage { dim, arrayed, ms, depth, .. } => {
            let dim = match dim {
                spirv_cross::spirv::Dim::Dim1D => ImageDim::D1,
                spirv_cross::spirv::Dim::Dim2D => ImageDim::D2,
                spirv_cross::spirv::Dim::Dim3D => ImageDim::D3,
                spirv_cross::spirv::Dim::DimCube => ImageDim::Cube,
                spirv_cross::spirv::Dim::DimBuffer => ImageDim::Buffer,
                other => {
                    return Err(ShaderCompileError::UnsupportedFeature(format!(
                        "unsupported image dimension: {other:?}"
                    )))
                }
            };
            Ok(ImageType { dim, arrayed: *arrayed, multisampled: *ms, shadow: *depth })
        }
        other => Err(ShaderCompileError::UnsupportedFeature(format!(
            "expected an image type, found {other:?}"
        ))),
    }
}

fn push_stage(out: &mut Vec<DescriptorBinding>, binding: DescriptorBinding) {
    out.push(binding);
}

/// Build a [`ShaderReflection`] from compiled SPIR-V, plus the raw source
/// (for the `//@` annotation pass, see [`crate::annotations`]).
pub fn build_reflection(
    stage: ShaderStage,
    spirv_words: &[u32],
    source_with_annotations: &str,
) -> Result<ShaderReflection, ShaderCompileError> {
    let module = Module::from_words(spirv_words);
    let mut ast: GlslAst =
        Ast::parse(&module).map_err(|e| ShaderCompileError::UnsupportedFeature(format!("{e:?}")))?;
    let resources = ast
        .get_shader_resources()
        .map_err(|e| ShaderCompileError::UnsupportedFeature(format!("{e:?}")))?;

    let stage_mask = StageMask::from(stage);
    let mut reflection = ShaderReflection::default();

    for ub in &resources.uniform_buffers {
        let set = ast.get_decoration(ub.id, Decoration::DescriptorSet).unwrap_or(0);
        let binding_idx = ast.get_decoration(ub.id, Decoration::Binding).unwrap_or(0);
        let size = ast.get_declared_struct_size(ub.type_id).unwrap_or(0);
        let name = ast.get_name(ub.id).unwrap_or_else(|_| ub.name.clone());
        if (set as usize) >= crate::types::MAX_SETS {
            continue;
        }
        let layout = execution_modes::struct_member_layout(spirv_words, ub.type_id);
        reject_nonzero_first_offset(&name, layout.first_member_offset)?;
        push_stage(
            &mut reflection.sets[set as usize],
            DescriptorBinding {
                name,
                binding: binding_idx,
                array_size: 1,
                stage_mask,
                kind: DescriptorKind::UniformBuffer {
                    static_size: size,
                    array_stride: 0,
                    dynamic_offset_index: None,
                },
            },
        );
    }

    for sb in &resources.storage_buffers {
        let set = ast.get_decoration(sb.id, Decoration::DescriptorSet).unwrap_or(0);
        let binding_idx = ast.get_decoration(sb.id, Decoration::Binding).unwrap_or(0);
        let size = ast.get_declared_struct_size(sb.type_id).unwrap_or(0);
        let name = ast.get_name(sb.id).unwrap_or_else(|_| sb.name.clone());
        if (set as usize) >= crate::types::MAX_SETS {
            continue;
        }
        let layout = execution_modes::struct_member_layout(spirv_words, sb.type_id);
        reject_nonzero_first_offset(&name, layout.first_member_offset)?;
        push_stage(
            &mut reflection.sets[set as usize],
            DescriptorBinding {
                name,
                binding: binding_idx,
                array_size: 1,
                stage_mask,
                kind: DescriptorKind::StorageBuffer {
                    static_size: size,
                    array_stride: layout.trailing_array_stride,
                    dynamic_offset_index: None,
                    access: AccessState::ReadWrite,
                },
            },
        );
    }

    for img in &resources.sampled_images {
        let set = ast.get_decoration(img.id, Decoration::DescriptorSet).unwrap_or(0);
        let binding_idx = ast.get_decoration(img.id, Decoration::Binding).unwrap_or(0);
        let name = ast.get_name(img.id).unwrap_or_else(|_| img.name.clone());
        let ty = ast
            .get_type(img.type_id)
            .map_err(|e| ShaderCompileError::UnsupportedFeature(format!("{e:?}")))?;
        if (set as usize) >= crate::types::MAX_SETS {
            continue;
        }
        push_stage(
            &mut reflection.sets[set as usize],
            DescriptorBinding {
                name,
                binding: binding_idx,
                array_size: 1,
                stage_mask,
                kind: DescriptorKind::CombinedImage(image_type_from(&ty)?),
            },
        );
    }

    for img in &resources.storage_images {
        let set = ast.get_decoration(img.id, Decoration::DescriptorSet).unwrap_or(0);
        let binding_idx = ast.get_decoration(img.id, Decoration::Binding).unwrap_or(0);
        let name = ast.get_name(img.id).unwrap_or_else(|_| img.name.clone());
        let ty = ast
            .get_type(img.type_id)
            .map_err(|e| ShaderCompileError::UnsupportedFeature(format!("{e:?}")))?;
        if (set as usize) >= crate::types::MAX_SETS {
            continue;
        }
        push_stage(
            &mut reflection.sets[set as usize],
            DescriptorBinding {
                name,
                binding: binding_idx,
                array_size: 1,
                stage_mask,
                kind: DescriptorKind::StorageImage(image_type_from(&ty)?, AccessState::ReadWrite),
            },
        );
    }

    for sub in &resources.subpass_inputs {
        let set = ast.get_decoration(sub.id, Decoration::DescriptorSet).unwrap_or(0);
        let binding_idx = ast.get_decoration(sub.id, Decoration::Binding).unwrap_or(0);
        let name = ast.get_name(sub.id).unwrap_or_else(|_| sub.name.clone());
        if (set as usize) >= crate::types::MAX_SETS {
            continue;
        }
        push_stage(
            &mut reflection.sets[set as usize],
            DescriptorBinding {
                name,
                binding: binding_idx,
                array_size: 1,
                stage_mask,
                kind: DescriptorKind::SubpassInput,
            },
        );
    }

    for pc in &resources.push_constant_buffers {
        let name = ast.get_name(pc.id).unwrap_or_else(|_| pc.name.clone());
        let size = ast.get_declared_struct_size(pc.type_id).unwrap_or(0);
        reflection
            .push_constants
            .insert(name, PushConstantRange { stage_mask, offset: 0, size });
    }

    if stage == ShaderStage::Vertex {
        for input in &resources.stage_inputs {
            let location = ast.get_decoration(input.id, Decoration::Location).unwrap_or(0);
            let name = ast.get_name(input.id).unwrap_or_else(|_| input.name.clone());
            let components = ast
                .get_type(input.type_id)
                .ok()
                .and_then(|ty| match ty {
                    Type::Float { vecsize, .. } | Type::Int { vecsize, .. } | Type::UInt { vecsize, .. } => {
                        Some(vecsize as u8)
                    }
                    _ => None,
                })
                .unwrap_or(1);
            reflection.vertex_attributes.push(VertexAttribute { name, location, components });
        }
    }

    if stage == ShaderStage::Fragment {
        for output in &resources.stage_outputs {
            let location = ast.get_decoration(output.id, Decoration::Location).unwrap_or(0);
            let name = ast.get_name(output.id).unwrap_or_else(|_| output.name.clone());
            reflection.fragment_outputs.push(FragmentOutput { name, location });
        }
    }

    if let Ok(constants) = ast.get_specialization_constants() {
        for c in constants {
            if let Ok(name) = ast.get_name(c.id) {
                reflection.spec_constants.insert(name, c.constant_id);
            }
        }
    }

    let modes = execution_modes::scan(spirv_words);
    reflection.fragment_early_depth = stage == ShaderStage::Fragment && modes.early_fragment_tests;
    if stage == ShaderStage::TessControl {
        reflection.tess_patch_size = modes.output_vertices;
    }
    if matches!(stage, ShaderStage::Compute | ShaderStage::Task | ShaderStage::Mesh) {
        reflection.group_size = modes.local_size;
        reflection.group_size_spec_ids = modes.local_size_spec_ids;
    }
    reflection.topologies = if stage == ShaderStage::Geometry {
        modes.geometry_input.unwrap_or_else(TopologyMask::classic)
    } else {
        TopologyMask::classic()
    };

    let annotations = crate::annotations::scan(source_with_annotations);
    apply_annotations(&mut reflection, &annotations);

    Ok(reflection)
}

/// The pack format assumes every block starts its data at the beginning
/// of the buffer it's bound to, so a block whose first member isn't at
/// offset zero (padding inserted ahead of it, or an odd base-alignment
/// quirk) can't be represented.
fn reject_nonzero_first_offset(block_name: &str, offset: Option<u32>) -> Result<(), ShaderCompileError> {
    match offset {
        Some(0) | None => Ok(()),
        Some(other) => Err(ShaderCompileError::UnsupportedFeature(format!(
            "block {block_name} has non-zero first-member offset {other}"
        ))),
    }
}

fn apply_annotations(reflection: &mut ShaderReflection, annotations: &crate::annotations::Annotations) {
    for (&index, name) in &annotations.set_names {
        reflection.set_names.insert(index, name.clone());
    }

    for set in &mut reflection.sets {
        for binding in set.iter_mut() {
            if annotations.dynamic_offset.contains(&binding.name) {
                match &mut binding.kind {
                    DescriptorKind::UniformBuffer { dynamic_offset_index, .. }
                    | DescriptorKind::StorageBuffer { dynamic_offset_index, .. } => {
                        *dynamic_offset_index = Some(binding.binding);
                    }
                    _ => log::warn!(
                        "dynamic-offset annotation on non-buffer binding {}",
                        binding.name
                    ),
                }
            }
            if annotations.discard.contains(&binding.name) {
                match &mut binding.kind {
                    DescriptorKind::StorageBuffer { access, .. }
                    | DescriptorKind::StorageTexelBuffer { access }
                    | DescriptorKind::StorageImage(_, access) => {
                        *access = AccessState::Discard;
                    }
                    _ => log::warn!("discard annotation on non-storage binding {}", binding.name),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Annotations;

    fn storage_binding(name: &str) -> DescriptorBinding {
        DescriptorBinding {
            name: name.into(),
            binding: 0,
            array_size: 1,
            stage_mask: StageMask::COMPUTE,
            kind: DescriptorKind::StorageBuffer {
                static_size: 16,
                array_stride: 0,
                dynamic_offset_index: None,
                access: AccessState::ReadWrite,
            },
        }
    }

    #[test]
    fn set_name_annotation_flows_into_reflection() {
        let mut reflection = ShaderReflection::default();
        let mut annotations = Annotations::default();
        annotations.set_names.insert(0, "global".to_string());
        apply_annotations(&mut reflection, &annotations);
        assert_eq!(reflection.set_names.get(&0), Some(&"global".to_string()));
    }

    #[test]
    fn discard_annotation_marks_storage_buffer_write_only() {
        let mut reflection = ShaderReflection::default();
        reflection.sets[0].push(storage_binding("particles"));
        let mut annotations = Annotations::default();
        annotations.discard.push("particles".to_string());
        apply_annotations(&mut reflection, &annotations);
        match &reflection.sets[0][0].kind {
            DescriptorKind::StorageBuffer { access, .. } => assert_eq!(*access, AccessState::Discard),
            other => panic!("expected a storage buffer, got {other:?}"),
        }
    }

    #[test]
    fn nonzero_first_member_offset_is_rejected() {
        assert!(reject_nonzero_first_offset("Globals", Some(8)).is_err());
        assert!(reject_nonzero_first_offset("Globals", Some(0)).is_ok());
        assert!(reject_nonzero_first_offset("Globals", None).is_ok());
    }
}
