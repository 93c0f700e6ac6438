//! The four-phase pipeline pack build: gather declarations, compile and
//! cache shaders, merge descriptor-set layouts to a fixpoint, then
//! assemble and assign stable UIDs.

use crate::error::PipelineError;
use crate::script::{ComputePipelineDecl, GraphicsPipelineDecl, MeshPipelineDecl, PipelineScript, StageDecl};
use crate::types::{
    ComputePipeline, DescriptorSetLayout, GraphicsPipeline, MeshPipeline, PipelineLayout, SpirvShader, Uid,
};
use ae_shader_compiler::types::{DescriptorBinding, ShaderDescription, ShaderReflection, ShaderStage, TopologyMask};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Everything the build produced: the deduplicated pack sections plus
/// every non-fatal error accumulated along the way.
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Deduplicated descriptor-set layouts, indexed by UID.
    pub descriptor_set_layouts: Vec<DescriptorSetLayout>,
    /// Deduplicated pipeline layouts, indexed by UID.
    pub pipeline_layouts: Vec<PipelineLayout>,
    /// Deduplicated compiled shaders, indexed by UID.
    pub spirv_shaders: Vec<SpirvShader>,
    /// Assembled graphics pipelines.
    pub graphics: Vec<GraphicsPipeline>,
    /// Assembled mesh pipelines.
    pub mesh: Vec<MeshPipeline>,
    /// Assembled compute pipelines.
    pub compute: Vec<ComputePipeline>,
    /// `(name, pipeline_uid)`, where the UID's section depends on which of
    /// `graphics`/`mesh`/`compute` it indexes — names are unique across
    /// all three; a repeat is reported as a duplicate-name error rather
    /// than silently shadowing the earlier pipeline.
    pub pipeline_names: Vec<(String, Uid)>,
    /// Every non-fatal error accumulated while building; the pipeline(s)
    /// it affected were skipped, not the whole pack.
    pub errors: Vec<PipelineError>,
}

struct ShaderData {
    spirv: Vec<u32>,
    reflection: ShaderReflection,
}

struct Caches {
    shaders: HashMap<ShaderDescription, ShaderData>,
}

fn stage_description(decl: &StageDecl, ir_version: u32) -> ShaderDescription {
    ShaderDescription::new(decl.file.clone(), decl.stage, ir_version, decl.defines.clone())
}

/// Resolve `decl.file` against each shader-search root in turn, joining it
/// onto `working_root` and rejecting any candidate whose canonical form
/// escapes that root (a `..` segment that climbs past it). A declaration
/// naming a file that escapes `working_root` under every search root it's
/// checked against is an `InvalidPath` error, not a shader-compile error; a
/// file that resolves safely but doesn't exist is still reported as
/// missing.
fn resolve_stage_source(working_root: &Path, shader_roots: &[PathBuf], decl: &StageDecl) -> Result<PathBuf, PipelineError> {
    let mut saw_safe_root = false;
    for root in shader_roots {
        let candidate = root.join(&decl.file);
        match ae_foundation::path_safety::resolve_sandboxed(working_root, &candidate) {
            Some(resolved) => {
                saw_safe_root = true;
                if resolved.is_file() {
                    return Ok(resolved);
                }
            }
            None => continue,
        }
    }
    if saw_safe_root {
        Err(PipelineError::ShaderCompile {
            shader: decl.file.clone(),
            message: "not found under any shader-search root".into(),
        })
    } else {
        Err(PipelineError::InvalidPath(decl.file.clone()))
    }
}

fn compile_and_cache(
    caches: &mut Caches,
    working_root: &Path,
    shader_roots: &[PathBuf],
    decl: &StageDecl,
    ir_version: u32,
) -> Result<(), PipelineError> {
    let description = stage_description(decl, ir_version);
    if caches.shaders.contains_key(&description) {
        return Ok(());
    }

    let source_path = resolve_stage_source(working_root, shader_roots, decl)?;
    let source = std::fs::read_to_string(&source_path).map_err(|e| PipelineError::ShaderCompile {
        shader: decl.file.clone(),
        message: e.to_string(),
    })?;

    let reflection = ae_shader_compiler::build_reflection(
        decl.stage,
        ir_version,
        &decl.entry,
        &source,
        &description.defines,
        shader_roots,
    )
    .map_err(|e| PipelineError::ShaderCompile { shader: decl.file.clone(), message: e.to_string() })?;
    let spirv = ae_shader_compiler::compile(
        decl.stage,
        ir_version,
        &decl.entry,
        &source,
        &description.defines,
        shader_roots,
    )
    .map_err(|e| PipelineError::ShaderCompile { shader: decl.file.clone(), message: e.to_string() })?;

    caches.shaders.insert(description, ShaderData { spirv, reflection });
    Ok(())
}

/// Run the full four-phase build over every script's declarations.
#[must_use]
pub fn build(scripts: &[PipelineScript], shader_roots: &[PathBuf], working_root: &Path) -> BuildOutput {
    let mut out = BuildOutput::default();
    let mut caches = Caches { shaders: HashMap::new() };

    // Phase 1: gather.
    let mut graphics_decls: Vec<&GraphicsPipelineDecl> = Vec::new();
    let mut mesh_decls: Vec<&MeshPipelineDecl> = Vec::new();
    let mut compute_decls: Vec<&ComputePipelineDecl> = Vec::new();
    for script in scripts {
        graphics_decls.extend(&script.graphics);
        mesh_decls.extend(&script.mesh);
        compute_decls.extend(&script.compute);
    }

    for decl in &graphics_decls {
        for stage in [Some(&decl.vertex), decl.tess_control.as_ref(), decl.tess_eval.as_ref(), decl.geometry.as_ref(), Some(&decl.fragment)]
            .into_iter()
            .flatten()
        {
            if let Err(e) = compile_and_cache(&mut caches, working_root, shader_roots, stage, decl.ir_version) {
                out.errors.push(e);
            }
        }
    }
    for decl in &mesh_decls {
        for stage in [decl.task.as_ref(), Some(&decl.mesh), Some(&decl.fragment)].into_iter().flatten() {
            if let Err(e) = compile_and_cache(&mut caches, working_root, shader_roots, stage, decl.ir_version) {
                out.errors.push(e);
            }
        }
    }
    for decl in &compute_decls {
        if let Err(e) = compile_and_cache(&mut caches, working_root, shader_roots, &decl.shader, decl.ir_version) {
            out.errors.push(e);
        }
    }

    // Phase 3: merge descriptor-set layouts to a fixpoint across every
    // stage of every successfully-compiled pipeline. The working
    // `mid-merge` record is keyed by (set index, binding name); stage
    // masks only grow and binding kinds never change, so this always
    // terminates.
    let mut global: BTreeMap<(u8, String), DescriptorBinding> = BTreeMap::new();

    loop {
        let mut merge_events = 0usize;
        for decl in &graphics_decls {
            merge_events += merge_pipeline_stages(
                &caches,
                &mut global,
                [Some(&decl.vertex), decl.tess_control.as_ref(), decl.tess_eval.as_ref(), decl.geometry.as_ref(), Some(&decl.fragment)]
                    .into_iter()
                    .flatten(),
                decl.ir_version,
                &mut out.errors,
            );
        }
        for decl in &mesh_decls {
            merge_events += merge_pipeline_stages(
                &caches,
                &mut global,
                [decl.task.as_ref(), Some(&decl.mesh), Some(&decl.fragment)].into_iter().flatten(),
                decl.ir_version,
                &mut out.errors,
            );
        }
        for decl in &compute_decls {
            merge_events += merge_pipeline_stages(
                &caches,
                &mut global,
                std::iter::once(&decl.shader),
                decl.ir_version,
                &mut out.errors,
            );
        }
        if merge_events == 0 {
            break;
        }
    }

    // Phase 4: assemble and serialize.
    let mut layout_uids: HashMap<String, Uid> = HashMap::new();
    let mut pipeline_layout_uids: HashMap<(Vec<(String, u8, Uid)>, Vec<(String, u32, u32)>), Uid> = HashMap::new();
    let mut shader_uids: HashMap<ShaderDescription, Uid> = HashMap::new();
    let mut seen_names: std::collections::HashSet<String> = std::collections::HashSet::new();

    for decl in &graphics_decls {
        let stages: Vec<(&StageDecl, ShaderStage)> = [
            Some((&decl.vertex, ShaderStage::Vertex)),
            decl.tess_control.as_ref().map(|s| (s, ShaderStage::TessControl)),
            decl.tess_eval.as_ref().map(|s| (s, ShaderStage::TessEval)),
            decl.geometry.as_ref().map(|s| (s, ShaderStage::Geometry)),
            Some((&decl.fragment, ShaderStage::Fragment)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !check_name(&decl.name, &mut seen_names, &mut out.errors) {
            continue;
        }
        let Some(stage_shaders) = assemble_stage_shaders(&caches, &stages, decl.ir_version, &mut shader_uids, &mut out.spirv_shaders, &mut out.errors, &decl.name) else {
            continue;
        };
        let Some(layout) = assemble_layout(&caches, &global, &stages, decl.ir_version, &mut layout_uids, &mut pipeline_layout_uids, &mut out.descriptor_set_layouts, &mut out.pipeline_layouts) else {
            continue;
        };

        let vertex_attributes = caches
            .shaders
            .get(&stage_description(&decl.vertex, decl.ir_version))
            .map(|d| d.reflection.vertex_attributes.clone())
            .unwrap_or_default();
        let fragment_outputs = caches
            .shaders
            .get(&stage_description(&decl.fragment, decl.ir_version))
            .map(|d| d.reflection.fragment_outputs.clone())
            .unwrap_or_default();
        let topology = stages
            .iter()
            .filter_map(|(s, _)| caches.shaders.get(&stage_description(s, decl.ir_version)))
            .fold(TopologyMask::all(), |acc, d| acc & d.reflection.topologies);
        let has_tess = decl.tess_control.is_some();

        let uid = out.graphics.len() as Uid;
        out.graphics.push(GraphicsPipeline {
            stage_shaders,
            layout,
            render_pass: 0,
            vertex_attributes,
            fragment_outputs,
            topology: if has_tess { TopologyMask::PATCH } else { topology },
        });
        out.pipeline_names.push((decl.name.clone(), uid));
    }

    for decl in &mesh_decls {
        let stages: Vec<(&StageDecl, ShaderStage)> = [
            decl.task.as_ref().map(|s| (s, ShaderStage::Task)),
            Some((&decl.mesh, ShaderStage::Mesh)),
            Some((&decl.fragment, ShaderStage::Fragment)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !check_name(&decl.name, &mut seen_names, &mut out.errors) {
            continue;
        }
        let Some(stage_shaders) = assemble_stage_shaders(&caches, &stages, decl.ir_version, &mut shader_uids, &mut out.spirv_shaders, &mut out.errors, &decl.name) else {
            continue;
        };
        let Some(layout) = assemble_layout(&caches, &global, &stages, decl.ir_version, &mut layout_uids, &mut pipeline_layout_uids, &mut out.descriptor_set_layouts, &mut out.pipeline_layouts) else {
            continue;
        };
        let fragment_outputs = caches
            .shaders
            .get(&stage_description(&decl.fragment, decl.ir_version))
            .map(|d| d.reflection.fragment_outputs.clone())
            .unwrap_or_default();

        let uid = out.mesh.len() as Uid;
        out.mesh.push(MeshPipeline { stage_shaders, layout, render_pass: 0, fragment_outputs });
        out.pipeline_names.push((decl.name.clone(), uid));
    }

    for decl in &compute_decls {
        let stages = [(&decl.shader, ShaderStage::Compute)];
        if !check_name(&decl.name, &mut seen_names, &mut out.errors) {
            continue;
        }
        let Some(mut stage_shaders) = assemble_stage_shaders(&caches, &stages, decl.ir_version, &mut shader_uids, &mut out.spirv_shaders, &mut out.errors, &decl.name) else {
            continue;
        };
        let Some(layout) = assemble_layout(&caches, &global, &stages, decl.ir_version, &mut layout_uids, &mut pipeline_layout_uids, &mut out.descriptor_set_layouts, &mut out.pipeline_layouts) else {
            continue;
        };
        let (_, shader_uid) = stage_shaders.remove(0);

        let uid = out.compute.len() as Uid;
        out.compute.push(ComputePipeline { shader: shader_uid, layout });
        out.pipeline_names.push((decl.name.clone(), uid));
    }

    out
}

fn check_name(name: &str, seen: &mut std::collections::HashSet<String>, errors: &mut Vec<PipelineError>) -> bool {
    if !seen.insert(name.to_string()) {
        errors.push(PipelineError::DuplicateName(name.to_string()));
        return false;
    }
    true
}

fn merge_pipeline_stages<'a>(
    caches: &Caches,
    global: &mut BTreeMap<(u8, String), DescriptorBinding>,
    stages: impl Iterator<Item = &'a StageDecl>,
    ir_version: u32,
    errors: &mut Vec<PipelineError>,
) -> usize {
    let mut events = 0;
    for stage in stages {
        let description = stage_description(stage, ir_version);
        let Some(data) = caches.shaders.get(&description) else { continue };
        for (set_idx, bindings) in data.reflection.sets.iter().enumerate() {
            for binding in bindings {
                let key = (set_idx as u8, binding.name.clone());
                match global.get_mut(&key) {
                    Some(existing) => {
                        if std::mem::discriminant(&existing.kind) != std::mem::discriminant(&binding.kind)
                            || existing.array_size != binding.array_size
                        {
                            errors.push(PipelineError::LayoutConflict(format!(
                                "binding '{}' in set {} has incompatible declarations across shaders",
                                binding.name, set_idx
                            )));
                            continue;
                        }
                        if !existing.stage_mask.contains(binding.stage_mask) {
                            existing.stage_mask |= binding.stage_mask;
                            events += 1;
                        }
                    }
                    None => {
                        global.insert(key, binding.clone());
                        events += 1;
                    }
                }
            }
        }
    }
    events
}

fn assemble_stage_shaders(
    caches: &Caches,
    stages: &[(&StageDecl, ShaderStage)],
    ir_version: u32,
    shader_uids: &mut HashMap<ShaderDescription, Uid>,
    spirv_shaders: &mut Vec<SpirvShader>,
    errors: &mut Vec<PipelineError>,
    pipeline_name: &str,
) -> Option<Vec<(ShaderStage, Uid)>> {
    let mut out = Vec::with_capacity(stages.len());
    for (decl, stage) in stages {
        let description = stage_description(decl, ir_version);
        let Some(data) = caches.shaders.get(&description) else {
            errors.push(PipelineError::ShaderCompile {
                shader: decl.file.clone(),
                message: format!("shader unavailable, skipping pipeline '{pipeline_name}'"),
            });
            return None;
        };
        let uid = *shader_uids.entry(description).or_insert_with(|| {
            let uid = spirv_shaders.len() as Uid;
            spirv_shaders.push(SpirvShader { words: data.spirv.clone() });
            uid
        });
        out.push((*stage, uid));
    }
    Some(out)
}

#[allow(clippy::too_many_arguments)]
fn assemble_layout(
    caches: &Caches,
    global: &BTreeMap<(u8, String), DescriptorBinding>,
    stages: &[(&StageDecl, ShaderStage)],
    ir_version: u32,
    layout_uids: &mut HashMap<Vec<DescriptorBinding>, Uid>,
    pipeline_layout_uids: &mut HashMap<(Vec<(String, u8, Uid)>, Vec<(String, u32, u32)>), Uid>,
    descriptor_set_layouts: &mut Vec<DescriptorSetLayout>,
    pipeline_layouts: &mut Vec<PipelineLayout>,
) -> Option<Uid> {
    let mut sets_used: [bool; ae_shader_compiler::types::MAX_SETS] = Default::default();
    let mut push_constants: BTreeMap<String, ae_shader_compiler::types::PushConstantRange> = BTreeMap::new();
    let mut set_names: BTreeMap<u8, String> = BTreeMap::new();

    for (decl, _) in stages {
        let description = stage_description(decl, ir_version);
        let Some(data) = caches.shaders.get(&description) else { continue };
        for (idx, bindings) in data.reflection.sets.iter().enumerate() {
            if !bindings.is_empty() {
                sets_used[idx] = true;
            }
        }
        for (name, range) in &data.reflection.push_constants {
            push_constants
                .entry(name.clone())
                .and_modify(|existing| existing.stage_mask |= range.stage_mask)
                .or_insert_with(|| range.clone());
        }
        for (&idx, name) in &data.reflection.set_names {
            set_names.entry(idx).or_insert_with(|| name.clone());
        }
    }

    let mut set_entries = Vec::new();
    for (idx, used) in sets_used.iter().enumerate() {
        if !*used {
            continue;
        }
        let mut bindings: Vec<DescriptorBinding> = global
            .range((idx as u8, String::new())..(idx as u8 + 1, String::new()))
            .map(|(_, v)| v.clone())
            .collect();
        bindings.sort_by(|a, b| a.name.cmp(&b.name));

        let layout_uid = *layout_uids.entry(bindings.clone()).or_insert_with(|| {
            let uid = descriptor_set_layouts.len() as Uid;
            descriptor_set_layouts.push(DescriptorSetLayout { bindings: bindings.clone() });
            uid
        });
        let name = set_names.get(&(idx as u8)).cloned().unwrap_or_else(|| format!("set{idx}"));
        set_entries.push((name, idx as u8, layout_uid));
    }

    let dedup_key = (
        set_entries.clone(),
        push_constants.iter().map(|(k, v)| (k.clone(), v.offset, v.size)).collect::<Vec<_>>(),
    );
    let uid = *pipeline_layout_uids.entry(dedup_key).or_insert_with(|| {
        let uid = pipeline_layouts.len() as Uid;
        pipeline_layouts.push(PipelineLayout { sets: set_entries, push_constants });
        uid
    });
    Some(uid)
}
