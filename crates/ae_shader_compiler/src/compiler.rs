//! Black-box GLSL-to-SPIR-V compilation, shelling out to `glslc` (falling
//! back to `glslangValidator`) the same way a `build.rs` locates and
//! invokes a shader compiler — generalized here from a build-time step
//! into a library function callable at pack-build time.

use crate::error::ShaderCompileError;
use crate::types::ShaderStage;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// `(vulkan_env, spirv_target)` pair for a given `spirv_version`, per the
/// mapping `{100->Vk1.0/Spv1.0, ..., 140->Vk1.1/Spv1.4, 150->Vk1.2/Spv1.5}`.
fn target_env(spirv_version: u32) -> Result<(&'static str, &'static str), ShaderCompileError> {
    match spirv_version {
        100 => Ok(("vulkan1.0", "spv1.0")),
        110 => Ok(("vulkan1.0", "spv1.1")),
        120 => Ok(("vulkan1.0", "spv1.2")),
        130 => Ok(("vulkan1.0", "spv1.3")),
        140 => Ok(("vulkan1.1", "spv1.4")),
        150 => Ok(("vulkan1.2", "spv1.5")),
        other => Err(ShaderCompileError::UnsupportedFeature(format!(
            "unrecognized spirv_version {other}"
        ))),
    }
}

/// Synthesize the prologue a compiled shader needs: a `#version` line,
/// the stage's required extensions, then each define as `#define NAME`.
#[must_use]
pub fn synthesize_prologue(stage: ShaderStage, defines: &[String]) -> String {
    let mut out = String::from("#version 460 core\n");
    for ext in stage.required_extensions() {
        out.push_str(&format!("#extension {ext} : require\n"));
    }
    for define in defines {
        out.push_str(&format!("#define {define}\n"));
    }
    out
}

fn find_compiler() -> Option<(&'static str, bool)> {
    for (name, is_glslc) in [("glslc", true), ("glslangValidator", false)] {
        if Command::new(name).arg("--version").output().is_ok() {
            return Some((name, is_glslc));
        }
    }
    None
}

/// Compile `source` (for `stage`, targeting `spirv_version`, with entry
/// point `entry`) to a SPIR-V word vector. `defines` are synthesized into
/// the prologue ahead of `source`.
///
/// `include_dirs` are passed through to the compiler's `-I` search path;
/// the compiler itself (`glslc`/`glslangValidator`) is an opaque external
/// dependency, not reimplemented here.
pub fn compile(
    stage: ShaderStage,
    spirv_version: u32,
    entry: &str,
    source: &str,
    defines: &[String],
    include_dirs: &[PathBuf],
) -> Result<Vec<u32>, ShaderCompileError> {
    let (vulkan_env, spirv_target) = target_env(spirv_version)?;
    let (compiler, is_glslc) = find_compiler().ok_or(ShaderCompileError::CompilerNotFound)?;

    let prologue = synthesize_prologue(stage, defines);
    let full_source = format!("{prologue}{source}");

    let work_dir = std::env::temp_dir().join(format!("ae_shader_compiler_{}", std::process::id()));
    std::fs::create_dir_all(&work_dir)?;
    let src_path = work_dir.join(format!("shader_{}.glsl", sanitized_temp_name()));
    let out_path = work_dir.join(format!("shader_{}.spv", sanitized_temp_name()));
    std::fs::File::create(&src_path)?.write_all(full_source.as_bytes())?;

    let mut cmd = Command::new(compiler);
    if is_glslc {
        cmd.arg(format!("-fshader-stage={}", stage.compiler_flag()))
            .arg(format!("--target-env={vulkan_env}"))
            .arg(format!("--target-spv={spirv_target}"))
            .arg(format!("-fentry-point={entry}"))
            .arg("-o")
            .arg(&out_path);
    } else {
        cmd.arg("-V")
            .arg("--target-env")
            .arg(vulkan_env)
            .arg("-S")
            .arg(glslang_stage_flag(stage))
            .arg("-e")
            .arg(entry)
            .arg("-o")
            .arg(&out_path);
    }
    for dir in include_dirs {
        cmd.arg("-I").arg(dir);
    }
    cmd.arg(&src_path);

    let output = cmd.output().map_err(|e| ShaderCompileError::SpawnFailed(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let reformatted = reformat_diagnostics(&format!("{stdout}\n{stderr}"), &full_source, prologue.lines().count());
        let _ = std::fs::remove_file(&src_path);
        return Err(ShaderCompileError::CompileFailed(reformatted));
    }

    let bytes = std::fs::read(&out_path)
        .map_err(|e| ShaderCompileError::OutputUnreadable(e.to_string()))?;
    let _ = std::fs::remove_file(&src_path);
    let _ = std::fs::remove_file(&out_path);

    if bytes.len() % 4 != 0 {
        return Err(ShaderCompileError::OutputUnreadable(
            "compiled SPIR-V is not a whole number of 32-bit words".into(),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn glslang_stage_flag(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vert",
        ShaderStage::TessControl => "tesc",
        ShaderStage::TessEval => "tese",
        ShaderStage::Geometry => "geom",
        ShaderStage::Fragment => "frag",
        ShaderStage::Compute => "comp",
        ShaderStage::Task => "task",
        ShaderStage::Mesh => "mesh",
        ShaderStage::RayGen => "rgen",
        ShaderStage::RayClosestHit => "rchit",
        ShaderStage::RayMiss => "rmiss",
    }
}

/// Reformat raw compiler diagnostics as `in source (N: L): "<line-text>"`
/// followed by the original message, correlating a `stdin:line` or
/// `shader_*.glsl:line` reference back to the offending source line.
/// `preamble_lines` lets a diagnostic pointing into the synthesized
/// prologue be distinguished from one pointing into user source.
#[must_use]
pub fn reformat_diagnostics(raw: &str, full_source: &str, preamble_lines: usize) -> String {
    let source_lines: Vec<&str> = full_source.lines().collect();
    let line_ref = regex::Regex::new(r":(\d+):").unwrap();
    let mut out = String::new();
    for diag in raw.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(caps) = line_ref.captures(diag) {
            if let Ok(line_no) = caps[1].parse::<usize>() {
                let text = source_lines.get(line_no.saturating_sub(1)).copied().unwrap_or("");
                let which = if line_no <= preamble_lines { "preamble" } else { "source" };
                out.push_str(&format!("in {which} ({line_no}): \"{}\"\n{diag}\n", text.trim()));
                continue;
            }
        }
        out.push_str(diag);
        out.push('\n');
    }
    out
}

fn sanitized_temp_name() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("{}_{}", std::process::id(), COUNTER.fetch_add(1, Ordering::Relaxed))
}
