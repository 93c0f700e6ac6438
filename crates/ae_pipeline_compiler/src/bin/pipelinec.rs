//! Command-line driver for the pipeline pack build: gathers `.pipeline` RON
//! scripts under a directory, compiles and merges their shaders, and
//! writes a versioned binary pack.

use ae_pipeline_compiler::{build, write_pack, PipelineScript};
use ae_stream::FileStream;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    ae_foundation::logging::init();

    let matches = Command::new("pipelinec")
        .about("Builds a versioned pipeline pack from declarative pipeline scripts")
        .arg(
            Arg::new("pipelines")
                .long("pipelines")
                .value_name("DIR")
                .help("Directory of .pipeline RON scripts")
                .required(true),
        )
        .arg(
            Arg::new("shaders")
                .long("shaders")
                .value_name("DIR")
                .help("Shader-search root; repeatable")
                .action(clap::ArgAction::Append)
                .required(true),
        )
        .arg(Arg::new("out").long("out").value_name("FILE").help("Output pack path").required(true))
        .get_matches();

    let pipelines_dir = PathBuf::from(matches.get_one::<String>("pipelines").unwrap());
    let shader_roots: Vec<PathBuf> = matches.get_many::<String>("shaders").unwrap().map(PathBuf::from).collect();
    let out_path = PathBuf::from(matches.get_one::<String>("out").unwrap());

    let scripts = match load_scripts(&pipelines_dir) {
        Ok(scripts) => scripts,
        Err(message) => {
            eprintln!("pipelinec: {message}");
            return ExitCode::FAILURE;
        }
    };

    let output = build(&scripts, &shader_roots, &pipelines_dir);

    for error in &output.errors {
        eprintln!("pipelinec: {error}");
    }

    let mut file = match FileStream::create_write(&out_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("pipelinec: failed to open {}: {e}", out_path.display());
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = write_pack(&mut file, &output) {
        eprintln!("pipelinec: failed to write pack: {e}");
        return ExitCode::FAILURE;
    }

    println!(
        "pipelinec: wrote {} graphics, {} mesh, {} compute pipelines ({} shaders, {} descriptor-set layouts) to {}",
        output.graphics.len(),
        output.mesh.len(),
        output.compute.len(),
        output.spirv_shaders.len(),
        output.descriptor_set_layouts.len(),
        out_path.display(),
    );

    if output.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn load_scripts(dir: &std::path::Path) -> Result<Vec<PipelineScript>, String> {
    let entries = std::fs::read_dir(dir).map_err(|e| format!("reading {}: {e}", dir.display()))?;
    let mut scripts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("reading {}: {e}", dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("pipeline") {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(|e| format!("reading {}: {e}", path.display()))?;
        let script: PipelineScript = ron::de::from_str(&text).map_err(|e| format!("parsing {}: {e}", path.display()))?;
        scripts.push(script);
    }
    Ok(scripts)
}
