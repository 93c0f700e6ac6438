//! Command-line driver for the sampler pack build: gathers `.samp` RON
//! scripts under a directory, validates and deduplicates their samplers,
//! and writes a versioned binary pack.

use ae_sampler_packer::{build, write_pack, SamplerScript};
use ae_stream::FileStream;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    ae_foundation::logging::init();

    let matches = Command::new("samplerc")
        .about("Builds a versioned sampler pack from declarative sampler scripts")
        .arg(
            Arg::new("samplers")
                .long("samplers")
                .value_name("DIR")
                .help("Directory of .samp RON scripts")
                .required(true),
        )
        .arg(Arg::new("out").long("out").value_name("FILE").help("Output pack path").required(true))
        .get_matches();

    let samplers_dir = PathBuf::from(matches.get_one::<String>("samplers").unwrap());
    let out_path = PathBuf::from(matches.get_one::<String>("out").unwrap());

    let scripts = match load_scripts(&samplers_dir) {
        Ok(scripts) => scripts,
        Err(message) => {
            eprintln!("samplerc: {message}");
            return ExitCode::FAILURE;
        }
    };

    let output = build(&scripts);

    let mut file = match FileStream::create_write(&out_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("samplerc: failed to open {}: {e}", out_path.display());
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = write_pack(&mut file, &output) {
        eprintln!("samplerc: failed to write pack: {e}");
        return ExitCode::FAILURE;
    }

    println!(
        "samplerc: wrote {} samplers ({} declarations) to {}",
        output.samplers.len(),
        output.names.len(),
        out_path.display(),
    );

    ExitCode::SUCCESS
}

fn load_scripts(dir: &std::path::Path) -> Result<Vec<SamplerScript>, String> {
    let entries = std::fs::read_dir(dir).map_err(|e| format!("reading {}: {e}", dir.display()))?;
    let mut scripts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("reading {}: {e}", dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("samp") {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(|e| format!("reading {}: {e}", path.display()))?;
        let script: SamplerScript = ron::de::from_str(&text).map_err(|e| format!("parsing {}: {e}", path.display()))?;
        scripts.push(script);
    }
    Ok(scripts)
}
