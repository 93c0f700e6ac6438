//! Command-line entry point for the build server.

use ae_build_server::{BuildServer, BuildServerConfig};
use ae_foundation::config::Config;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    ae_foundation::logging::init();

    let matches = Command::new("build_server")
        .about("Runs declarative build recipes against a sandboxed workspace")
        .arg(Arg::new("url").long("url").value_name("HOST:PORT").help("Address to bind").required(true))
        .arg(Arg::new("work-dir").long("work-dir").value_name("DIR").help("Per-build sandbox root, wiped on startup and shutdown").required(true))
        .arg(Arg::new("deploy-dir").long("deploy-dir").value_name("DIR").help("Root directory Deploy steps publish under").required(true))
        .arg(Arg::new("config").long("config").value_name("FILE").help("Optional .toml/.ron config overriding the built-in defaults"))
        .get_matches();

    let url = matches.get_one::<String>("url").unwrap().clone();
    let work_dir = PathBuf::from(matches.get_one::<String>("work-dir").unwrap());
    let deploy_dir = PathBuf::from(matches.get_one::<String>("deploy-dir").unwrap());

    let config = match matches.get_one::<String>("config") {
        Some(path) => match BuildServerConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("build_server: failed to load config {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => BuildServerConfig::default(),
    };

    let server = BuildServer::new(config, work_dir, deploy_dir);
    if let Err(e) = server.run(&url) {
        eprintln!("build_server: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
