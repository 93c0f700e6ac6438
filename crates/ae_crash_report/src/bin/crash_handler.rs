//! Thin stand-in for the in-process signal/exception handler that would
//! normally catch a fault and dump it. Composing a container from
//! already-captured files is all this build keeps in scope; the actual
//! fault interception happens upstream of this binary and isn't modeled
//! here.

use ae_crash_report::{write_container, CrashContainer};
use ae_stream::FileStream;
use clap::{Arg, Command};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    ae_foundation::logging::init();

    let matches = Command::new("crash_handler")
        .about("Composes a crash container from an already-captured minidump and log")
        .arg(Arg::new("user-info").long("user-info").value_name("TEXT").help("Free-form user/session context").required(true))
        .arg(Arg::new("symbols-id").long("symbols-id").value_name("NAME").help("Symbol file id for this build").required(true))
        .arg(Arg::new("minidump").long("minidump").value_name("FILE").help("Path to the captured minidump").required(true))
        .arg(Arg::new("log").long("log").value_name("FILE").help("Path to a log tail to attach, if any"))
        .arg(Arg::new("out").long("out").value_name("FILE").help("Where to write the composed container").required(true))
        .get_matches();

    let user_info = matches.get_one::<String>("user-info").unwrap().clone();
    let symbols_id = matches.get_one::<String>("symbols-id").unwrap().clone();
    let minidump_path = PathBuf::from(matches.get_one::<String>("minidump").unwrap());
    let log_path = matches.get_one::<String>("log").map(PathBuf::from);
    let out_path = PathBuf::from(matches.get_one::<String>("out").unwrap());

    let dump = match std::fs::read(&minidump_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("crash_handler: failed to read {}: {e}", minidump_path.display());
            return ExitCode::FAILURE;
        }
    };

    let log = match &log_path {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                info!("crash_handler: no log attached ({} unreadable: {e})", path.display());
                None
            }
        },
        None => None,
    };

    let container = CrashContainer { user_info, symbols_id, dump, log };

    let mut file = match FileStream::create_write(&out_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("crash_handler: failed to open {}: {e}", out_path.display());
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = write_container(&mut file, &container) {
        eprintln!("crash_handler: failed to write container: {e}");
        return ExitCode::FAILURE;
    }

    info!("crash_handler: composed container for {} at {}", minidump_path.display(), out_path.display());
    ExitCode::SUCCESS
}
