//! Minimal HTTP server that persists every uploaded crash container body
//! to disk, keyed by the uploading client's endpoint, the way the
//! original mongoose-based server did.

use clap::{Arg, Command};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};
use tiny_http::{Method, Response, Server, StatusCode};

fn main() -> ExitCode {
    ae_foundation::logging::init();

    let matches = Command::new("crash_report_server")
        .about("Accepts and persists uploaded crash containers")
        .arg(Arg::new("url").long("url").value_name("HOST:PORT").help("Address to bind").required(true))
        .arg(Arg::new("storage").long("storage").value_name("DIR").help("Directory uploads are persisted under").required(true))
        .get_matches();

    let url = matches.get_one::<String>("url").unwrap().clone();
    let storage = PathBuf::from(matches.get_one::<String>("storage").unwrap());

    if let Err(e) = std::fs::create_dir_all(&storage) {
        eprintln!("crash_report_server: failed to create {}: {e}", storage.display());
        return ExitCode::FAILURE;
    }

    let server = match Server::http(&url) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("crash_report_server: failed to bind {url}: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("crash_report_server started: '{url}'");

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url_path = request.url().to_string();

        if method == Method::Put && url_path == "/stop" {
            let _ = request.respond(Response::from_string("").with_status_code(StatusCode(200)));
            break;
        }

        if method != Method::Post || url_path != "/upload" {
            let _ = request.respond(Response::from_string("").with_status_code(StatusCode(404)));
            continue;
        }

        let client_dir = sanitize_endpoint(&request.remote_addr().map_or_else(|| "unknown".to_string(), |addr| addr.to_string()));
        let mut body = Vec::new();
        if std::io::Read::read_to_end(request.as_reader(), &mut body).is_err() {
            let _ = request.respond(Response::from_string("failed to read body").with_status_code(StatusCode(500)));
            continue;
        }

        match persist_upload(&storage, &client_dir, &body) {
            Ok(path) => {
                info!("crash_report_server: stored upload at {}", path.display());
                let _ = request.respond(Response::from_string("").with_status_code(StatusCode(200)));
            }
            Err(e) => {
                eprintln!("crash_report_server: failed to persist upload: {e}");
                let _ = request.respond(Response::from_string("").with_status_code(StatusCode(500)));
            }
        }
    }

    info!("crash_report_server stopped");
    ExitCode::SUCCESS
}

fn sanitize_endpoint(addr: &str) -> String {
    addr.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

fn persist_upload(storage: &Path, client_dir: &str, body: &[u8]) -> std::io::Result<PathBuf> {
    let dir = storage.join(client_dir);
    std::fs::create_dir_all(&dir)?;
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    let path = dir.join(format!("{timestamp}.dmp"));
    std::fs::write(&path, body)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::sanitize_endpoint;

    #[test]
    fn sanitizes_non_alphanumeric_characters() {
        assert_eq!(sanitize_endpoint("127.0.0.1:8080"), "127_0_0_1_8080");
    }
}
