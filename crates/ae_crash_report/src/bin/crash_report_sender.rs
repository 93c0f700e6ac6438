//! Uploads an already-composed crash container to a crash-report server
//! over a minimal raw HTTP/1.1 POST. The engine's general-purpose HTTP
//! client is out of scope here; this is a narrow, dependency-free
//! uploader mirroring the original sender's upload half.

use clap::{Arg, Command};
use log::info;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    ae_foundation::logging::init();

    let matches = Command::new("crash_report_sender")
        .about("Uploads a composed crash container to a crash-report server")
        .arg(Arg::new("container").long("container").value_name("FILE").help("Path to the composed container").required(true))
        .arg(Arg::new("host").long("host").value_name("HOST:PORT").help("Crash-report server address").required(true))
        .arg(Arg::new("path").long("path").value_name("PATH").help("Upload endpoint path").default_value("/upload"))
        .arg(Arg::new("remove-dump-file").long("remove-dump-file").value_name("FILE").help("Delete this file on a successful upload"))
        .arg(Arg::new("remove-log-file").long("remove-log-file").value_name("FILE").help("Delete this file on a successful upload"))
        .get_matches();

    let container_path = PathBuf::from(matches.get_one::<String>("container").unwrap());
    let host = matches.get_one::<String>("host").unwrap().clone();
    let path = matches.get_one::<String>("path").unwrap().clone();

    let body = match std::fs::read(&container_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("crash_report_sender: failed to read {}: {e}", container_path.display());
            return ExitCode::FAILURE;
        }
    };

    info!("Sending crash report to 'http://{host}{path}' ...");

    let status = match upload(&host, &path, &body) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("crash_report_sender: upload failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if status == 200 {
        info!("Done");
        if let Some(path) = matches.get_one::<String>("remove-dump-file") {
            let _ = std::fs::remove_file(path);
        }
        if let Some(path) = matches.get_one::<String>("remove-log-file") {
            let _ = std::fs::remove_file(path);
        }
        ExitCode::SUCCESS
    } else {
        eprintln!("crash_report_sender: server responded with status {status}");
        ExitCode::FAILURE
    }
}

fn upload(host: &str, path: &str, body: &[u8]) -> std::io::Result<u16> {
    let mut stream = TcpStream::connect(host)?;
    stream.set_read_timeout(Some(Duration::from_secs(30)))?;

    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {host}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(request.as_bytes())?;
    stream.write_all(body)?;
    stream.flush()?;

    let mut reader = BufReader::new(stream);
    let mut status_line = String::new();
    reader.read_line(&mut status_line)?;

    parse_status_code(&status_line)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("malformed status line: {status_line:?}")))
}

fn parse_status_code(status_line: &str) -> Option<u16> {
    status_line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::parse_status_code;

    #[test]
    fn parses_status_line() {
        assert_eq!(parse_status_code("HTTP/1.1 200 OK\r\n"), Some(200));
        assert_eq!(parse_status_code("HTTP/1.1 500 Internal Server Error\r\n"), Some(500));
        assert_eq!(parse_status_code("garbage"), None);
    }
}
