//! The process-execution contract every recipe step runs its external
//! command through: spawn, poll liveness at a fixed interval, kill on a
//! timeout or an external stop signal, and append the captured output to
//! the build's shared log under a single separator line.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run `program` with `args` in `dir`, draining stdout/stderr concurrently
/// so a chatty command can't deadlock on a full pipe, and appending a
/// `--- <command line> ---\n<output>` block to `log` once it settles.
///
/// Returns `true` only if the command exited with a zero status before
/// `timeout` elapsed and `looping` stayed set for the whole run.
pub fn execute(
    program: &str,
    args: &[String],
    dir: &Path,
    looping: &AtomicBool,
    timeout: Duration,
    log: &Mutex<String>,
) -> bool {
    let command_line = format!("{program} {}", args.join(" "));

    let mut child = match Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            append_log(log, &command_line, &format!("failed to spawn: {e}"));
            return false;
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_buf = Arc::new(Mutex::new(String::new()));
    let stderr_buf = Arc::new(Mutex::new(String::new()));
    let out_thread = stdout.map(|r| spawn_drain(r, Arc::clone(&stdout_buf)));
    let err_thread = stderr.map(|r| spawn_drain(r, Arc::clone(&stderr_buf)));

    let start = Instant::now();
    let success = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.success(),
            Ok(None) => {}
            Err(_) => break false,
        }
        if !looping.load(Ordering::Acquire) || start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            break false;
        }
        thread::sleep(POLL_INTERVAL);
    };

    if let Some(handle) = out_thread {
        let _ = handle.join();
    }
    if let Some(handle) = err_thread {
        let _ = handle.join();
    }

    let combined = format!(
        "{}{}",
        stdout_buf.lock().expect("stdout buffer poisoned"),
        stderr_buf.lock().expect("stderr buffer poisoned")
    );
    append_log(log, &command_line, &combined);
    success
}

fn spawn_drain<R: Read + Send + 'static>(reader: R, buf: Arc<Mutex<String>>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut lines = BufReader::new(reader);
        let mut line = String::new();
        loop {
            line.clear();
            match lines.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => buf.lock().expect("drain buffer poisoned").push_str(&line),
            }
        }
    })
}

fn append_log(log: &Mutex<String>, command_line: &str, output: &str) {
    let mut log = log.lock().expect("build log poisoned");
    log.push_str("\n--- ");
    log.push_str(command_line);
    log.push_str(" ---\n");
    log.push_str(output);
    log.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn captures_stdout_of_successful_command() {
        let looping = AtomicBool::new(true);
        let log = Mutex::new(String::new());
        let ok = execute("echo", &["hello".to_string()], Path::new("."), &looping, Duration::from_secs(5), &log);
        assert!(ok);
        assert!(log.lock().unwrap().contains("hello"));
    }

    #[test]
    fn nonzero_exit_is_failure() {
        let looping = AtomicBool::new(true);
        let log = Mutex::new(String::new());
        let ok = execute("false", &[], Path::new("."), &looping, Duration::from_secs(5), &log);
        assert!(!ok);
    }

    #[test]
    fn missing_program_is_failure_not_panic() {
        let looping = AtomicBool::new(true);
        let log = Mutex::new(String::new());
        let ok = execute("ae-build-server-nonexistent-binary", &[], Path::new("."), &looping, Duration::from_secs(5), &log);
        assert!(!ok);
    }
}
