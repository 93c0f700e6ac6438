//! The HTTP event loop: accepts a recipe on `PUT /build`, runs it on a
//! scheduler worker, streams its log back through `GET
//! /build_status/<id>`, and tears everything down on `PUT /stop`.

use crate::api::BuildScriptApi;
use crate::config::BuildServerConfig;
use crate::recipe::{self, BuildStep};
use crate::types::BuildId;
use ae_scheduler::{Scheduler, ThreadClass, ThreadClassMask};
use log::{error, info, warn};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tiny_http::{Method, Request, Response, Server, StatusCode};

struct BuildHandle {
    api: Arc<BuildScriptApi>,
    running: AtomicBool,
    end_time: Mutex<Option<Instant>>,
}

/// Owns the server's active-build table and its scheduler, and drives
/// the accept/reap loop.
pub struct BuildServer {
    config: BuildServerConfig,
    work_dir: PathBuf,
    deploy_dir: PathBuf,
    scheduler: Scheduler,
    active: Mutex<HashMap<BuildId, Arc<BuildHandle>>>,
}

impl BuildServer {
    /// Create a server rooted at `work_dir` (wiped and recreated on
    /// every [`BuildServer::run`]) with deploys landing under
    /// `deploy_dir`.
    #[must_use]
    pub fn new(config: BuildServerConfig, work_dir: PathBuf, deploy_dir: PathBuf) -> Self {
        Self { config, work_dir, deploy_dir, scheduler: Scheduler::new(), active: Mutex::new(HashMap::new()) }
    }

    /// Bind `addr` and run until a client sends `PUT /stop`.
    pub fn run(&self, addr: &str) -> std::io::Result<()> {
        if self.work_dir.exists() {
            std::fs::remove_dir_all(&self.work_dir)?;
        }
        std::fs::create_dir_all(&self.work_dir)?;

        self.scheduler.spawn_threads(self.config.worker_threads, ThreadClassMask::WORKER);

        let server = Server::http(addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("failed to bind {addr}: {e}")))?;
        info!("build server listening on {addr}");

        let mut last_reap = Instant::now();
        loop {
            match server.recv_timeout(Duration::from_millis(100)) {
                Ok(Some(request)) => {
                    if self.dispatch(request) {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => error!("build server: accept failed: {e}"),
            }
            if last_reap.elapsed() >= Duration::from_secs(self.config.reap_interval_secs) {
                self.reap();
                last_reap = Instant::now();
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Handle one request. Returns `true` if the server should stop
    /// accepting further requests.
    fn dispatch(&self, mut request: Request) -> bool {
        let method = request.method().clone();
        let url = request.url().to_string();

        if method == Method::Put && url == "/stop" {
            info!("build server: stop requested");
            let _ = request.respond(Response::from_string("").with_status_code(StatusCode(200)));
            return true;
        }

        if method == Method::Put && url == "/build" {
            let mut body = String::new();
            if request.as_reader().read_to_string(&mut body).is_err() {
                let _ = request.respond(Response::from_string("failed to read body").with_status_code(StatusCode(400)));
                return false;
            }
            let (status, response_body) = self.handle_build(&body);
            let _ = request.respond(Response::from_string(response_body).with_status_code(StatusCode(status)));
            return false;
        }

        if method == Method::Get {
            if let Some(hex_id) = url.strip_prefix("/build_status/") {
                let (status, response_body) = self.handle_status(hex_id);
                let _ = request.respond(Response::from_string(response_body).with_status_code(StatusCode(status)));
                return false;
            }
        }

        let _ = request.respond(Response::from_string("").with_status_code(StatusCode(404)));
        false
    }

    fn handle_build(&self, body: &str) -> (u16, String) {
        let id = self.next_build_id();

        if self.active.lock().expect("active builds poisoned").len() > self.config.max_active_builds {
            warn!("build server: rejecting build {id:016x}, too many active builds");
            return (500, format!("BuildID: {id:016x}\nToo many active builds"));
        }

        match self.spawn_build(id, body) {
            Ok(()) => (200, format!("BuildID: {id:016x}")),
            Err(e) => {
                error!("build server: build {id:016x} failed to start: {e}");
                (500, format!("BuildID: {id:016x}\n{e}"))
            }
        }
    }

    fn handle_status(&self, hex_id: &str) -> (u16, String) {
        let Ok(id) = BuildId::from_str_radix(hex_id, 16) else {
            return (400, String::new());
        };
        let handle = {
            let active = self.active.lock().expect("active builds poisoned");
            match active.get(&id) {
                Some(handle) => Arc::clone(handle),
                None => return (400, String::new()),
            }
        };

        let mut log = handle.api.drain_log();
        if log.is_empty() && !handle.running.load(Ordering::Acquire) {
            log = "=== eof ===".to_string();
        }
        (200, log)
    }

    fn next_build_id(&self) -> BuildId {
        let active = self.active.lock().expect("active builds poisoned");
        loop {
            let id: BuildId = rand::random();
            if !active.contains_key(&id) {
                return id;
            }
        }
    }

    fn spawn_build(&self, id: BuildId, body: &str) -> Result<(), crate::error::BuildError> {
        let steps: Vec<BuildStep> = recipe::parse_recipe(body).map_err(|e| crate::error::BuildError::MalformedRecipe(e.to_string()))?;

        let build_root = self.work_dir.join(format!("build-{id:016x}"));
        std::fs::create_dir_all(&build_root)?;

        let api = Arc::new(BuildScriptApi::new(build_root.clone(), self.deploy_dir.clone(), Duration::from_millis(self.config.step_timeout_ms)));
        let handle = Arc::new(BuildHandle { api: Arc::clone(&api), running: AtomicBool::new(true), end_time: Mutex::new(None) });

        self.active.lock().expect("active builds poisoned").insert(id, Arc::clone(&handle));

        let worker_api = Arc::clone(&api);
        let worker_handle = Arc::clone(&handle);
        let cleanup_root = build_root.clone();
        self.scheduler.spawn(ThreadClass::Worker, Vec::new(), move || {
            let ok = recipe::interpret(&steps, &worker_api);
            info!("build {id:016x} finished: {}", if ok { "success" } else { "failure" });
            let _ = std::fs::remove_dir_all(&cleanup_root);
            *worker_handle.end_time.lock().expect("build handle poisoned") = Some(Instant::now());
            worker_handle.running.store(false, Ordering::Release);
        });

        Ok(())
    }

    fn reap(&self) {
        let keep_for = Duration::from_secs(self.config.keep_builds_for_secs);
        let mut active = self.active.lock().expect("active builds poisoned");
        active.retain(|id, handle| {
            if handle.running.load(Ordering::Acquire) {
                return true;
            }
            let Some(end_time) = *handle.end_time.lock().expect("build handle poisoned") else { return true };
            let keep = end_time.elapsed() <= keep_for;
            if !keep {
                info!("build server: reaped build {id:016x}");
            }
            keep
        });
    }

    fn shutdown(&self) {
        info!("build server: shutting down");
        for handle in self.active.lock().expect("active builds poisoned").values() {
            handle.api.stop();
        }
        self.scheduler.detach();
        self.active.lock().expect("active builds poisoned").clear();
        let _ = std::fs::remove_dir_all(&self.work_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_build_status_is_400() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_server_{}", std::process::id()));
        let server = BuildServer::new(BuildServerConfig::default(), dir.join("work"), dir.join("deploy"));
        let (status, _) = server.handle_status("deadbeefdeadbeef");
        assert_eq!(status, 400);
    }

    #[test]
    fn malformed_build_status_id_is_400() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_server2_{}", std::process::id()));
        let server = BuildServer::new(BuildServerConfig::default(), dir.join("work"), dir.join("deploy"));
        let (status, _) = server.handle_status("not-hex");
        assert_eq!(status, 400);
    }

    #[test]
    fn malformed_recipe_returns_500_with_echoed_id() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_server3_{}", std::process::id()));
        std::fs::create_dir_all(dir.join("work")).unwrap();
        let server = BuildServer::new(BuildServerConfig::default(), dir.join("work"), dir.join("deploy"));
        let (status, body) = server.handle_build("not a recipe");
        assert_eq!(status, 500);
        assert!(body.starts_with("BuildID: "));
    }
}
