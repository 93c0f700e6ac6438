//! The operations a build recipe can perform, each one resolving its
//! path arguments underneath a single sandboxed workspace root before
//! touching the filesystem or shelling out.

use crate::android;
use crate::ctest::parse_ctest_output;
use crate::process::execute;
use crate::types::{EArch, ECompiler};
use log::error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Everything a recipe step needs to run: the sandbox root, the shared
/// log buffer, the stop flag, and a running count of sandbox violations
/// (a recipe that only ever trips the sandbox still finishes instead of
/// aborting the whole build on the first bad path, mirroring the
/// original's `_errorCounter` bookkeeping).
pub struct BuildScriptApi {
    work_dir: PathBuf,
    deploy_dir: PathBuf,
    current_dir: Mutex<PathBuf>,
    output: Mutex<String>,
    looping: AtomicBool,
    error_counter: AtomicU32,
    step_timeout: Duration,
}

impl BuildScriptApi {
    /// Create an API bound to `work_dir` (the sandbox root and the
    /// directory every relative path resolves against) and `deploy_dir`
    /// (the only location [`BuildScriptApi::deploy`] is allowed to write
    /// under).
    #[must_use]
    pub fn new(work_dir: PathBuf, deploy_dir: PathBuf, step_timeout: Duration) -> Self {
        let current_dir = Mutex::new(work_dir.clone());
        Self { work_dir, deploy_dir, current_dir, output: Mutex::new(String::new()), looping: AtomicBool::new(true), error_counter: AtomicU32::new(0), step_timeout }
    }

    /// Number of sandbox violations recorded so far.
    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.error_counter.load(Ordering::Acquire)
    }

    /// Signal the currently running step (if any) to stop and report
    /// failure rather than waiting out its timeout.
    pub fn stop(&self) {
        self.looping.store(false, Ordering::Release);
    }

    /// Swap the accumulated log out for an empty buffer, returning what
    /// had accumulated since the last call.
    pub fn drain_log(&self) -> String {
        std::mem::take(&mut *self.output.lock().expect("build log poisoned"))
    }

    /// Resolve `candidate` underneath the sandbox for an operation named
    /// `op`. On escape, appends `"<op>: invalid path"` to the build's own
    /// log (not just the process log) so a client polling
    /// `/build_status/<id>` can see why the step failed, and bumps the
    /// error counter without spawning anything.
    fn resolve(&self, op: &str, candidate: &str) -> Option<PathBuf> {
        let base = self.current_dir.lock().expect("current dir poisoned").clone();
        let joined = base.join(candidate);
        match ae_foundation::path_safety::resolve_sandboxed(&self.work_dir, &joined) {
            Some(resolved) => Some(resolved),
            None => {
                error!("build step: {op}: invalid path ({candidate})");
                self.output.lock().expect("build log poisoned").push_str(&format!("{op}: invalid path\n"));
                self.error_counter.fetch_add(1, Ordering::AcqRel);
                None
            }
        }
    }

    fn run(&self, program: &str, args: &[String], dir: &Path) -> bool {
        execute(program, args, dir, &self.looping, self.step_timeout, &self.output)
    }

    /// `CurDir`: change the directory later relative paths resolve
    /// against, itself sandboxed the same as every other path argument.
    pub fn cur_dir(&self, dir: &str) -> bool {
        let Some(resolved) = self.resolve("CurDir", dir) else { return false };
        *self.current_dir.lock().expect("current dir poisoned") = resolved;
        true
    }

    /// `MakeDir`: create a directory (and its parents) under the sandbox.
    pub fn make_dir(&self, dir: &str) -> bool {
        let Some(resolved) = self.resolve("MakeDir", dir) else { return false };
        std::fs::create_dir_all(resolved).is_ok()
    }

    /// `IsFile`.
    #[must_use]
    pub fn is_file(&self, path: &str) -> bool {
        self.resolve("IsFile", path).is_some_and(|p| p.is_file())
    }

    /// `IsDirectory`.
    #[must_use]
    pub fn is_directory(&self, path: &str) -> bool {
        self.resolve("IsDirectory", path).is_some_and(|p| p.is_dir())
    }

    /// `GitClone` with an explicit branch.
    pub fn git_clone(&self, url: &str, branch: &str, dst: &str) -> bool {
        let Some(dst) = self.resolve("GitClone", dst) else { return false };
        self.run("git", &["clone".into(), "--branch".into(), branch.into(), url.into(), dst.display().to_string()], &self.work_dir)
    }

    /// `GitClone2`: clone the repository's default branch.
    pub fn git_clone2(&self, url: &str, dst: &str) -> bool {
        let Some(dst) = self.resolve("GitClone2", dst) else { return false };
        self.run("git", &["clone".into(), url.into(), dst.display().to_string()], &self.work_dir)
    }

    /// `GitGetBranch`: the current branch name of an already-cloned repo,
    /// or `None` if the path is invalid or the command fails.
    #[must_use]
    pub fn git_get_branch(&self, path: &str) -> Option<String> {
        self.git_rev_parse("GitGetBranch", path, &["rev-parse".into(), "--abbrev-ref".into(), "HEAD".into()])
    }

    /// `GitGetHash`: the current commit hash, full or abbreviated.
    #[must_use]
    pub fn git_get_hash(&self, path: &str, short: bool) -> Option<String> {
        let mut args = vec!["rev-parse".to_string()];
        if short {
            args.push("--short".to_string());
        }
        args.push("HEAD".to_string());
        self.git_rev_parse("GitGetHash", path, &args)
    }

    fn git_rev_parse(&self, op: &str, path: &str, args: &[String]) -> Option<String> {
        let resolved = self.resolve(op, path)?;
        let output = std::process::Command::new("git").args(args).current_dir(&resolved).output().ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
    }

    /// `CMakeGen`.
    pub fn cmake_generate(&self, compiler: ECompiler, arch: EArch, source_dir: &str, build_dir: &str, defines: &[String]) -> bool {
        let Some(source_dir) = self.resolve("CMakeGen", source_dir) else { return false };
        let Some(build_dir) = self.resolve("CMakeGen", build_dir) else { return false };
        if std::fs::create_dir_all(&build_dir).is_err() {
            return false;
        }
        let mut args = compiler.generator_args(arch);
        for define in defines {
            args.push(format!("-D{define}"));
        }
        args.push(source_dir.display().to_string());
        self.run("cmake", &args, &build_dir)
    }

    /// `CMakeBuild`.
    pub fn cmake_build(&self, build_dir: &str, config: &str, target: Option<&str>) -> bool {
        let Some(build_dir) = self.resolve("CMakeBuild", build_dir) else { return false };
        let mut args = vec!["--build".to_string(), ".".to_string(), "--config".to_string(), config.to_string()];
        if let Some(target) = target {
            args.push("--target".to_string());
            args.push(target.to_string());
        }
        self.run("cmake", &args, &build_dir)
    }

    /// `CMakeInstall`.
    pub fn cmake_install(&self, build_dir: &str, dst_folder: &str, config: &str) -> bool {
        let Some(build_dir) = self.resolve("CMakeInstall", build_dir) else { return false };
        let Some(dst_folder) = self.resolve("CMakeInstall", dst_folder) else { return false };
        self.run(
            "cmake",
            &[
                "--install".to_string(),
                ".".to_string(),
                "--config".to_string(),
                config.to_string(),
                "--prefix".to_string(),
                dst_folder.display().to_string(),
            ],
            &build_dir,
        )
    }

    /// `CTest`: run the suite in `exe_dir` and classify its summary line.
    pub fn ctest(&self, exe_dir: &str, config: &str) -> bool {
        let Some(exe_dir) = self.resolve("CTest", exe_dir) else { return false };
        let before = self.drain_log();
        let ran = self.run("ctest", &["-C".to_string(), config.to_string(), "--output-on-failure".to_string()], &exe_dir);
        let captured = self.drain_log();
        let outcome = parse_ctest_output(&captured);
        {
            let mut log = self.output.lock().expect("build log poisoned");
            log.push_str(&before);
            log.push_str(&captured);
        }
        ran && outcome.succeeded()
    }

    /// `AndroidBuild`: inject `defines` into every `build.gradle`'s native
    /// build block under `source_dir`, then run `gradlew build`.
    pub fn android_build(&self, source_dir: &str, defines: &[String]) -> bool {
        let Some(source_dir) = self.resolve("AndroidBuild", source_dir) else { return false };
        if android::inject_defines_under(&source_dir, defines).is_err() {
            return false;
        }
        let gradlew = if cfg!(windows) { "gradlew.bat" } else { "./gradlew" };
        let before = self.drain_log();
        let ran = self.run(gradlew, &["build".to_string()], &source_dir);
        let captured = self.drain_log();
        let ok = ran && android::gradle_build_succeeded(&captured);
        {
            let mut log = self.output.lock().expect("build log poisoned");
            log.push_str(&before);
            log.push_str(&captured);
        }
        ok
    }

    /// `AndroidDevices`.
    #[must_use]
    pub fn android_devices(&self) -> Vec<String> {
        android::list_devices()
    }

    /// `AndroidSetDevice`: always succeeds; there is no device list to
    /// validate against upstream either.
    pub fn android_set_device(&self, _device: &str) -> bool {
        true
    }

    /// `AndroidConnectDevice`.
    pub fn android_connect_device(&self, ip: &str) -> bool {
        self.run("adb", &["connect".to_string(), ip.to_string()], &self.work_dir)
    }

    /// `AndroidRun`: a no-op upstream too.
    pub fn android_run(&self, _source_dir: &str) -> bool {
        true
    }

    /// `AndroidCopyTo`: a no-op upstream too.
    pub fn android_copy_to(&self, _src: &str, _dst: &str) -> bool {
        true
    }

    /// `Deploy`: sanitize `version` as a path component, refuse to
    /// overwrite an existing deploy, and copy `dist_folder`/`dbg_sym_folder`
    /// into `<deploy_dir>/<version>/{dist,dbg_sym}`.
    pub fn deploy(&self, version: &str, dist_folder: &str, dbg_sym_folder: &str) -> bool {
        let Some(dist_folder) = self.resolve("Deploy", dist_folder) else { return false };
        let Some(dbg_sym_folder) = self.resolve("Deploy", dbg_sym_folder) else { return false };
        let sanitized: String = version.chars().map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' }).collect();
        let target = self.deploy_dir.join(&sanitized);
        if target.exists() {
            error!("build step: deploy target already exists: {}", target.display());
            self.error_counter.fetch_add(1, Ordering::AcqRel);
            return false;
        }
        copy_dir(&dist_folder, &target.join("dist")).is_ok() && copy_dir(&dbg_sym_folder, &target.join("dbg_sym")).is_ok()
    }
}

fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dst_path)?;
        } else {
            std::fs::copy(entry.path(), dst_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(work_dir: &Path) -> BuildScriptApi {
        BuildScriptApi::new(work_dir.to_path_buf(), work_dir.join("deploy"), Duration::from_secs(5))
    }

    #[test]
    fn cur_dir_rejects_escape() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_api_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let api = api(&dir);
        assert!(!api.cur_dir("../../etc"));
        assert_eq!(api.error_count(), 1);
        assert!(api.drain_log().contains("CurDir: invalid path"));
    }

    #[test]
    fn git_clone_outside_sandbox_is_logged_without_spawning() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_api4_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let api = api(&dir);
        assert!(!api.git_clone("https://example.invalid/repo.git", "main", "../../../evil"));
        assert_eq!(api.error_count(), 1);
        assert!(api.drain_log().contains("GitClone: invalid path"));
        assert!(!dir.parent().unwrap().parent().unwrap().join("evil").exists());
    }

    #[test]
    fn make_dir_then_is_directory() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_api2_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let api = api(&dir);
        assert!(api.make_dir("nested/child"));
        assert!(api.is_directory("nested/child"));
        assert!(!api.is_file("nested/child"));
    }

    #[test]
    fn deploy_refuses_to_overwrite_existing_version() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_api3_{}", std::process::id()));
        let dist = dir.join("dist");
        let dbg = dir.join("dbg");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::create_dir_all(&dbg).unwrap();
        std::fs::write(dist.join("a.bin"), b"hi").unwrap();
        let api = api(&dir);
        assert!(api.deploy("1.0.0", "dist", "dbg"));
        assert!(!api.deploy("1.0.0", "dist", "dbg"));
    }
}
