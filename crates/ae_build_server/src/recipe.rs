//! The declarative recipe format a build request's body is parsed as: a
//! flat, ordered list of steps standing in for the line-by-line
//! `int main(BuildScriptApi&)` script the original build server
//! interpreted with an embedded scripting language.
//!
//! A handful of upstream operations returned a value a script could
//! branch on (`GitGetBranch`, `GitGetHash`). Without a scripting
//! language to consume that value, those steps log their result instead
//! and always continue — builds that need the branch/hash for a later
//! step (e.g. to name a deploy version) read it back out of the build's
//! status log.

use crate::api::BuildScriptApi;
use crate::types::{EArch, ECompiler};
use log::info;
use serde::{Deserialize, Serialize};

/// A single operation in a build recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BuildStep {
    /// Change the directory later relative paths resolve against.
    CurDir { dir: String },
    /// Create a directory under the sandbox, including its parents.
    MakeDir { dir: String },
    /// Clone `url` at `branch` into `dst`.
    GitClone { url: String, branch: String, dst: String },
    /// Clone `url`'s default branch into `dst`.
    GitClone2 { url: String, dst: String },
    /// Log the current branch of the repository at `path`.
    GitGetBranch { path: String },
    /// Log the current commit hash (full, or abbreviated if `short`) of
    /// the repository at `path`.
    GitGetHash { path: String, short: bool },
    /// Generate a build tree at `build_dir` for `source_dir`.
    CMakeGenerate { compiler: ECompiler, arch: EArch, source_dir: String, build_dir: String, defines: Vec<String> },
    /// Build `build_dir`, optionally a single `target`.
    CMakeBuild { build_dir: String, config: String, target: Option<String> },
    /// Install `build_dir`'s products into `dst_folder`.
    CMakeInstall { build_dir: String, dst_folder: String, config: String },
    /// Run the test suite built into `exe_dir`.
    CTest { exe_dir: String, config: String },
    /// Inject `defines` into `source_dir`'s Gradle native-build config
    /// and run `gradlew build`.
    AndroidBuild { source_dir: String, defines: Vec<String> },
    /// Log the attached device list (always empty, see
    /// [`crate::android::list_devices`]).
    AndroidDevices,
    /// Select a target device for subsequent Android steps.
    AndroidSetDevice { device: String },
    /// Connect to a device over `adb connect`.
    AndroidConnectDevice { ip: String },
    /// Run the built app on the selected device.
    AndroidRun { source_dir: String },
    /// Copy a file or directory to the selected device.
    AndroidCopyTo { src: String, dst: String },
    /// Publish `dist_folder`/`dbg_sym_folder` under `version`.
    Deploy { version: String, dist_folder: String, dbg_sym_folder: String },
}

/// Run every step in order against `api`. A step reporting failure does
/// not stop the recipe — every `api.*` call returns a boolean but a
/// recipe is free to ignore it, so this runs the whole list unconditionally
/// and reports only whether every step succeeded, for the caller's log.
pub fn interpret(steps: &[BuildStep], api: &BuildScriptApi) -> bool {
    let mut all_succeeded = true;
    for step in steps {
        if !run_step(step, api) {
            all_succeeded = false;
        }
    }
    all_succeeded
}

fn run_step(step: &BuildStep, api: &BuildScriptApi) -> bool {
    match step {
        BuildStep::CurDir { dir } => api.cur_dir(dir),
        BuildStep::MakeDir { dir } => api.make_dir(dir),
        BuildStep::GitClone { url, branch, dst } => api.git_clone(url, branch, dst),
        BuildStep::GitClone2 { url, dst } => api.git_clone2(url, dst),
        BuildStep::GitGetBranch { path } => match api.git_get_branch(path) {
            Some(branch) => {
                info!("build step: branch of {path} is {branch}");
                true
            }
            None => false,
        },
        BuildStep::GitGetHash { path, short } => match api.git_get_hash(path, *short) {
            Some(hash) => {
                info!("build step: hash of {path} is {hash}");
                true
            }
            None => false,
        },
        BuildStep::CMakeGenerate { compiler, arch, source_dir, build_dir, defines } => {
            api.cmake_generate(*compiler, *arch, source_dir, build_dir, defines)
        }
        BuildStep::CMakeBuild { build_dir, config, target } => api.cmake_build(build_dir, config, target.as_deref()),
        BuildStep::CMakeInstall { build_dir, dst_folder, config } => api.cmake_install(build_dir, dst_folder, config),
        BuildStep::CTest { exe_dir, config } => api.ctest(exe_dir, config),
        BuildStep::AndroidBuild { source_dir, defines } => api.android_build(source_dir, defines),
        BuildStep::AndroidDevices => {
            info!("build step: attached devices: {:?}", api.android_devices());
            true
        }
        BuildStep::AndroidSetDevice { device } => api.android_set_device(device),
        BuildStep::AndroidConnectDevice { ip } => api.android_connect_device(ip),
        BuildStep::AndroidRun { source_dir } => api.android_run(source_dir),
        BuildStep::AndroidCopyTo { src, dst } => api.android_copy_to(src, dst),
        BuildStep::Deploy { version, dist_folder, dbg_sym_folder } => api.deploy(version, dist_folder, dbg_sym_folder),
    }
}

/// Parse a recipe body as a RON-encoded step list.
pub fn parse_recipe(body: &str) -> Result<Vec<BuildStep>, ron::error::SpannedError> {
    ron::from_str(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn a_failing_step_does_not_stop_the_recipe() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_recipe_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let api = BuildScriptApi::new(dir.clone(), dir.join("deploy"), Duration::from_secs(5));
        let steps = vec![
            BuildStep::MakeDir { dir: "a".to_string() },
            BuildStep::CurDir { dir: "../../escape".to_string() },
            BuildStep::MakeDir { dir: "reached-anyway".to_string() },
        ];
        assert!(!interpret(&steps, &api));
        assert!(PathBuf::from(&dir).join("reached-anyway").exists());
        assert_eq!(api.error_count(), 1);
    }

    #[test]
    fn all_steps_succeeding_returns_true() {
        let dir = std::env::temp_dir().join(format!("ae_build_server_test_recipe2_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let api = BuildScriptApi::new(dir.clone(), dir.join("deploy"), Duration::from_secs(5));
        let steps = vec![BuildStep::MakeDir { dir: "out".to_string() }];
        assert!(interpret(&steps, &api));
    }

    #[test]
    fn parses_ron_step_list() {
        let body = r#"[MakeDir(dir: "out")]"#;
        let steps = parse_recipe(body).unwrap();
        assert_eq!(steps.len(), 1);
        assert!(matches!(steps[0], BuildStep::MakeDir { .. }));
    }

    #[test]
    fn rejects_malformed_recipe() {
        assert!(parse_recipe("not valid ron").is_err());
    }
}
