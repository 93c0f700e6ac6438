//! Server-wide tunables, loadable from the same `.toml`/`.ron` mechanism
//! the other compilers use.

use ae_foundation::config::Config;
use serde::{Deserialize, Serialize};

/// Tunables for [`crate::server::BuildServer`]; the bind address,
/// workspace root, and deploy root remain plain CLI arguments since
/// they're per-invocation, not per-deployment, settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildServerConfig {
    /// Reject new builds once this many are active at once.
    pub max_active_builds: usize,
    /// Worker threads pulled from the shared scheduler for running builds.
    pub worker_threads: usize,
    /// How long a finished build's status stays queryable before the
    /// reaper erases it, in seconds.
    pub keep_builds_for_secs: u64,
    /// How often the reaper sweeps finished builds, in seconds.
    pub reap_interval_secs: u64,
    /// Per-step process timeout, in milliseconds, before it's killed.
    pub step_timeout_ms: u64,
}

impl Default for BuildServerConfig {
    fn default() -> Self {
        Self {
            max_active_builds: 10,
            worker_threads: 4,
            keep_builds_for_secs: 60,
            reap_interval_secs: 10,
            step_timeout_ms: 6_000_000,
        }
    }
}

impl Config for BuildServerConfig {}
