//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system.
///
/// Every binary in the workspace calls this once at the top of `main`.
/// Respects `RUST_LOG` the way `env_logger` always does; callers that want
/// a default level should set the env var before calling this.
pub fn init() {
    let _ = env_logger::try_init();
}
