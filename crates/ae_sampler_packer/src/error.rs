//! Errors raised loading sampler scripts. Validation itself never fails
//! hard — bad combinations are logged and clamped to a valid form — so
//! this only covers I/O and parsing.

use std::io;

/// Errors raised reading or parsing a `.samp` script.
#[derive(thiserror::Error, Debug)]
pub enum SamplerScriptError {
    /// Reading the script file failed.
    #[error("{0}")]
    Io(#[from] io::Error),
    /// The script's RON failed to parse.
    #[error("{0}")]
    Parse(String),
}
