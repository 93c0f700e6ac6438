//! Error types for recipe parsing and build execution.

use thiserror::Error;

/// Failures that can stop a build recipe before or during execution.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The uploaded recipe body didn't parse as a step list.
    #[error("malformed recipe: {0}")]
    MalformedRecipe(String),

    /// Setting up the per-build workspace directory failed.
    #[error("failed to prepare build workspace: {0}")]
    Workspace(#[from] std::io::Error),
}
