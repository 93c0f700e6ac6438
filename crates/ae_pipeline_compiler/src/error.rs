//! Pipeline pack builder error taxonomy.

/// Errors raised building or serializing a pipeline pack. Every variant is
/// per-pipeline: a single bad pipeline is skipped, not fatal to the pack.
#[derive(thiserror::Error, Debug, Clone)]
pub enum PipelineError {
    /// A declared path escaped the pipeline's working root.
    #[error("path escapes sandbox: {0}")]
    InvalidPath(String),

    /// Shader compilation or reflection failed for a referenced shader.
    #[error("shader compile failed for {shader}: {message}")]
    ShaderCompile {
        /// The shader filename that failed.
        shader: String,
        /// The underlying compiler error, rendered as text.
        message: String,
    },

    /// Two shaders declared incompatible requirements for the same
    /// descriptor-set binding or push-constant name.
    #[error("layout conflict: {0}")]
    LayoutConflict(String),

    /// Two pipelines in the same pack used the same name.
    #[error("duplicate pipeline name: {0}")]
    DuplicateName(String),
}
