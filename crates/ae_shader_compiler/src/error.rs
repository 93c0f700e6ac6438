//! Shader compiler error taxonomy.

/// Errors raised by [`crate::compile`] or [`crate::build_reflection`].
#[derive(thiserror::Error, Debug)]
pub enum ShaderCompileError {
    /// Neither `glslc` nor `glslangValidator` could be located on `PATH`.
    #[error("no GLSL compiler found (looked for glslc, glslangValidator)")]
    CompilerNotFound,

    /// The external compiler process could not be spawned.
    #[error("failed to launch shader compiler: {0}")]
    SpawnFailed(String),

    /// Compilation failed; `log` carries the reformatted diagnostics.
    #[error("shader compilation failed:\n{0}")]
    CompileFailed(String),

    /// The compiled output file could not be read back.
    #[error("failed to read compiled output: {0}")]
    OutputUnreadable(String),

    /// Reflection encountered a basic type, image dimension, or resource
    /// kind it does not model.
    #[error("unsupported shader feature: {0}")]
    UnsupportedFeature(String),

    /// An I/O error unrelated to the compiler subprocess itself (writing
    /// the scratch source file, for instance).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
