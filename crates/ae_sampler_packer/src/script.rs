//! Declarative sampler scripts: RON documents deserialized with `serde`,
//! the same stand-in for the original's scripting VM that pipeline
//! declarations use.

use crate::types::{AddressMode, BorderColor, CompareOp, Filter};
use serde::{Deserialize, Serialize};

/// One `.samp` script: every sampler declared in a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplerScript {
    /// Declared samplers, keyed by their unique name within the pack.
    #[serde(default)]
    pub samplers: Vec<SamplerDecl>,
}

/// One declared sampler, before validation/clamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerDecl {
    /// Unique name within the pack.
    pub name: String,
    /// Magnification filter.
    #[serde(default = "default_filter")]
    pub mag_filter: Filter,
    /// Minification filter.
    #[serde(default = "default_filter")]
    pub min_filter: Filter,
    /// Mipmap interpolation filter.
    #[serde(default = "default_filter")]
    pub mipmap_filter: Filter,
    /// `U` axis addressing mode.
    #[serde(default = "default_address_mode")]
    pub address_mode_u: AddressMode,
    /// `V` axis addressing mode.
    #[serde(default = "default_address_mode")]
    pub address_mode_v: AddressMode,
    /// `W` axis addressing mode.
    #[serde(default = "default_address_mode")]
    pub address_mode_w: AddressMode,
    /// Mipmap LOD bias.
    #[serde(default)]
    pub lod_bias: f32,
    /// Maximum anisotropy, if anisotropic filtering is wanted.
    #[serde(default)]
    pub max_anisotropy: Option<f32>,
    /// Depth-comparison operator, if this is a comparison sampler.
    #[serde(default)]
    pub compare_op: Option<CompareOp>,
    /// Minimum mip LOD clamp.
    #[serde(default)]
    pub min_lod: f32,
    /// Maximum mip LOD clamp.
    #[serde(default = "default_max_lod")]
    pub max_lod: f32,
    /// Border color used by a `ClampToBorder` axis.
    #[serde(default)]
    pub border_color: BorderColor,
    /// Whether texture coordinates are unnormalized.
    #[serde(default)]
    pub unnormalized_coordinates: bool,
}

fn default_filter() -> Filter {
    Filter::Linear
}

fn default_address_mode() -> AddressMode {
    AddressMode::Repeat
}

fn default_max_lod() -> f32 {
    1000.0
}
