//! Sampler descriptor data model.

use serde::{Deserialize, Serialize};

/// Texture filtering mode, shared by magnification, minification, and
/// mipmap filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Linear (bilinear/trilinear) sampling.
    Linear,
}

/// Texture coordinate addressing mode for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AddressMode {
    /// Tile the texture.
    Repeat,
    /// Tile the texture, mirroring every other tile.
    MirroredRepeat,
    /// Clamp to the edge texel.
    ClampToEdge,
    /// Clamp to a constant border color.
    ClampToBorder,
    /// Mirror once, then clamp to the edge.
    MirrorClampToEdge,
}

impl AddressMode {
    /// Whether this mode clamps to [`BorderColor`] rather than sampling
    /// texture content.
    #[must_use]
    pub fn is_clamp_to_border(self) -> bool {
        matches!(self, AddressMode::ClampToBorder)
    }
}

/// Depth-comparison operator for a comparison sampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Never passes.
    Never,
    /// Passes if `fragment < reference`.
    Less,
    /// Passes if `fragment == reference`.
    Equal,
    /// Passes if `fragment <= reference`.
    LessOrEqual,
    /// Passes if `fragment > reference`.
    Greater,
    /// Passes if `fragment != reference`.
    NotEqual,
    /// Passes if `fragment >= reference`.
    GreaterOrEqual,
    /// Always passes.
    Always,
}

/// The constant color an address mode of [`AddressMode::ClampToBorder`]
/// samples outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum BorderColor {
    /// `(0, 0, 0, 0)`, floating point.
    #[default]
    FloatTransparentBlack,
    /// `(0, 0, 0, 0)`, integer.
    IntTransparentBlack,
    /// `(0, 0, 0, 1)`, floating point.
    FloatOpaqueBlack,
    /// `(0, 0, 0, 1)`, integer.
    IntOpaqueBlack,
    /// `(1, 1, 1, 1)`, floating point.
    FloatOpaqueWhite,
    /// `(1, 1, 1, 1)`, integer.
    IntOpaqueWhite,
}

/// A fully-resolved sampler description. Equality (and the structural hash
/// the pack builder dedups on) compares every field, floats included —
/// exact float equality is acceptable since values originate from script
/// literals, never computed results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerDesc {
    /// Magnification filter.
    pub mag_filter: Filter,
    /// Minification filter.
    pub min_filter: Filter,
    /// Mipmap interpolation filter.
    pub mipmap_filter: Filter,
    /// Addressing mode for the `(U, V, W)` axes, in that order.
    pub address_modes: [AddressMode; 3],
    /// Mipmap LOD bias.
    pub lod_bias: f32,
    /// Maximum anisotropy, when anisotropic filtering is enabled.
    pub max_anisotropy: Option<f32>,
    /// Depth-comparison operator, when this is a comparison sampler.
    pub compare_op: Option<CompareOp>,
    /// Minimum mip LOD clamp.
    pub min_lod: f32,
    /// Maximum mip LOD clamp.
    pub max_lod: f32,
    /// Border color used by a `ClampToBorder` axis.
    pub border_color: BorderColor,
    /// Whether texture coordinates are unnormalized (`[0, width]` /
    /// `[0, height]` rather than `[0, 1]`).
    pub unnormalized_coordinates: bool,
}
