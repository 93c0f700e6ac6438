//! Validate, clamp, and deduplicate declared samplers into a sampler pack.

use crate::script::{SamplerDecl, SamplerScript};
use crate::types::{AddressMode, BorderColor, CompareOp, SamplerDesc};
use ae_foundation::logging::warn;

/// Everything the sampler build produced: deduplicated descriptors and the
/// name table pointing into them.
#[derive(Debug, Default)]
pub struct SamplerPackOutput {
    /// Deduplicated sampler descriptors, indexed by UID.
    pub samplers: Vec<SamplerDesc>,
    /// `(name, uid)`, one entry per declared sampler.
    pub names: Vec<(String, u32)>,
}

/// Apply the fix-ups a declared sampler needs before it can be emitted.
/// Every violation is logged and clamped to a valid form rather than
/// rejected.
fn validate(name: &str, mut desc: SamplerDesc) -> SamplerDesc {
    if desc.unnormalized_coordinates {
        if desc.mag_filter != desc.min_filter {
            warn!("sampler '{name}': unnormalized coordinates require mag_filter == min_filter, forcing min_filter to mag_filter");
            desc.min_filter = desc.mag_filter;
        }
        if desc.mipmap_filter != crate::types::Filter::Nearest {
            warn!("sampler '{name}': unnormalized coordinates require a nearest mipmap filter, clamping");
            desc.mipmap_filter = crate::types::Filter::Nearest;
        }
        if desc.min_lod != 0.0 || desc.max_lod != 0.0 {
            warn!("sampler '{name}': unnormalized coordinates require lod range [0, 0], clamping");
            desc.min_lod = 0.0;
            desc.max_lod = 0.0;
        }
        for (axis, idx) in [("U", 0usize), ("V", 1usize)] {
            let mode = &mut desc.address_modes[idx];
            if !matches!(mode, AddressMode::ClampToEdge | AddressMode::ClampToBorder) {
                warn!("sampler '{name}': unnormalized coordinates require {axis} addressing to be ClampToEdge or ClampToBorder, forcing ClampToEdge");
                *mode = AddressMode::ClampToEdge;
            }
        }
        if desc.max_anisotropy.is_some() {
            warn!("sampler '{name}': unnormalized coordinates are incompatible with anisotropy, dropping it");
            desc.max_anisotropy = None;
        }
        if desc.compare_op.is_some() {
            warn!("sampler '{name}': unnormalized coordinates are incompatible with a compare op, dropping it");
            desc.compare_op = None::<CompareOp>;
        }
    }

    if desc.max_lod < desc.min_lod {
        warn!("sampler '{name}': max_lod < min_lod, raising max_lod to min_lod");
        desc.max_lod = desc.min_lod;
    }

    if !desc.address_modes.iter().any(|m| matches!(m, AddressMode::ClampToBorder)) && desc.border_color != BorderColor::default() {
        warn!("sampler '{name}': no axis clamps to border, resetting border_color to its default");
        desc.border_color = BorderColor::default();
    }

    desc
}

fn to_desc(decl: &SamplerDecl) -> SamplerDesc {
    SamplerDesc {
        mag_filter: decl.mag_filter,
        min_filter: decl.min_filter,
        mipmap_filter: decl.mipmap_filter,
        address_modes: [decl.address_mode_u, decl.address_mode_v, decl.address_mode_w],
        lod_bias: decl.lod_bias,
        max_anisotropy: decl.max_anisotropy,
        compare_op: decl.compare_op,
        min_lod: decl.min_lod,
        max_lod: decl.max_lod,
        border_color: decl.border_color,
        unnormalized_coordinates: decl.unnormalized_coordinates,
    }
}

/// Collect, validate, and deduplicate every sampler declared across
/// `scripts`. Two declarations that are structurally equal after
/// validation share a UID, whichever name was declared first.
#[must_use]
pub fn build(scripts: &[SamplerScript]) -> SamplerPackOutput {
    let mut out = SamplerPackOutput::default();

    for script in scripts {
        for decl in &script.samplers {
            let desc = validate(&decl.name, to_desc(decl));
            let uid = match out.samplers.iter().position(|existing| existing == &desc) {
                Some(uid) => u32::try_from(uid).expect("sampler pack UID overflow"),
                None => {
                    let uid = u32::try_from(out.samplers.len()).expect("sampler pack UID overflow");
                    out.samplers.push(desc);
                    uid
                }
            };
            out.names.push((decl.name.clone(), uid));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Filter;

    fn decl(name: &str) -> SamplerDecl {
        SamplerDecl {
            name: name.to_string(),
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            mipmap_filter: Filter::Linear,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            lod_bias: 0.0,
            max_anisotropy: None,
            compare_op: None,
            min_lod: 0.0,
            max_lod: 1000.0,
            border_color: BorderColor::default(),
            unnormalized_coordinates: false,
        }
    }

    #[test]
    fn identical_descriptors_share_a_uid() {
        let script = SamplerScript { samplers: vec![decl("a"), decl("b")] };
        let out = build(&[script]);
        assert_eq!(out.samplers.len(), 1);
        assert_eq!(out.names, vec![("a".to_string(), 0), ("b".to_string(), 0)]);
    }

    #[test]
    fn max_lod_below_min_lod_is_clamped() {
        let mut d = decl("bad");
        d.min_lod = 5.0;
        d.max_lod = 1.0;
        let out = build(&[SamplerScript { samplers: vec![d] }]);
        assert_eq!(out.samplers[0].max_lod, 5.0);
    }

    #[test]
    fn unnormalized_coordinates_clamp_conflicting_fields() {
        let mut d = decl("unnorm");
        d.unnormalized_coordinates = true;
        d.mipmap_filter = Filter::Linear;
        d.max_lod = 5.0;
        d.address_mode_u = AddressMode::Repeat;
        d.max_anisotropy = Some(4.0);
        let out = build(&[SamplerScript { samplers: vec![d] }]);
        let sampler = &out.samplers[0];
        assert_eq!(sampler.mipmap_filter, Filter::Nearest);
        assert_eq!(sampler.max_lod, 0.0);
        assert_eq!(sampler.address_modes[0], AddressMode::ClampToEdge);
        assert_eq!(sampler.max_anisotropy, None);
    }

    #[test]
    fn unused_border_color_resets_to_default() {
        let mut d = decl("no_border");
        d.border_color = BorderColor::IntOpaqueWhite;
        let out = build(&[SamplerScript { samplers: vec![d] }]);
        assert_eq!(out.samplers[0].border_color, BorderColor::default());
    }
}
