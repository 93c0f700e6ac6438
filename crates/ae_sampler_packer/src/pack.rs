//! On-disk (de)serialization of a sampler build into its versioned binary
//! format: `version: u32`, a `(name, uid)` name table, then the
//! deduplicated descriptor table.

use crate::build::SamplerPackOutput;
use crate::types::{AddressMode, BorderColor, CompareOp, Filter, SamplerDesc};
use ae_serialize::{Deserializer, SerError, Serializer};
use ae_stream::{Readable, Writable};

/// Current sampler pack format version.
pub const PACK_VERSION: u32 = 1;

fn filter_tag(f: Filter) -> u8 {
    match f {
        Filter::Nearest => 0,
        Filter::Linear => 1,
    }
}

fn filter_from_tag(tag: u8) -> Result<Filter, SerError> {
    match tag {
        0 => Ok(Filter::Nearest),
        1 => Ok(Filter::Linear),
        other => Err(SerError::Malformed(format!("invalid filter tag: {other}"))),
    }
}

fn address_mode_tag(m: AddressMode) -> u8 {
    match m {
        AddressMode::Repeat => 0,
        AddressMode::MirroredRepeat => 1,
        AddressMode::ClampToEdge => 2,
        AddressMode::ClampToBorder => 3,
        AddressMode::MirrorClampToEdge => 4,
    }
}

fn address_mode_from_tag(tag: u8) -> Result<AddressMode, SerError> {
    match tag {
        0 => Ok(AddressMode::Repeat),
        1 => Ok(AddressMode::MirroredRepeat),
        2 => Ok(AddressMode::ClampToEdge),
        3 => Ok(AddressMode::ClampToBorder),
        4 => Ok(AddressMode::MirrorClampToEdge),
        other => Err(SerError::Malformed(format!("invalid address mode tag: {other}"))),
    }
}

fn compare_op_tag(op: CompareOp) -> u8 {
    match op {
        CompareOp::Never => 0,
        CompareOp::Less => 1,
        CompareOp::Equal => 2,
        CompareOp::LessOrEqual => 3,
        CompareOp::Greater => 4,
        CompareOp::NotEqual => 5,
        CompareOp::GreaterOrEqual => 6,
        CompareOp::Always => 7,
    }
}

fn compare_op_from_tag(tag: u8) -> Result<CompareOp, SerError> {
    match tag {
        0 => Ok(CompareOp::Never),
        1 => Ok(CompareOp::Less),
        2 => Ok(CompareOp::Equal),
        3 => Ok(CompareOp::LessOrEqual),
        4 => Ok(CompareOp::Greater),
        5 => Ok(CompareOp::NotEqual),
        6 => Ok(CompareOp::GreaterOrEqual),
        7 => Ok(CompareOp::Always),
        other => Err(SerError::Malformed(format!("invalid compare op tag: {other}"))),
    }
}

fn border_color_tag(c: BorderColor) -> u8 {
    match c {
        BorderColor::FloatTransparentBlack => 0,
        BorderColor::IntTransparentBlack => 1,
        BorderColor::FloatOpaqueBlack => 2,
        BorderColor::IntOpaqueBlack => 3,
        BorderColor::FloatOpaqueWhite => 4,
        BorderColor::IntOpaqueWhite => 5,
    }
}

fn border_color_from_tag(tag: u8) -> Result<BorderColor, SerError> {
    match tag {
        0 => Ok(BorderColor::FloatTransparentBlack),
        1 => Ok(BorderColor::IntTransparentBlack),
        2 => Ok(BorderColor::FloatOpaqueBlack),
        3 => Ok(BorderColor::IntOpaqueBlack),
        4 => Ok(BorderColor::FloatOpaqueWhite),
        5 => Ok(BorderColor::IntOpaqueWhite),
        other => Err(SerError::Malformed(format!("invalid border color tag: {other}"))),
    }
}

fn write_sampler_desc(ser: &mut Serializer, desc: &SamplerDesc) -> Result<(), SerError> {
    ser.write_u8(filter_tag(desc.mag_filter))?;
    ser.write_u8(filter_tag(desc.min_filter))?;
    ser.write_u8(filter_tag(desc.mipmap_filter))?;
    for mode in desc.address_modes {
        ser.write_u8(address_mode_tag(mode))?;
    }
    ser.write_f32(desc.lod_bias)?;
    ser.write_option(&desc.max_anisotropy, |s, v| s.write_f32(*v))?;
    ser.write_option(&desc.compare_op, |s, v| s.write_u8(compare_op_tag(*v)))?;
    ser.write_f32(desc.min_lod)?;
    ser.write_f32(desc.max_lod)?;
    ser.write_u8(border_color_tag(desc.border_color))?;
    ser.write_bool(desc.unnormalized_coordinates)
}

fn read_sampler_desc(de: &mut Deserializer) -> Result<SamplerDesc, SerError> {
    let mag_filter = filter_from_tag(de.read_u8()?)?;
    let min_filter = filter_from_tag(de.read_u8()?)?;
    let mipmap_filter = filter_from_tag(de.read_u8()?)?;
    let address_modes = [
        address_mode_from_tag(de.read_u8()?)?,
        address_mode_from_tag(de.read_u8()?)?,
        address_mode_from_tag(de.read_u8()?)?,
    ];
    let lod_bias = de.read_f32()?;
    let max_anisotropy = de.read_option(Deserializer::read_f32)?;
    let compare_op = de.read_option(|d| compare_op_from_tag(d.read_u8()?))?;
    let min_lod = de.read_f32()?;
    let max_lod = de.read_f32()?;
    let border_color = border_color_from_tag(de.read_u8()?)?;
    let unnormalized_coordinates = de.read_bool()?;
    Ok(SamplerDesc {
        mag_filter,
        min_filter,
        mipmap_filter,
        address_modes,
        lod_bias,
        max_anisotropy,
        compare_op,
        min_lod,
        max_lod,
        border_color,
        unnormalized_coordinates,
    })
}

/// Write a sampler build to `out` in the versioned binary format.
pub fn write_pack(out: &mut dyn Writable, build: &SamplerPackOutput) -> Result<(), SerError> {
    let mut ser = Serializer::new(out);
    ser.write_u32(PACK_VERSION)?;
    ser.write_seq(&build.names, |s, (name, uid)| {
        s.write_string(name)?;
        s.write_u32(*uid)
    })?;
    ser.write_seq(&build.samplers, write_sampler_desc)
}

/// A sampler pack read back from disk.
#[derive(Debug, Default)]
pub struct SamplerPack {
    /// `(name, uid)`, one entry per declared sampler.
    pub names: Vec<(String, u32)>,
    /// Deduplicated sampler descriptors, indexed by UID.
    pub samplers: Vec<SamplerDesc>,
}

/// Read a sampler pack from `src`, rejecting any version other than
/// [`PACK_VERSION`].
pub fn read_pack(src: &mut dyn Readable) -> Result<SamplerPack, SerError> {
    let mut de = Deserializer::new(src);
    let version = de.read_u32()?;
    if version != PACK_VERSION {
        return Err(SerError::VersionMismatch { expected: PACK_VERSION, found: version });
    }
    let names = de.read_seq(|d| {
        let name = d.read_string()?;
        let uid = d.read_u32()?;
        Ok((name, uid))
    })?;
    let samplers = de.read_seq(read_sampler_desc)?;
    Ok(SamplerPack { names, samplers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;
    use crate::script::{SamplerDecl, SamplerScript};
    use ae_stream::{MemReader, MemWriter};

    fn decl(name: &str, unnorm: bool) -> SamplerDecl {
        SamplerDecl {
            name: name.to_string(),
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            mipmap_filter: Filter::Linear,
            address_mode_u: AddressMode::ClampToBorder,
            address_mode_v: AddressMode::ClampToBorder,
            address_mode_w: AddressMode::Repeat,
            lod_bias: 0.25,
            max_anisotropy: if unnorm { None } else { Some(16.0) },
            compare_op: Some(CompareOp::LessOrEqual),
            min_lod: 0.0,
            max_lod: 4.0,
            border_color: BorderColor::FloatOpaqueWhite,
            unnormalized_coordinates: unnorm,
        }
    }

    #[test]
    fn pack_round_trips() {
        let script = SamplerScript { samplers: vec![decl("linear_clamp", false), decl("linear_clamp_dup", false), decl("unnorm", true)] };
        let output = build::build(&[script]);
        assert_eq!(output.samplers.len(), 2);

        let mut writer = MemWriter::new();
        write_pack(&mut writer, &output).unwrap();

        let mut reader = MemReader::from_bytes(writer.into_bytes());
        let pack = read_pack(&mut reader).unwrap();
        assert_eq!(pack.names, output.names);
        assert_eq!(pack.samplers, output.samplers);
    }

    #[test]
    fn rejects_future_version() {
        let mut writer = MemWriter::new();
        Serializer::new(&mut writer).write_u32(PACK_VERSION + 1).unwrap();

        let mut reader = MemReader::from_bytes(writer.into_bytes());
        let err = read_pack(&mut reader).unwrap_err();
        assert!(matches!(err, SerError::VersionMismatch { .. }));
    }
}
