//! Crash container codec: a fixed header (magic, version, four
//! offset/size sections) followed by a Brotli stream holding the
//! concatenated section payloads.

use crate::error::CrashContainerError;
use ae_serialize::{Deserializer, Serializer};
use ae_stream::{BrotliReader, BrotliWriter, Readable, Writable};

/// `'A', 'E', 'C', 'R'` packed little-endian.
pub const MAGIC: u32 = 0x5243_4541;
/// Current crash container format version.
pub const VERSION: u32 = 1;

const COMPRESSION_QUALITY: f32 = 0.7;

/// A crash report ready to compose into (or just read out of) a
/// container: user-supplied context, the symbol file this dump resolves
/// against, the raw minidump, and an optional trailing log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashContainer {
    /// Free-form user/session context (device id, build id, timestamp...).
    pub user_info: String,
    /// Name of the `.sym` file generated for the crashing build.
    pub symbols_id: String,
    /// Raw minidump bytes.
    pub dump: Vec<u8>,
    /// Tail of the application log at crash time, if one was captured.
    pub log: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Section {
    offset: u32,
    size: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Header {
    magic: u32,
    version: u32,
    symbols_id: Section,
    user_info: Section,
    log: Section,
    dump: Section,
}

fn write_section_header(ser: &mut Serializer, section: Section) -> Result<(), CrashContainerError> {
    ser.write_u32(section.offset)?;
    ser.write_u32(section.size)?;
    Ok(())
}

fn read_section_header(de: &mut Deserializer) -> Result<Section, CrashContainerError> {
    let offset = de.read_u32()?;
    let size = de.read_u32()?;
    Ok(Section { offset, size })
}

fn write_header<W: Writable>(out: &mut W, header: &Header) -> Result<(), CrashContainerError> {
    let mut ser = Serializer::new(out);
    ser.write_u32(header.magic)?;
    ser.write_u32(header.version)?;
    write_section_header(&mut ser, header.symbols_id)?;
    write_section_header(&mut ser, header.user_info)?;
    write_section_header(&mut ser, header.log)?;
    write_section_header(&mut ser, header.dump)?;
    Ok(())
}

fn encode_utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn decode_utf16le(bytes: &[u8]) -> Result<String, CrashContainerError> {
    if bytes.len() % 2 != 0 {
        return Err(CrashContainerError::Malformed("UTF-16 section has an odd byte length".into()));
    }
    let units = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().map_err(|e| CrashContainerError::Malformed(e.to_string()))
}

fn write_payload_section<W: Writable>(cw: &mut BrotliWriter<W>, bytes: &[u8], cursor: &mut u64) -> Result<Section, CrashContainerError> {
    let offset = u32::try_from(*cursor).map_err(|_| CrashContainerError::Malformed("container offset exceeds u32".into()))?;
    let size = u32::try_from(bytes.len()).map_err(|_| CrashContainerError::Malformed("container section exceeds u32".into()))?;
    cw.write(bytes)?;
    *cursor += bytes.len() as u64;
    Ok(Section { offset, size })
}

fn slice_section(data: &[u8], section: Section) -> Result<&[u8], CrashContainerError> {
    let start = section.offset as usize;
    let end = start
        .checked_add(section.size as usize)
        .ok_or_else(|| CrashContainerError::Malformed("section length overflows usize".into()))?;
    data.get(start..end)
        .ok_or_else(|| CrashContainerError::Malformed("section extends past the decompressed payload".into()))
}

/// Write `container` to `out`: placeholder header, Brotli-compressed
/// sections, then seek back and patch the header with the real offsets.
pub fn write_container<W: Writable>(out: &mut W, container: &CrashContainer) -> Result<(), CrashContainerError> {
    write_header(out, &Header::default())?;

    let mut header = Header { magic: MAGIC, version: VERSION, ..Header::default() };
    {
        let mut cw = BrotliWriter::new(out, COMPRESSION_QUALITY);
        let mut cursor: u64 = 0;

        let user_info = encode_utf16le(&container.user_info);
        header.user_info = write_payload_section(&mut cw, &user_info, &mut cursor)?;

        let symbols_id = encode_utf16le(&container.symbols_id);
        header.symbols_id = write_payload_section(&mut cw, &symbols_id, &mut cursor)?;

        header.dump = write_payload_section(&mut cw, &container.dump, &mut cursor)?;

        header.log = match &container.log {
            Some(log) => write_payload_section(&mut cw, log, &mut cursor)?,
            None => Section { offset: u32::MAX, size: 0 },
        };

        cw.finish()?;
    }

    out.seek(0)?;
    write_header(out, &header)?;
    Ok(())
}

/// Read a container back from `src`: decompress the whole payload into
/// memory, then slice each section out by its declared offset and size.
pub fn read_container<R: Readable>(mut src: R) -> Result<CrashContainer, CrashContainerError> {
    let header = {
        let mut de = Deserializer::new(&mut src);
        let magic = de.read_u32()?;
        let version = de.read_u32()?;
        let symbols_id = read_section_header(&mut de)?;
        let user_info = read_section_header(&mut de)?;
        let log = read_section_header(&mut de)?;
        let dump = read_section_header(&mut de)?;
        Header { magic, version, symbols_id, user_info, log, dump }
    };

    if header.magic != MAGIC {
        return Err(CrashContainerError::MagicMismatch { expected: MAGIC, found: header.magic });
    }
    if header.version != VERSION {
        return Err(CrashContainerError::UnsupportedVersion(header.version));
    }

    let decompressed = BrotliReader::new(src).read_to_end()?;

    let user_info = decode_utf16le(slice_section(&decompressed, header.user_info)?)?;
    let symbols_id = decode_utf16le(slice_section(&decompressed, header.symbols_id)?)?;
    let dump = slice_section(&decompressed, header.dump)?.to_vec();
    let log = if header.log.offset == u32::MAX { None } else { Some(slice_section(&decompressed, header.log)?.to_vec()) };

    Ok(CrashContainer { user_info, symbols_id, dump, log })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_stream::{MemReader, MemWriter};

    #[test]
    fn container_round_trips() {
        let container = CrashContainer {
            user_info: "ID: 5420170019289003836".to_string(),
            symbols_id: "Tests.Breakpad.exe".to_string(),
            dump: b"minidump bytes go here".to_vec(),
            log: Some(b"log test".to_vec()),
        };

        let mut writer = MemWriter::new();
        write_container(&mut writer, &container).unwrap();

        let reader = MemReader::from_bytes(writer.into_bytes());
        let round_tripped = read_container(reader).unwrap();
        assert_eq!(round_tripped, container);
    }

    #[test]
    fn absent_log_round_trips_to_none() {
        let container = CrashContainer {
            user_info: "u".to_string(),
            symbols_id: "s".to_string(),
            dump: vec![1, 2, 3],
            log: None,
        };

        let mut writer = MemWriter::new();
        write_container(&mut writer, &container).unwrap();

        let reader = MemReader::from_bytes(writer.into_bytes());
        let round_tripped = read_container(reader).unwrap();
        assert_eq!(round_tripped.log, None);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut writer = MemWriter::new();
        write_header(&mut writer, &Header { magic: 0xdead_beef, version: VERSION, ..Header::default() }).unwrap();
        let reader = MemReader::from_bytes(writer.into_bytes());
        let err = read_container(reader).unwrap_err();
        assert!(matches!(err, CrashContainerError::MagicMismatch { .. }));
    }
}
