//! Primitive writers: little-endian fixed-width integers and floats,
//! length-prefixed byte strings, sequences, pairs, and options.

use crate::error::SerError;
use ae_stream::Writable;

/// Writes primitive values onto a borrowed [`Writable`] sink.
pub struct Serializer<'a> {
    out: &'a mut dyn Writable,
}

impl<'a> Serializer<'a> {
    /// Wrap a sink for writing.
    pub fn new(out: &'a mut dyn Writable) -> Self {
        Self { out }
    }

    /// Borrow the underlying sink, e.g. to seek back and patch a header.
    pub fn sink_mut(&mut self) -> &mut dyn Writable {
        self.out
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SerError> {
        self.out.write(bytes)?;
        Ok(())
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, v: u8) -> Result<(), SerError> {
        self.write_bytes(&[v])
    }

    /// Write an unsigned 16-bit integer, little-endian.
    pub fn write_u16(&mut self, v: u16) -> Result<(), SerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write an unsigned 32-bit integer, little-endian.
    pub fn write_u32(&mut self, v: u32) -> Result<(), SerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write an unsigned 64-bit integer, little-endian.
    pub fn write_u64(&mut self, v: u64) -> Result<(), SerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write a signed 32-bit integer, little-endian.
    pub fn write_i32(&mut self, v: i32) -> Result<(), SerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write a signed 64-bit integer, little-endian.
    pub fn write_i64(&mut self, v: i64) -> Result<(), SerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write a 32-bit float, little-endian.
    pub fn write_f32(&mut self, v: f32) -> Result<(), SerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write a 64-bit float, little-endian.
    pub fn write_f64(&mut self, v: f64) -> Result<(), SerError> {
        self.write_bytes(&v.to_le_bytes())
    }

    /// Write a boolean as a single byte.
    pub fn write_bool(&mut self, v: bool) -> Result<(), SerError> {
        self.write_u8(u8::from(v))
    }

    /// Write a 4-byte ASCII object tag verbatim.
    pub fn write_tag(&mut self, tag: [u8; 4]) -> Result<(), SerError> {
        self.write_bytes(&tag)
    }

    /// Write a length-prefixed byte string: `len: u32` then the raw bytes.
    pub fn write_byte_string(&mut self, bytes: &[u8]) -> Result<(), SerError> {
        self.write_u32(u32::try_from(bytes.len()).map_err(|_| {
            SerError::Malformed(format!("byte string too long: {} bytes", bytes.len()))
        })?)?;
        self.write_bytes(bytes)
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str) -> Result<(), SerError> {
        self.write_byte_string(s.as_bytes())
    }

    /// Write a sequence: `len: u32` followed by each element, written with
    /// the supplied closure.
    pub fn write_seq<T>(
        &mut self,
        items: &[T],
        mut write_one: impl FnMut(&mut Self, &T) -> Result<(), SerError>,
    ) -> Result<(), SerError> {
        self.write_u32(u32::try_from(items.len()).map_err(|_| {
            SerError::Malformed(format!("sequence too long: {} elements", items.len()))
        })?)?;
        for item in items {
            write_one(self, item)?;
        }
        Ok(())
    }

    /// Write an `(A, B)` pair.
    pub fn write_pair<A, B>(
        &mut self,
        pair: &(A, B),
        write_a: impl FnOnce(&mut Self, &A) -> Result<(), SerError>,
        write_b: impl FnOnce(&mut Self, &B) -> Result<(), SerError>,
    ) -> Result<(), SerError> {
        write_a(self, &pair.0)?;
        write_b(self, &pair.1)
    }

    /// Write an `Option<T>` as a `present: u8` flag followed by the value
    /// when present.
    pub fn write_option<T>(
        &mut self,
        value: &Option<T>,
        write_some: impl FnOnce(&mut Self, &T) -> Result<(), SerError>,
    ) -> Result<(), SerError> {
        match value {
            Some(v) => {
                self.write_u8(1)?;
                write_some(self, v)
            }
            None => self.write_u8(0),
        }
    }

    /// Write a map as a sequence of `(key, value)` pairs in `BTreeMap`
    /// iteration order, which is already key-sorted and therefore
    /// deterministic across runs.
    pub fn write_sorted_map<K, V>(
        &mut self,
        map: &std::collections::BTreeMap<K, V>,
        write_key: impl Fn(&mut Self, &K) -> Result<(), SerError>,
        write_value: impl Fn(&mut Self, &V) -> Result<(), SerError>,
    ) -> Result<(), SerError> {
        self.write_u32(u32::try_from(map.len()).map_err(|_| {
            SerError::Malformed(format!("map too long: {} entries", map.len()))
        })?)?;
        for (k, v) in map {
            write_key(self, k)?;
            write_value(self, v)?;
        }
        Ok(())
    }
}
