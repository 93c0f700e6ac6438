//! Primitive readers, mirroring [`crate::ser::Serializer`] byte-for-byte.

use crate::error::SerError;
use ae_stream::Readable;

/// Reads primitive values from a borrowed [`Readable`] source.
pub struct Deserializer<'a> {
    src: &'a mut dyn Readable,
}

impl<'a> Deserializer<'a> {
    /// Wrap a source for reading.
    pub fn new(src: &'a mut dyn Readable) -> Self {
        Self { src }
    }

    /// Borrow the underlying source.
    pub fn source_mut(&mut self) -> &mut dyn Readable {
        self.src
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SerError> {
        let mut buf = [0u8; N];
        self.src.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, SerError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read an unsigned 16-bit integer, little-endian.
    pub fn read_u16(&mut self) -> Result<u16, SerError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read an unsigned 32-bit integer, little-endian.
    pub fn read_u32(&mut self) -> Result<u32, SerError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read an unsigned 64-bit integer, little-endian.
    pub fn read_u64(&mut self) -> Result<u64, SerError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a signed 32-bit integer, little-endian.
    pub fn read_i32(&mut self) -> Result<i32, SerError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Read a signed 64-bit integer, little-endian.
    pub fn read_i64(&mut self) -> Result<i64, SerError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Read a 32-bit float, little-endian.
    pub fn read_f32(&mut self) -> Result<f32, SerError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a 64-bit float, little-endian.
    pub fn read_f64(&mut self) -> Result<f64, SerError> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Read a boolean from a single byte (any nonzero value is `true`).
    pub fn read_bool(&mut self) -> Result<bool, SerError> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a 4-byte ASCII object tag verbatim.
    pub fn read_tag(&mut self) -> Result<[u8; 4], SerError> {
        self.read_array()
    }

    /// Read a length-prefixed byte string.
    pub fn read_byte_string(&mut self) -> Result<Vec<u8>, SerError> {
        let len = self.read_u32()? as usize;
        let mut buf = vec![0u8; len];
        self.src.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, SerError> {
        let bytes = self.read_byte_string()?;
        String::from_utf8(bytes).map_err(|e| SerError::Malformed(e.to_string()))
    }

    /// Read a sequence written by [`crate::ser::Serializer::write_seq`].
    pub fn read_seq<T>(
        &mut self,
        mut read_one: impl FnMut(&mut Self) -> Result<T, SerError>,
    ) -> Result<Vec<T>, SerError> {
        let len = self.read_u32()? as usize;
        let mut out = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            out.push(read_one(self)?);
        }
        Ok(out)
    }

    /// Read an `(A, B)` pair.
    pub fn read_pair<A, B>(
        &mut self,
        read_a: impl FnOnce(&mut Self) -> Result<A, SerError>,
        read_b: impl FnOnce(&mut Self) -> Result<B, SerError>,
    ) -> Result<(A, B), SerError> {
        let a = read_a(self)?;
        let b = read_b(self)?;
        Ok((a, b))
    }

    /// Read an `Option<T>` written by
    /// [`crate::ser::Serializer::write_option`].
    pub fn read_option<T>(
        &mut self,
        read_some: impl FnOnce(&mut Self) -> Result<T, SerError>,
    ) -> Result<Option<T>, SerError> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(read_some(self)?)),
            other => Err(SerError::Malformed(format!("invalid Option tag: {other}"))),
        }
    }

    /// Read a sorted map written by
    /// [`crate::ser::Serializer::write_sorted_map`].
    pub fn read_sorted_map<K: Ord, V>(
        &mut self,
        read_key: impl Fn(&mut Self) -> Result<K, SerError>,
        read_value: impl Fn(&mut Self) -> Result<V, SerError>,
    ) -> Result<std::collections::BTreeMap<K, V>, SerError> {
        let len = self.read_u32()? as usize;
        let mut map = std::collections::BTreeMap::new();
        for _ in 0..len {
            let k = read_key(self)?;
            let v = read_value(self)?;
            map.insert(k, v);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::Serializer;
    use ae_stream::{MemReader, MemWriter};

    #[test]
    fn primitives_round_trip() {
        let mut w = MemWriter::new();
        {
            let mut ser = Serializer::new(&mut w);
            ser.write_u32(42).unwrap();
            ser.write_string("hello").unwrap();
            ser.write_option(&Some(3.5f32), |s, v| s.write_f32(*v)).unwrap();
            ser.write_option(&(None as Option<f32>), |s, v| s.write_f32(*v)).unwrap();
        }
        let mut r = MemReader::from_bytes(w.into_bytes());
        let mut de = Deserializer::new(&mut r);
        assert_eq!(de.read_u32().unwrap(), 42);
        assert_eq!(de.read_string().unwrap(), "hello");
        assert_eq!(de.read_option(Deserializer::read_f32).unwrap(), Some(3.5));
        assert_eq!(de.read_option(Deserializer::read_f32).unwrap(), None);
    }

    #[test]
    fn sorted_map_round_trips_in_key_order() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("zebra".to_string(), 1u32);
        map.insert("apple".to_string(), 2u32);

        let mut w = MemWriter::new();
        Serializer::new(&mut w)
            .write_sorted_map(&map, |s, k| s.write_string(k), |s, v| s.write_u32(*v))
            .unwrap();

        let mut r = MemReader::from_bytes(w.into_bytes());
        let mut de = Deserializer::new(&mut r);
        let round_tripped = de
            .read_sorted_map(Deserializer::read_string, Deserializer::read_u32)
            .unwrap();
        assert_eq!(round_tripped, map);
    }
}
