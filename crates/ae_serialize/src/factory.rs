//! Tagged object graph support: a 4-byte ASCII tag identifies the concrete
//! type to reconstruct on deserialization, for graphs whose shape is not
//! known statically by the reader.
//!
//! Types with a statically known shape should implement [`ISerializable`]
//! and be serialized directly without going through the factory at all.

use crate::de::Deserializer;
use crate::error::SerError;
use crate::ser::Serializer;
use std::collections::HashMap;

/// A 4-byte ASCII tag identifying a registered [`ISerializable`] type.
pub type SerializedId = [u8; 4];

/// A type that can serialize and deserialize itself directly, without
/// factory indirection.
pub trait ISerializable: std::any::Any {
    /// Write this object's fields.
    fn serialize(&self, ser: &mut Serializer) -> Result<(), SerError>;

    /// Overwrite this object's fields from the stream.
    fn deserialize(&mut self, de: &mut Deserializer) -> Result<(), SerError>;

    /// Upcast for downcasting back to a concrete type after factory
    /// construction.
    fn as_any(&self) -> &dyn std::any::Any;
}

struct FactoryEntry {
    construct: Box<dyn Fn() -> Box<dyn ISerializable> + Send + Sync>,
    size: usize,
    align: usize,
}

/// Maps [`SerializedId`] tags to constructors for the tagged-object-graph
/// serialization path.
#[derive(Default)]
pub struct ObjectFactory {
    entries: HashMap<SerializedId, FactoryEntry>,
}

impl ObjectFactory {
    /// Create an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Register a type under `tag`, along with its `size_of`/`align_of` for
    /// callers that need to reason about in-memory layout without
    /// constructing an instance.
    pub fn register<T>(&mut self, tag: SerializedId, size: usize, align: usize)
    where
        T: ISerializable + Default + 'static,
    {
        self.entries.insert(
            tag,
            FactoryEntry { construct: Box::new(|| Box::new(T::default())), size, align },
        );
    }

    /// `size_of`/`align_of` recorded for `tag`, if registered.
    #[must_use]
    pub fn layout_of(&self, tag: SerializedId) -> Option<(usize, usize)> {
        self.entries.get(&tag).map(|e| (e.size, e.align))
    }

    /// Write `tag` followed by `obj`'s serialized fields.
    pub fn write_object(
        &self,
        ser: &mut Serializer,
        tag: SerializedId,
        obj: &dyn ISerializable,
    ) -> Result<(), SerError> {
        ser.write_tag(tag)?;
        obj.serialize(ser)
    }

    /// Read a tag, construct the registered default instance, and
    /// deserialize its fields from the stream.
    pub fn read_object(&self, de: &mut Deserializer) -> Result<Box<dyn ISerializable>, SerError> {
        let tag = de.read_tag()?;
        let entry = self.entries.get(&tag).ok_or(SerError::UnknownTag(tag))?;
        let mut obj = (entry.construct)();
        obj.deserialize(de)?;
        Ok(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ae_stream::{MemReader, MemWriter};

    #[derive(Default)]
    struct Point {
        x: f32,
        y: f32,
    }

    impl ISerializable for Point {
        fn serialize(&self, ser: &mut Serializer) -> Result<(), SerError> {
            ser.write_f32(self.x)?;
            ser.write_f32(self.y)
        }

        fn deserialize(&mut self, de: &mut Deserializer) -> Result<(), SerError> {
            self.x = de.read_f32()?;
            self.y = de.read_f32()?;
            Ok(())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn round_trips_through_the_factory() {
        let mut factory = ObjectFactory::new();
        factory.register::<Point>(*b"PNT0", std::mem::size_of::<Point>(), std::mem::align_of::<Point>());

        let mut w = MemWriter::new();
        factory
            .write_object(&mut Serializer::new(&mut w), *b"PNT0", &Point { x: 1.0, y: 2.0 })
            .unwrap();

        let mut r = MemReader::from_bytes(w.into_bytes());
        let obj = factory.read_object(&mut Deserializer::new(&mut r)).unwrap();
        let point = obj.as_any().downcast_ref::<Point>().unwrap();
        assert_eq!((point.x, point.y), (1.0, 2.0));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let factory = ObjectFactory::new();
        let mut w = MemWriter::new();
        Serializer::new(&mut w).write_tag(*b"ZZZZ").unwrap();
        let mut r = MemReader::from_bytes(w.into_bytes());
        let err = match factory.read_object(&mut Deserializer::new(&mut r)) {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(matches!(err, SerError::UnknownTag(tag) if &tag == b"ZZZZ"));
    }
}
