//! Binary serialization core shared by every pack format and container
//! codec in the workspace: primitive little-endian codecs over
//! [`ae_stream`] streams, plus a tagged-object-graph factory for formats
//! whose shape isn't known statically by the reader.
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod de;
pub mod error;
pub mod factory;
pub mod ser;

pub use de::Deserializer;
pub use error::SerError;
pub use factory::{ISerializable, ObjectFactory, SerializedId};
pub use ser::Serializer;
