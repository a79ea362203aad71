//! FXSD: a self-describing binary container for structured values.
//!
//! A container holds a **type catalog** describing the shape of every
//! type that was written, followed by a **data stream** of framed records
//! carrying only raw field values in declaration order.
//!
//! # Example
//!
//! ```
//! use fxsd::{FieldList, Record, Serializer, hash_str};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Reading {
//!     sensor: i32,
//!     value: f32,
//!     unit: String,
//! }
//!
//! impl Record for Reading {
//!     fn fields(fields: &mut FieldList<Self>) {
//!         fields
//!             .field("sensor", |r| &r.sensor, |r| &mut r.sensor)
//!             .field("value", |r| &r.value, |r| &mut r.value)
//!             .field("unit", |r| &r.unit, |r| &mut r.unit);
//!     }
//! }
//!
//! let reading = Reading { sensor: 7, value: 21.5, unit: "C".into() };
//!
//! let mut writer = Serializer::new();
//! writer.write_value(hash_str("Reading"), &reading).unwrap();
//! let mut bytes = Vec::new();
//! writer.flush_to(&mut bytes).unwrap();
//!
//! let mut reader = Serializer::new();
//! reader.load_from(bytes.as_slice()).unwrap();
//! assert_eq!(reader.read_value::<Reading>(hash_str("Reading")).unwrap(), reading);
//! ```
//!
//! # Type ids
//!
//! Type ids come from a [`TypeIdRegistry`] and follow first-use order within
//! a process. They are not stable across runs: a reader must share the
//! writer's registry, or request its types in the same order.

pub mod catalog;
mod codec;
pub mod container;
mod error;
mod options;
mod registry;
pub mod section;
mod serializer;
pub mod stream;

// Re-export error types
pub use error::{FxsdError, Result, SectionKind};

// Re-export core types
pub use catalog::{MemberShape, RawDescriptor, TypeCatalog, TypeDescriptor, TypeEntry};
pub use codec::{Field, FieldKind, FieldList, Record, Serializable, type_size};
pub use options::SerializerOptions;
pub use registry::TypeIdRegistry;
pub use section::ByteSection;
pub use serializer::Serializer;
pub use stream::{DataStream, RecordHeader};

// Name hashing is provided by `fxsd-hash`.
pub use fxsd_hash::{NameHash, hash_str};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
