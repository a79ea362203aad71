//! Serializer session: one type catalog plus one data stream.
//!
//! Writing a value registers its shape (members first), then appends one
//! framed record whose payload holds the fields in declared order. Composite
//! fields become nested records inline. Reading mirrors this using the
//! static field order of the requested type, starting at the read cursor.
//! Appending never moves the read cursor.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::{MemberShape, TypeCatalog};
use crate::codec::{FieldList, Record, type_size};
use crate::container::{parse_container, write_container};
use crate::error::{FxsdError, Result};
use crate::options::SerializerOptions;
use crate::registry::TypeIdRegistry;
use crate::section::ByteSection;
use crate::stream::DataStream;

type FieldListCache = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// A serialization session.
///
/// Not safe for concurrent use; one writer or reader at a time.
#[derive(Debug)]
pub struct Serializer {
    catalog: TypeCatalog,
    stream: DataStream,
    registry: Arc<TypeIdRegistry>,
    options: SerializerOptions,
    field_lists: FieldListCache,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    /// Create a session on the process-wide registry with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(SerializerOptions::default())
    }

    /// Create a session on the process-wide registry.
    #[must_use]
    pub fn with_options(options: SerializerOptions) -> Self {
        Self::with_registry(TypeIdRegistry::global(), options)
    }

    /// Create a session on an explicit registry.
    #[must_use]
    pub fn with_registry(registry: Arc<TypeIdRegistry>, options: SerializerOptions) -> Self {
        Self {
            catalog: TypeCatalog::new(options.new_section()),
            stream: DataStream::new(options.new_section()),
            registry,
            options,
            field_lists: HashMap::new(),
        }
    }

    /// Open a container file on the process-wide registry.
    pub fn open(path: &Path) -> Result<Self> {
        let mut serializer = Self::new();
        serializer.load_file(path)?;
        Ok(serializer)
    }

    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut TypeCatalog {
        &mut self.catalog
    }

    #[must_use]
    pub fn stream(&self) -> &DataStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut DataStream {
        &mut self.stream
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<TypeIdRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// The data stream section, where field codecs read and write.
    pub fn payload(&mut self) -> &mut ByteSection {
        self.stream.section_mut()
    }

    /// Type id of `T` in this session's registry.
    pub fn type_id_of<T: 'static>(&self) -> Result<u16> {
        self.registry.id_for::<T>()
    }

    /// Register `T` as a member-less descriptor.
    pub fn register_leaf<T: 'static>(&mut self) -> Result<MemberShape> {
        let shape = MemberShape {
            size: type_size::<T>()?,
            type_id: self.registry.id_for::<T>()?,
        };
        self.catalog.register_leaf(shape.type_id, shape.size)?;
        Ok(shape)
    }

    /// Register `T` and, first, every member type it lists.
    pub fn register_record<T: Record>(&mut self) -> Result<MemberShape> {
        let shape = MemberShape {
            size: type_size::<T>()?,
            type_id: self.registry.id_for::<T>()?,
        };
        if self.catalog.is_registered(shape.type_id) {
            return Ok(shape);
        }

        let fields = self.field_list::<T>();
        let mut members = Vec::with_capacity(fields.len());
        for field in fields.iter() {
            members.push(field.write_shape(self)?);
        }
        self.catalog
            .register_composite(shape.type_id, shape.size, &members)?;
        Ok(shape)
    }

    /// Append `value` as one top-level record tagged with `name_hash`.
    ///
    /// The record goes after the last byte of the stream and the read cursor
    /// is left where it was. On failure the stream is truncated back to its
    /// previous length, so existing records are never touched.
    pub fn write_value<T: Record>(&mut self, name_hash: u32, value: &T) -> Result<()> {
        let read_at = self.stream.section().position();
        self.stream.section_mut().seek_end();
        let mark = self.stream.section().mark();
        let result = self.write_record(name_hash, value);
        if result.is_err() {
            self.stream.section_mut().reset_to(mark);
        }
        self.stream.section_mut().seek(read_at)?;
        result
    }

    /// Read one top-level record of type `T`.
    ///
    /// A nonzero stored name hash must equal `name_hash`. On failure the
    /// read cursor returns to the start of the record.
    pub fn read_value<T: Record>(&mut self, name_hash: u32) -> Result<T> {
        let start = self.stream.section().position();
        let result = self.read_record(name_hash);
        if result.is_err() {
            self.stream.section_mut().seek(start)?;
        }
        result
    }

    pub(crate) fn write_record<T: Record>(&mut self, name_hash: u32, value: &T) -> Result<()> {
        let shape = self.register_record::<T>()?;
        self.stream.write_record_header(shape.type_id, name_hash)?;
        let fields = self.field_list::<T>();
        for field in fields.iter() {
            field.encode(value, self)?;
        }
        self.stream.write_record_footer()
    }

    pub(crate) fn read_record<T: Record>(&mut self, name_hash: u32) -> Result<T> {
        let type_name = type_name::<T>();
        let expected = self.registry.id_for::<T>()?;
        let header = self.stream.read_record_header()?;

        if header.name_hash != 0 && header.name_hash != name_hash {
            return Err(FxsdError::NameMismatch {
                expected: name_hash,
                found: header.name_hash,
            });
        }
        if !self.catalog.is_registered(header.type_id) {
            return Err(FxsdError::NotSerializable {
                type_id: header.type_id,
                type_name,
            });
        }
        if header.type_id != expected {
            return Err(FxsdError::TypeMismatch {
                type_name,
                expected,
                found: header.type_id,
                found_type: self.registry.type_name(header.type_id),
            });
        }

        let fields = self.field_list::<T>();
        if self.options.verify_shapes {
            self.verify_shape(expected, &fields)?;
        }

        let mut value = T::default();
        for field in fields.iter() {
            field.decode(&mut value, self)?;
        }
        self.stream.read_record_footer()?;
        Ok(value)
    }

    /// The field list of `T`, built on first use and shared afterwards.
    fn field_list<T: Record>(&mut self) -> Arc<FieldList<T>> {
        let key = TypeId::of::<T>();
        if let Some(cached) = self.field_lists.get(&key)
            && let Ok(fields) = Arc::clone(cached).downcast::<FieldList<T>>()
        {
            return fields;
        }
        let fields = Arc::new(FieldList::<T>::of());
        self.field_lists.insert(key, Arc::clone(&fields) as Arc<dyn Any + Send + Sync>);
        fields
    }

    fn verify_shape<T: Record>(&mut self, type_id: u16, fields: &FieldList<T>) -> Result<()> {
        let type_name = type_name::<T>();
        let descriptor = self.catalog.resolve(type_id)?;

        if descriptor.members.len() != fields.len() {
            return Err(FxsdError::shape_mismatch(
                type_name,
                format!(
                    "catalog lists {} members, type declares {} fields",
                    descriptor.members.len(),
                    fields.len()
                ),
            ));
        }

        for (member, field) in descriptor.members.iter().zip(fields) {
            let field_id = field.type_id(&self.registry)?;
            if member.id != field_id {
                return Err(FxsdError::shape_mismatch(
                    type_name,
                    format!(
                        "field `{}` has type id {field_id}, catalog has {}",
                        field.name(),
                        member.id
                    ),
                ));
            }
            let field_size = field.size()?;
            if member.size != field_size {
                return Err(FxsdError::shape_mismatch(
                    type_name,
                    format!(
                        "field `{}` is {field_size} bytes, catalog says {}",
                        field.name(),
                        member.size
                    ),
                ));
            }
        }
        Ok(())
    }

    ///////////////////////////////
    // Container input/output
    ///////////////////////////////

    /// Write the whole session as a container.
    pub fn flush_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        write_container(
            &mut writer,
            self.catalog.as_bytes(),
            self.stream.as_bytes(),
        )?;
        writer.flush()?;
        debug!(
            catalog_len = self.catalog.len(),
            data_len = self.stream.len(),
            types = self.catalog.entries().len(),
            "flushed session"
        );
        Ok(())
    }

    /// Replace this session's sections with a container read from `reader`.
    ///
    /// Nothing is replaced unless the whole container parses and its catalog
    /// validates.
    pub fn load_from<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut bytes = Vec::new();
        BufReader::new(reader).read_to_end(&mut bytes)?;

        let limit = self.options.max_section_size;
        let sections = parse_container(&bytes, limit)?;
        let catalog = TypeCatalog::from_bytes(sections.catalog.to_vec(), limit)?;
        let stream = DataStream::from_bytes(sections.data.to_vec(), limit)?;

        self.catalog = catalog;
        self.stream = stream;
        debug!(
            catalog_len = self.catalog.len(),
            data_len = self.stream.len(),
            types = self.catalog.entries().len(),
            "loaded session"
        );
        Ok(())
    }

    /// Write the session to a container file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.flush_to(file)
    }

    /// Load a container file into this session.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FxsdError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                FxsdError::Io(e)
            }
        })?;
        self.load_from(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        a: i32,
        b: i32,
    }

    impl Record for Inner {
        fn fields(fields: &mut FieldList<Self>) {
            fields
                .field("A", |v| &v.a, |v| &mut v.a)
                .field("B", |v| &v.b, |v| &mut v.b);
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        x: i32,
        inner: Inner,
        label: String,
    }

    impl Record for Outer {
        fn fields(fields: &mut FieldList<Self>) {
            fields
                .field("X", |v| &v.x, |v| &mut v.x)
                .field("Inner", |v| &v.inner, |v| &mut v.inner)
                .field("Label", |v| &v.label, |v| &mut v.label);
        }
    }

    fn session() -> Serializer {
        Serializer::with_registry(Arc::new(TypeIdRegistry::new()), SerializerOptions::default())
    }

    #[test]
    fn test_record_bytes() {
        let mut s = session();
        s.write_value(0x0000_0007, &Inner { a: 5, b: 10 }).unwrap();

        // Inner registers first (id 1), then its member type i32 (id 2).
        assert_eq!(
            s.stream().as_bytes(),
            &[
                0x0B, 0x00, 0x01, 0x00, 0x00, 0x00, 0x07, //
                0x00, 0x00, 0x00, 0x05, //
                0x00, 0x00, 0x00, 0x0A, //
                0xB0,
            ]
        );
    }

    #[test]
    fn test_nested_record_is_inline() {
        let mut s = session();
        let value = Outer {
            x: 1,
            inner: Inner { a: 2, b: 3 },
            label: "ok".to_string(),
        };
        s.write_value(42, &value).unwrap();

        let bytes = s.stream().as_bytes();
        // header(7) + x(4) + nested header(7) + a,b(8) + nested footer(1) + text(4) + footer(1)
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[11], 0x0B);
        assert_eq!(&bytes[14..18], &[0, 0, 0, 0], "nested records carry no name hash");
        assert_eq!(bytes[26], 0xB0);

        s.payload().rewind();
        assert_eq!(s.read_value::<Outer>(42).unwrap(), value);
    }

    #[test]
    fn test_member_descriptors_precede_parent() {
        let mut s = session();
        s.register_record::<Outer>().unwrap();

        let outer_id = s.type_id_of::<Outer>().unwrap();
        let inner_id = s.type_id_of::<Inner>().unwrap();
        let catalog = s.catalog();
        assert!(catalog.entry(inner_id).unwrap().offset < catalog.entry(outer_id).unwrap().offset);

        let descriptor = s.catalog_mut().resolve(outer_id).unwrap();
        assert_eq!(descriptor.members.len(), 3);
        assert_eq!(descriptor.members[1].id, inner_id);
        assert_eq!(descriptor.members[1].members.len(), 2);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let options = SerializerOptions::new().with_max_section_size(24);
        let mut s = Serializer::with_registry(Arc::new(TypeIdRegistry::new()), options);
        s.write_value(0, &Inner { a: 1, b: 2 }).unwrap();
        let len = s.stream().len();

        let err = s.write_value(0, &Inner { a: 3, b: 4 }).unwrap_err();
        assert!(matches!(err, FxsdError::OutOfBounds { .. }));
        assert_eq!(s.stream().len(), len);
        assert_eq!(s.stream().section().position(), 0);
    }

    #[test]
    fn test_write_appends_behind_read_cursor() {
        let mut s = session();
        s.write_value(1, &Inner { a: 1, b: 2 }).unwrap();
        s.write_value(2, &Inner { a: 3, b: 4 }).unwrap();
        assert_eq!(s.stream().section().position(), 0);

        assert_eq!(s.read_value::<Inner>(1).unwrap(), Inner { a: 1, b: 2 });
        let read_at = s.stream().section().position();
        s.write_value(3, &Inner { a: 5, b: 6 }).unwrap();
        assert_eq!(s.stream().section().position(), read_at);

        assert_eq!(s.read_value::<Inner>(2).unwrap(), Inner { a: 3, b: 4 });
        assert_eq!(s.read_value::<Inner>(3).unwrap(), Inner { a: 5, b: 6 });
        assert!(s.stream().at_end());
    }

    #[test]
    fn test_field_lists_are_built_once() {
        let mut s = session();
        let first = s.field_list::<Outer>();
        s.write_value(0, &Outer::default()).unwrap();
        s.write_value(0, &Outer::default()).unwrap();
        s.read_value::<Outer>(0).unwrap();

        assert!(Arc::ptr_eq(&first, &s.field_list::<Outer>()));
        // Outer and its nested Inner.
        assert_eq!(s.field_lists.len(), 2);
    }

    #[test]
    fn test_failed_read_restores_cursor() {
        let mut s = session();
        s.write_value(7, &Inner { a: 1, b: 2 }).unwrap();
        s.payload().rewind();

        let err = s.read_value::<Inner>(8).unwrap_err();
        assert!(matches!(err, FxsdError::NameMismatch { expected: 8, found: 7 }));
        assert_eq!(s.stream().section().position(), 0);

        assert_eq!(s.read_value::<Inner>(7).unwrap(), Inner { a: 1, b: 2 });
    }

    #[test]
    fn test_type_mismatch() {
        let mut s = session();
        s.write_value(0, &Inner { a: 1, b: 2 }).unwrap();
        s.register_record::<Outer>().unwrap();
        s.payload().rewind();

        let err = s.read_value::<Outer>(0).unwrap_err();
        assert!(matches!(
            err,
            FxsdError::TypeMismatch {
                expected: 3,
                found: 1,
                found_type: Some(name),
                ..
            } if name.ends_with("Inner")
        ));
    }

    #[test]
    fn test_unregistered_record_type() {
        let mut s = session();
        s.stream_mut().write_record_header(99, 0).unwrap();
        s.stream_mut().write_record_footer().unwrap();
        s.payload().rewind();

        let err = s.read_value::<Inner>(0).unwrap_err();
        assert!(matches!(err, FxsdError::NotSerializable { type_id: 99, .. }));
    }

    #[test]
    fn test_verify_shapes_accepts_matching_catalog() {
        let options = SerializerOptions::new().with_verify_shapes(true);
        let mut s = Serializer::with_registry(Arc::new(TypeIdRegistry::new()), options);
        let value = Outer {
            x: -1,
            inner: Inner { a: 9, b: 8 },
            label: String::new(),
        };
        s.write_value(0, &value).unwrap();
        s.payload().rewind();
        assert_eq!(s.read_value::<Outer>(0).unwrap(), value);
    }
}
