//! The serializable capability and the primitive codecs.
//!
//! | Kind | Encoding |
//! |------|----------|
//! | `i32`, `u32` | 4 bytes, big-endian |
//! | `u16` | 2 bytes, big-endian |
//! | `u8` | 1 byte |
//! | `bool` | 1 byte, `0` or `1` |
//! | `f32` | 4 bytes, big-endian IEEE-754 bit pattern |
//! | `String` | `u16` byte length, then the raw UTF-8 bytes |
//! | [`Record`] | a nested data record |
//!
//! Composite types implement [`Record`] by listing their fields in a fixed
//! order; every `Record` is [`Serializable`] through a blanket impl.

use std::any::type_name;
use std::fmt;

use crate::catalog::MemberShape;
use crate::error::{FxsdError, Result};
use crate::registry::TypeIdRegistry;
use crate::serializer::Serializer;

/// Whether a value is encoded inline or as a nested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed primitive codec, no catalog members.
    Primitive,
    /// A [`Record`] written as a nested data record.
    Composite,
}

/// A type that can register its shape and encode/decode its value.
pub trait Serializable: Sized + 'static {
    const KIND: FieldKind;

    /// Make sure this type's descriptor (and its members') is in the catalog.
    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape>;

    /// Encode this value at the data stream cursor.
    fn write_value(&self, serializer: &mut Serializer) -> Result<()>;

    /// Decode a value from the data stream cursor.
    fn read_value(serializer: &mut Serializer) -> Result<Self>;
}

/// A composite type with a fixed, ordered list of fields.
///
/// ```
/// use fxsd::{FieldList, Record};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Record for Point {
///     fn fields(fields: &mut FieldList<Self>) {
///         fields
///             .field("x", |p| &p.x, |p| &mut p.x)
///             .field("y", |p| &p.y, |p| &mut p.y);
///     }
/// }
/// ```
pub trait Record: Default + 'static {
    /// Append every field, in declaration order.
    fn fields(fields: &mut FieldList<Self>);
}

/// In-memory size of `T` as stored in a descriptor.
pub fn type_size<T>() -> Result<u16> {
    let size = size_of::<T>();
    u16::try_from(size).map_err(|_| FxsdError::TypeTooLarge {
        type_name: type_name::<T>(),
        size,
    })
}

type EncodeFn<T> = Box<dyn Fn(&T, &mut Serializer) -> Result<()> + Send + Sync>;
type DecodeFn<T> = Box<dyn Fn(&mut T, &mut Serializer) -> Result<()> + Send + Sync>;

/// One field of a [`Record`]: its accessors and the codec of its type.
pub struct Field<T> {
    name: &'static str,
    kind: FieldKind,
    type_name: &'static str,
    shape: fn(&mut Serializer) -> Result<MemberShape>,
    type_id: fn(&TypeIdRegistry) -> Result<u16>,
    size: fn() -> Result<u16>,
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

impl<T: 'static> Field<T> {
    /// Build a field from a shared and a mutable accessor.
    pub fn new<F: Serializable>(
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        Self {
            name,
            kind: F::KIND,
            type_name: type_name::<F>(),
            shape: F::write_shape,
            type_id: TypeIdRegistry::id_for::<F>,
            size: type_size::<F>,
            encode: Box::new(move |record, serializer| get(record).write_value(serializer)),
            decode: Box::new(move |record, serializer| {
                *get_mut(record) = F::read_value(serializer)?;
                Ok(())
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Rust type name of the field's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn write_shape(&self, serializer: &mut Serializer) -> Result<MemberShape> {
        (self.shape)(serializer)
    }

    pub(crate) fn type_id(&self, registry: &TypeIdRegistry) -> Result<u16> {
        (self.type_id)(registry)
    }

    pub(crate) fn size(&self) -> Result<u16> {
        (self.size)()
    }

    pub(crate) fn encode(&self, record: &T, serializer: &mut Serializer) -> Result<()> {
        (self.encode)(record, serializer)
    }

    pub(crate) fn decode(&self, record: &mut T, serializer: &mut Serializer) -> Result<()> {
        (self.decode)(record, serializer)
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// The ordered fields of a [`Record`].
#[derive(Debug)]
pub struct FieldList<T> {
    fields: Vec<Field<T>>,
}

impl<T: Record> FieldList<T> {
    /// Collect the field list `T` declares.
    #[must_use]
    pub fn of() -> Self {
        let mut list = Self { fields: Vec::new() };
        T::fields(&mut list);
        list
    }

    /// Append a field.
    pub fn field<F: Serializable>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        self.fields.push(Field::new(name, get, get_mut));
        self
    }
}

impl<T> FieldList<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field<T>> {
        self.fields.iter()
    }
}

impl<'a, T> IntoIterator for &'a FieldList<T> {
    type Item = &'a Field<T>;
    type IntoIter = std::slice::Iter<'a, Field<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<T: Record> Serializable for T {
    const KIND: FieldKind = FieldKind::Composite;

    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape> {
        serializer.register_record::<T>()
    }

    fn write_value(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.write_record(0, self)
    }

    fn read_value(serializer: &mut Serializer) -> Result<Self> {
        serializer.read_record(0)
    }
}

/////////////////////////////////////
// Primitive codecs
/////////////////////////////////////

impl Serializable for i32 {
    const KIND: FieldKind = FieldKind::Primitive;

    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape> {
        serializer.register_leaf::<Self>()
    }

    fn write_value(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.payload().write_bytes(&self.to_be_bytes())
    }

    fn read_value(serializer: &mut Serializer) -> Result<Self> {
        serializer.payload().read_u32().map(|bits| bits as i32)
    }
}

impl Serializable for u32 {
    const KIND: FieldKind = FieldKind::Primitive;

    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape> {
        serializer.register_leaf::<Self>()
    }

    fn write_value(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.payload().write_u32(*self)
    }

    fn read_value(serializer: &mut Serializer) -> Result<Self> {
        serializer.payload().read_u32()
    }
}

impl Serializable for u16 {
    const KIND: FieldKind = FieldKind::Primitive;

    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape> {
        serializer.register_leaf::<Self>()
    }

    fn write_value(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.payload().write_u16(*self)
    }

    fn read_value(serializer: &mut Serializer) -> Result<Self> {
        serializer.payload().read_u16()
    }
}

impl Serializable for u8 {
    const KIND: FieldKind = FieldKind::Primitive;

    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape> {
        serializer.register_leaf::<Self>()
    }

    fn write_value(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.payload().write_u8(*self)
    }

    fn read_value(serializer: &mut Serializer) -> Result<Self> {
        serializer.payload().read_u8()
    }
}

impl Serializable for bool {
    const KIND: FieldKind = FieldKind::Primitive;

    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape> {
        serializer.register_leaf::<Self>()
    }

    fn write_value(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.payload().write_u8(u8::from(*self))
    }

    fn read_value(serializer: &mut Serializer) -> Result<Self> {
        match serializer.payload().read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(FxsdError::invalid_value(
                "bool",
                format!("expected 0 or 1, found {other:#04X}"),
            )),
        }
    }
}

impl Serializable for f32 {
    const KIND: FieldKind = FieldKind::Primitive;

    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape> {
        serializer.register_leaf::<Self>()
    }

    // Bit pattern, not a numeric conversion.
    fn write_value(&self, serializer: &mut Serializer) -> Result<()> {
        serializer.payload().write_u32(self.to_bits())
    }

    fn read_value(serializer: &mut Serializer) -> Result<Self> {
        serializer.payload().read_u32().map(f32::from_bits)
    }
}

impl Serializable for String {
    const KIND: FieldKind = FieldKind::Primitive;

    fn write_shape(serializer: &mut Serializer) -> Result<MemberShape> {
        serializer.register_leaf::<Self>()
    }

    fn write_value(&self, serializer: &mut Serializer) -> Result<()> {
        let length = u16::try_from(self.len()).map_err(|_| FxsdError::TextTooLong {
            length: self.len(),
        })?;
        let payload = serializer.payload();
        payload.ensure_writable(2 + self.len())?;
        payload.write_u16(length)?;
        payload.write_bytes(self.as_bytes())
    }

    fn read_value(serializer: &mut Serializer) -> Result<Self> {
        let payload = serializer.payload();
        let length = payload.read_u16()? as usize;
        let bytes = payload.read_bytes(length)?.to_vec();
        String::from_utf8(bytes).map_err(|e| FxsdError::invalid_value("String", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::options::SerializerOptions;

    fn serializer() -> Serializer {
        Serializer::with_registry(Arc::new(TypeIdRegistry::new()), SerializerOptions::default())
    }

    fn encode<T: Serializable>(value: &T) -> Vec<u8> {
        let mut serializer = serializer();
        value.write_value(&mut serializer).unwrap();
        serializer.stream().as_bytes().to_vec()
    }

    fn decode<T: Serializable>(bytes: &[u8]) -> Result<T> {
        let mut serializer = serializer();
        serializer.payload().write_bytes(bytes).unwrap();
        serializer.payload().rewind();
        T::read_value(&mut serializer)
    }

    #[test]
    fn test_integer_encoding() {
        assert_eq!(encode(&-2i32), vec![0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(encode(&30i32), vec![0, 0, 0, 30]);
        assert_eq!(encode(&0x0102u16), vec![1, 2]);
        assert_eq!(decode::<i32>(&[0x80, 0, 0, 0]).unwrap(), i32::MIN);
    }

    #[test]
    fn test_float_keeps_bit_pattern() {
        assert_eq!(encode(&3.0f32), vec![0x40, 0x40, 0x00, 0x00]);
        assert_eq!(decode::<f32>(&[0x40, 0x40, 0x00, 0x00]).unwrap(), 3.0);
        let nan = decode::<f32>(&[0x7F, 0xC0, 0x00, 0x01]).unwrap();
        assert_eq!(nan.to_bits(), 0x7FC0_0001);
    }

    #[test]
    fn test_text_encoding() {
        assert_eq!(encode(&"Hi".to_string()), vec![0, 2, b'H', b'i']);
        assert_eq!(decode::<String>(&[0, 0]).unwrap(), "");
        assert_eq!(
            decode::<String>(&[0, 12, b'H', b'e', b'l', b'l', b'o', b',', b' ', b'W', b'o', b'r', b'l', b'd'])
                .unwrap(),
            "Hello, World"
        );
    }

    #[test]
    fn test_text_too_long() {
        let mut serializer = serializer();
        let text = "x".repeat(70_000);
        let err = text.write_value(&mut serializer).unwrap_err();
        assert!(matches!(err, FxsdError::TextTooLong { length: 70_000 }));
        assert!(serializer.stream().is_empty());
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let err = decode::<String>(&[0, 2, 0xC3, 0x28]).unwrap_err();
        assert!(matches!(err, FxsdError::InvalidValue { type_name: "String", .. }));
    }

    #[test]
    fn test_truncated_text() {
        let err = decode::<String>(&[0, 5, b'a']).unwrap_err();
        assert!(matches!(err, FxsdError::OutOfBounds { .. }));
    }

    #[test]
    fn test_bool_encoding() {
        assert_eq!(encode(&true), vec![1]);
        assert!(!decode::<bool>(&[0]).unwrap());
        let err = decode::<bool>(&[2]).unwrap_err();
        assert!(matches!(err, FxsdError::InvalidValue { type_name: "bool", .. }));
    }

    #[test]
    fn test_primitive_shapes_are_leaves() {
        let mut serializer = serializer();
        let shape = i32::write_shape(&mut serializer).unwrap();
        assert_eq!(shape.size, 4);
        assert_eq!(shape.type_id, 1);
        let again = i32::write_shape(&mut serializer).unwrap();
        assert_eq!(again, shape);
        assert_eq!(serializer.catalog().entries().len(), 1);
        assert!(serializer.catalog_mut().resolve(1).unwrap().is_leaf());
    }

    #[derive(Default)]
    struct Pair {
        left: u8,
        right: bool,
    }

    impl Record for Pair {
        fn fields(fields: &mut FieldList<Self>) {
            fields
                .field("left", |p| &p.left, |p| &mut p.left)
                .field("right", |p| &p.right, |p| &mut p.right);
        }
    }

    #[test]
    fn test_field_list_order() {
        let fields = FieldList::<Pair>::of();
        let names: Vec<_> = fields.iter().map(Field::name).collect();
        assert_eq!(names, ["left", "right"]);
        assert!(fields.iter().all(|f| f.kind() == FieldKind::Primitive));
        assert_eq!(fields.iter().nth(1).map(Field::type_name), Some("bool"));
        assert_eq!(Pair::KIND, FieldKind::Composite);
    }
}
