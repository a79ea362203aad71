//! Sample records written by `fxsd demo`.

use std::fmt;
use std::path::Path;

use fxsd::{FieldList, NameHash, Record, Serializer, hash_str};
use tracing::info;

pub const STRUCT_A: NameHash = hash_str("TestStructA");
pub const STRUCT_C: NameHash = hash_str("TestStructC");

#[derive(Debug, Clone, PartialEq)]
pub struct StructB {
    pub a: i32,
    pub b: i32,
}

impl Default for StructB {
    fn default() -> Self {
        Self { a: 5, b: 10 }
    }
}

impl Record for StructB {
    fn fields(fields: &mut FieldList<Self>) {
        fields
            .field("A", |v| &v.a, |v| &mut v.a)
            .field("B", |v| &v.b, |v| &mut v.b);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructA {
    pub x: i32,
    pub y: i32,
    pub z: f32,
    pub other: StructB,
    pub hw: String,
    pub ch: bool,
}

impl Default for StructA {
    fn default() -> Self {
        Self {
            x: 30,
            y: 15,
            z: 3.0,
            other: StructB::default(),
            hw: "Hello, World".to_string(),
            ch: false,
        }
    }
}

impl Record for StructA {
    fn fields(fields: &mut FieldList<Self>) {
        fields
            .field("X", |v| &v.x, |v| &mut v.x)
            .field("Y", |v| &v.y, |v| &mut v.y)
            .field("Z", |v| &v.z, |v| &mut v.z)
            .field("Other", |v| &v.other, |v| &mut v.other)
            .field("HW", |v| &v.hw, |v| &mut v.hw)
            .field("ch", |v| &v.ch, |v| &mut v.ch);
    }
}

impl fmt::Display for StructA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{X: {}, Y: {}, Z: {}, Other: {{A: {}, B: {}}}, HW: {:?}, ch: {}}}",
            self.x, self.y, self.z, self.other.a, self.other.b, self.hw, self.ch
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructC {
    pub value: i32,
}

impl Record for StructC {
    fn fields(fields: &mut FieldList<Self>) {
        fields.field("Value", |v| &v.value, |v| &mut v.value);
    }
}

/// The two values the demo writes.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoValues {
    pub a: StructA,
    pub c: StructC,
}

impl Default for DemoValues {
    fn default() -> Self {
        Self {
            a: StructA::default(),
            c: StructC { value: 100 },
        }
    }
}

/// Write `values` to a new container at `path`.
pub fn write_demo(path: &Path, values: &DemoValues) -> fxsd::Result<()> {
    let mut writer = Serializer::new();
    writer.write_value(STRUCT_A, &values.a)?;
    writer.write_value(STRUCT_C, &values.c)?;
    writer.save(path)?;
    info!(
        path = %path.display(),
        types = writer.catalog().entries().len(),
        data_len = writer.stream().len(),
        "wrote demo container"
    );
    Ok(())
}

/// Read the demo values back, in the order they were written.
pub fn read_demo(path: &Path) -> fxsd::Result<DemoValues> {
    let mut reader = Serializer::open(path)?;
    let a = reader.read_value::<StructA>(STRUCT_A)?;
    let c = reader.read_value::<StructC>(STRUCT_C)?;
    info!(path = %path.display(), "read demo container");
    Ok(DemoValues { a, c })
}
