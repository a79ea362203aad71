//! Record types shared by the integration tests.

#![allow(dead_code)]

use fxsd::{FieldList, NameHash, Record, hash_str};

pub const STRUCT_A: NameHash = hash_str("TestStructA");
pub const STRUCT_C: NameHash = hash_str("TestStructC");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructB {
    pub a: i32,
    pub b: i32,
}

impl Record for StructB {
    fn fields(fields: &mut FieldList<Self>) {
        fields
            .field("A", |v| &v.a, |v| &mut v.a)
            .field("B", |v| &v.b, |v| &mut v.b);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructA {
    pub x: i32,
    pub y: i32,
    pub z: f32,
    pub other: StructB,
    pub hw: String,
    pub ch: bool,
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

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructC {
    pub value: i32,
}

impl Record for StructC {
    fn fields(fields: &mut FieldList<Self>) {
        fields.field("Value", |v| &v.value, |v| &mut v.value);
    }
}

/// The value used throughout the end-to-end scenario.
pub fn sample_a() -> StructA {
    StructA {
        x: 30,
        y: 15,
        z: 3.0,
        other: StructB { a: 5, b: 10 },
        hw: "Hello, World".to_string(),
        ch: false,
    }
}
