//! Integration tests for the demo container.

use std::fs;

use fxsd::{FxsdError, Serializer};
use fxsd_cli::demo::{DemoValues, STRUCT_A, STRUCT_C, StructA, read_demo, write_demo};
use fxsd_cli::dump::{dump_catalog, dump_data};
use tempfile::tempdir;

#[test]
fn test_demo_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Test.fxsd");

    let values = DemoValues::default();
    write_demo(&path, &values).unwrap();
    assert_eq!(read_demo(&path).unwrap(), values);
}

#[test]
fn test_demo_with_custom_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.fxsd");

    let mut values = DemoValues::default();
    values.a.x = 7;
    values.a.y = 3;
    values.a.hw = "héllo".to_string();
    values.a.ch = true;
    values.c.value = -1;
    write_demo(&path, &values).unwrap();
    assert_eq!(read_demo(&path).unwrap(), values);
}

#[test]
fn test_demo_file_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("layout.fxsd");
    write_demo(&path, &DemoValues::default()).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], b"FXSD");

    let mut serializer = Serializer::open(&path).unwrap();
    let header = serializer.stream_mut().peek_record_header().unwrap();
    assert_eq!(header.name_hash, STRUCT_A);

    let catalog_rows = dump_catalog(serializer.catalog().as_bytes());
    assert!(catalog_rows[0].starts_with("<<"));
    let data_rows = dump_data(serializer.stream().as_bytes());
    assert!(data_rows[0].starts_with("<<"));

    serializer.read_value::<StructA>(STRUCT_A).unwrap();
    let header = serializer.stream_mut().peek_record_header().unwrap();
    assert_eq!(header.name_hash, STRUCT_C);
}

#[test]
fn test_read_missing_demo() {
    let dir = tempdir().unwrap();
    let err = read_demo(&dir.path().join("absent.fxsd")).unwrap_err();
    assert!(matches!(err, FxsdError::FileNotFound { .. }));
}
