//! Hex dump of container sections.
//!
//! Bytes equal to the section's start or end marker print as `<<` and `>>`,
//! so payload bytes that happen to match a marker value print that way too.

use fxsd::catalog::{TYPE_ENTRY_END, TYPE_ENTRY_START};
use fxsd::stream::{RECORD_END, RECORD_START};

/// Bytes per printed row.
pub const ROW_WIDTH: usize = 20;

/// Rows for a type catalog section.
#[must_use]
pub fn dump_catalog(bytes: &[u8]) -> Vec<String> {
    dump_section(bytes, TYPE_ENTRY_START, TYPE_ENTRY_END)
}

/// Rows for a data stream section.
#[must_use]
pub fn dump_data(bytes: &[u8]) -> Vec<String> {
    dump_section(bytes, RECORD_START, RECORD_END)
}

/// Split `bytes` into rows of [`ROW_WIDTH`] space-separated tokens.
#[must_use]
pub fn dump_section(bytes: &[u8], start: u8, end: u8) -> Vec<String> {
    bytes
        .chunks(ROW_WIDTH)
        .map(|row| {
            row.iter()
                .map(|&byte| match byte {
                    b if b == start => "<<".to_string(),
                    b if b == end => ">>".to_string(),
                    b => hex::encode_upper([b]),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
