//! Error types for FXSD operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which section of a container an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SectionKind {
    /// The type catalog.
    Catalog,
    /// The data stream.
    Data,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog => write!(f, "type catalog"),
            Self::Data => write!(f, "data stream"),
        }
    }
}

/// Errors that can occur when building, writing or reading FXSD data.
#[derive(Debug, Error)]
pub enum FxsdError {
    /// A read or write would move the cursor past the end of a section.
    #[error("out of bounds: {width} byte(s) at offset {offset} exceeds section size {size}")]
    OutOfBounds {
        offset: usize,
        width: usize,
        size: usize,
    },

    /// A start or end marker did not match.
    #[error(
        "framing error in {section} at offset {offset}: expected marker {expected:#04X}, found {found:#04X}"
    )]
    Framing {
        section: SectionKind,
        offset: usize,
        expected: u8,
        found: u8,
    },

    /// The catalog is structurally inconsistent.
    #[error("corrupt type catalog at offset {offset}: {message}")]
    CorruptCatalog { offset: usize, message: String },

    /// No descriptor with this id exists in the catalog.
    #[error("type id {type_id} is not present in the type catalog")]
    UnknownType { type_id: u16 },

    /// A file or section signature did not match.
    #[error("signature mismatch: expected {}, found {}", show_signature(.expected), show_signature(.found))]
    SignatureMismatch { expected: [u8; 4], found: [u8; 4] },

    /// A record's stored name hash differs from the requested one.
    #[error("name mismatch: expected hash {expected:#010X}, record has {found:#010X}")]
    NameMismatch { expected: u32, found: u32 },

    /// A record refers to a type with no shape in the catalog.
    #[error("type {type_name} (id {type_id}) is not serializable: no shape registered")]
    NotSerializable {
        type_id: u16,
        type_name: &'static str,
    },

    /// A record holds a different type than the one requested.
    #[error(
        "type mismatch for {type_name}: expected type id {expected}, record has {found}{}",
        show_found_type(.found_type)
    )]
    TypeMismatch {
        type_name: &'static str,
        expected: u16,
        found: u16,
        /// What the reader's registry knows id `found` as, if anything.
        found_type: Option<&'static str>,
    },

    /// The catalog shape of a type disagrees with its field list.
    #[error("shape mismatch for {type_name}: {message}")]
    ShapeMismatch {
        type_name: &'static str,
        message: String,
    },

    /// Decoded bytes are not a valid value of the target type.
    #[error("invalid {type_name} value: {message}")]
    InvalidValue {
        type_name: &'static str,
        message: String,
    },

    /// Text longer than a `u16` length prefix can describe.
    #[error("text of {length} bytes exceeds the 65535 byte limit")]
    TextTooLong { length: usize },

    /// A composite type with more members than a descriptor can hold.
    #[error("type id {type_id} has {count} members, at most 255 are supported")]
    TooManyMembers { type_id: u16, count: usize },

    /// A type whose in-memory size does not fit a `u16`.
    #[error("type {type_name} is {size} bytes, at most 65535 are supported")]
    TypeTooLarge {
        type_name: &'static str,
        size: usize,
    },

    /// All 16-bit type ids have been handed out.
    #[error("type id space exhausted")]
    TypeIdsExhausted,

    /// A section is larger than the configured limit or the length field.
    #[error("{section} of {length} bytes exceeds the limit of {limit} bytes")]
    SectionTooLarge {
        section: SectionKind,
        length: usize,
        limit: usize,
    },

    /// A container ends before a section is complete.
    #[error("truncated {section}: expected {expected} bytes, {available} available")]
    Truncated {
        section: SectionKind,
        expected: usize,
        available: usize,
    },

    /// Unexpected bytes after the data stream.
    #[error("{count} unexpected trailing byte(s) after the data stream")]
    TrailingBytes { count: usize },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for FXSD operations.
pub type Result<T> = std::result::Result<T, FxsdError>;

impl FxsdError {
    /// Create a CorruptCatalog error.
    pub fn corrupt_catalog(offset: usize, message: impl Into<String>) -> Self {
        Self::CorruptCatalog {
            offset,
            message: message.into(),
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(type_name: &'static str, message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            type_name,
            message: message.into(),
        }
    }

    /// Create an InvalidValue error.
    pub fn invalid_value(type_name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            type_name,
            message: message.into(),
        }
    }

    /// Whether this error reports a damaged catalog (bad marker or bad structure).
    #[must_use]
    pub fn is_corrupt_catalog(&self) -> bool {
        matches!(
            self,
            Self::CorruptCatalog { .. }
                | Self::Framing {
                    section: SectionKind::Catalog,
                    ..
                }
        )
    }
}

fn show_found_type(found_type: &Option<&'static str>) -> String {
    found_type.map(|name| format!(" ({name})")).unwrap_or_default()
}

fn show_signature(bytes: &[u8; 4]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() {
                (b as char).to_string()
            } else {
                format!("\\x{b:02X}")
            }
        })
        .collect()
}
