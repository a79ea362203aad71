//! Container file layout.
//!
//! ```text
//! [4 bytes "FXSD"]
//! [u32 type catalog length][type catalog bytes]
//! [4 bytes ".DAT"]
//! [u32 data stream length][data stream bytes]
//! ```
//!
//! All lengths are big-endian.

use std::io::Write;

use crate::error::{FxsdError, Result, SectionKind};

/// File signature, start of the type catalog.
pub const FILE_SIGNATURE: [u8; 4] = *b"FXSD";

/// Data stream signature.
pub const DATA_SIGNATURE: [u8; 4] = *b".DAT";

/// Borrowed section payloads of a parsed container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSections<'a> {
    pub catalog: &'a [u8],
    pub data: &'a [u8],
}

/// Write both sections with their signatures and length prefixes.
pub fn write_container<W: Write>(writer: &mut W, catalog: &[u8], data: &[u8]) -> Result<()> {
    let catalog_len = section_length(SectionKind::Catalog, catalog.len())?;
    let data_len = section_length(SectionKind::Data, data.len())?;

    writer.write_all(&FILE_SIGNATURE)?;
    writer.write_all(&catalog_len.to_be_bytes())?;
    writer.write_all(catalog)?;

    writer.write_all(&DATA_SIGNATURE)?;
    writer.write_all(&data_len.to_be_bytes())?;
    writer.write_all(data)?;
    Ok(())
}

/// Split a container into its two sections.
///
/// Each recorded length is checked against `limit` and against the bytes
/// actually present before anything is copied out.
pub fn parse_container(bytes: &[u8], limit: Option<usize>) -> Result<ContainerSections<'_>> {
    let mut offset = 0usize;

    expect_signature(bytes, &mut offset, SectionKind::Catalog, FILE_SIGNATURE)?;
    let catalog = read_section(bytes, &mut offset, SectionKind::Catalog, limit)?;

    expect_signature(bytes, &mut offset, SectionKind::Data, DATA_SIGNATURE)?;
    let data = read_section(bytes, &mut offset, SectionKind::Data, limit)?;

    if offset != bytes.len() {
        return Err(FxsdError::TrailingBytes {
            count: bytes.len() - offset,
        });
    }

    Ok(ContainerSections { catalog, data })
}

fn section_length(section: SectionKind, length: usize) -> Result<u32> {
    u32::try_from(length).map_err(|_| FxsdError::SectionTooLarge {
        section,
        length,
        limit: u32::MAX as usize,
    })
}

fn take<'a>(
    bytes: &'a [u8],
    offset: &mut usize,
    len: usize,
    section: SectionKind,
) -> Result<&'a [u8]> {
    let available = bytes.len() - *offset;
    if len > available {
        return Err(FxsdError::Truncated {
            section,
            expected: len,
            available,
        });
    }
    let slice = &bytes[*offset..*offset + len];
    *offset += len;
    Ok(slice)
}

fn expect_signature(
    bytes: &[u8],
    offset: &mut usize,
    section: SectionKind,
    expected: [u8; 4],
) -> Result<()> {
    let mut found = [0u8; 4];
    found.copy_from_slice(take(bytes, offset, 4, section)?);
    if found != expected {
        return Err(FxsdError::SignatureMismatch { expected, found });
    }
    Ok(())
}

fn read_section<'a>(
    bytes: &'a [u8],
    offset: &mut usize,
    section: SectionKind,
    limit: Option<usize>,
) -> Result<&'a [u8]> {
    let mut length = [0u8; 4];
    length.copy_from_slice(take(bytes, offset, 4, section)?);
    let length = u32::from_be_bytes(length) as usize;

    if let Some(limit) = limit
        && length > limit
    {
        return Err(FxsdError::SectionTooLarge {
            section,
            length,
            limit,
        });
    }

    take(bytes, offset, length, section)
}
