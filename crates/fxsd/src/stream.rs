//! Data stream: framed records of raw field values.
//!
//! ```text
//! [u8  0x0B start marker]
//! [u16 type id]
//! [u32 name hash (0 = unchecked)]
//! [payload: fields in declared order]
//! [u8  0xB0 end marker]
//! ```

use tracing::trace;

use crate::error::{FxsdError, Result, SectionKind};
use crate::section::ByteSection;

/// Data record start marker.
pub const RECORD_START: u8 = 0x0B;

/// Data record end marker.
pub const RECORD_END: u8 = 0xB0;

/// Bytes taken by a record header.
pub const RECORD_HEADER_LEN: usize = 7;

/// The fixed part at the front of every data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RecordHeader {
    pub type_id: u16,
    pub name_hash: u32,
}

/// The data section and its record framing.
#[derive(Debug, Clone, Default)]
pub struct DataStream {
    section: ByteSection,
}

impl DataStream {
    #[must_use]
    pub fn new(section: ByteSection) -> Self {
        Self { section }
    }

    /// Wrap stored bytes, cursor at the first record.
    pub fn from_bytes(bytes: Vec<u8>, limit: Option<usize>) -> Result<Self> {
        if let Some(limit) = limit
            && bytes.len() > limit
        {
            return Err(FxsdError::SectionTooLarge {
                section: SectionKind::Data,
                length: bytes.len(),
                limit,
            });
        }
        Ok(Self::new(ByteSection::from_bytes(bytes, limit)))
    }

    /// The underlying section, for field payload codecs.
    #[must_use]
    pub fn section(&self) -> &ByteSection {
        &self.section
    }

    pub fn section_mut(&mut self) -> &mut ByteSection {
        &mut self.section
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.section.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.section.is_empty()
    }

    /// Raw stream bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.section.as_bytes()
    }

    /// Whether the cursor is past the last byte.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.section.remaining() == 0
    }

    pub fn write_record_header(&mut self, type_id: u16, name_hash: u32) -> Result<()> {
        self.section.ensure_writable(RECORD_HEADER_LEN)?;
        trace!(
            type_id,
            name_hash,
            offset = self.section.position(),
            "write record header"
        );
        self.section.write_u8(RECORD_START)?;
        self.section.write_u16(type_id)?;
        self.section.write_u32(name_hash)
    }

    pub fn write_record_footer(&mut self) -> Result<()> {
        self.section.write_u8(RECORD_END)
    }

    pub fn read_record_header(&mut self) -> Result<RecordHeader> {
        let offset = self.section.position();
        self.expect_marker(RECORD_START)?;
        let type_id = self.section.read_u16()?;
        let name_hash = self.section.read_u32()?;
        trace!(type_id, name_hash, offset, "read record header");
        Ok(RecordHeader { type_id, name_hash })
    }

    pub fn read_record_footer(&mut self) -> Result<()> {
        self.expect_marker(RECORD_END)
    }

    /// Read the next record header and leave the cursor where it was.
    pub fn peek_record_header(&mut self) -> Result<RecordHeader> {
        let saved = self.section.position();
        let header = self.read_record_header();
        self.section.seek(saved)?;
        header
    }

    fn expect_marker(&mut self, expected: u8) -> Result<()> {
        let offset = self.section.position();
        let found = self.section.read_u8()?;
        if found != expected {
            return Err(FxsdError::Framing {
                section: SectionKind::Data,
                offset,
                expected,
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_footer_layout() {
        let mut stream = DataStream::new(ByteSection::with_capacity(16));
        stream.write_record_header(0x0102, 0xAABB_CCDD).unwrap();
        stream.section_mut().write_u8(0x7F).unwrap();
        stream.write_record_footer().unwrap();
        assert_eq!(
            stream.as_bytes(),
            &[0x0B, 0x01, 0x02, 0xAA, 0xBB, 0xCC, 0xDD, 0x7F, 0xB0]
        );

        stream.section_mut().rewind();
        let header = stream.read_record_header().unwrap();
        assert_eq!(
            header,
            RecordHeader {
                type_id: 0x0102,
                name_hash: 0xAABB_CCDD
            }
        );
        assert_eq!(stream.section_mut().read_u8().unwrap(), 0x7F);
        stream.read_record_footer().unwrap();
        assert!(stream.at_end());
    }

    #[test]
    fn test_bad_start_marker() {
        let mut stream =
            DataStream::from_bytes(vec![0xB0, 0, 1, 0, 0, 0, 0, 0xB0], None).unwrap();
        let err = stream.read_record_header().unwrap_err();
        assert!(matches!(
            err,
            FxsdError::Framing {
                section: SectionKind::Data,
                offset: 0,
                expected: RECORD_START,
                found: RECORD_END,
            }
        ));
    }

    #[test]
    fn test_bad_end_marker() {
        let mut stream = DataStream::from_bytes(vec![0x0B], None).unwrap();
        let err = stream.read_record_footer().unwrap_err();
        assert!(matches!(err, FxsdError::Framing { found: 0x0B, .. }));
    }

    #[test]
    fn test_peek_restores_cursor() {
        let mut stream = DataStream::new(ByteSection::with_capacity(8));
        stream.write_record_header(3, 0).unwrap();
        stream.section_mut().rewind();
        assert_eq!(stream.peek_record_header().unwrap().type_id, 3);
        assert_eq!(stream.section().position(), 0);
    }

    #[test]
    fn test_header_does_not_partially_write() {
        let mut stream = DataStream::new(ByteSection::bounded(8, 10));
        stream.write_record_header(1, 0).unwrap();
        assert!(stream.write_record_header(2, 0).is_err());
        assert_eq!(stream.len(), RECORD_HEADER_LEN);
    }
}
