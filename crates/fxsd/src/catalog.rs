//! Type catalog: an append-only, deduplicated table of type descriptors.
//!
//! Each descriptor record is laid out as:
//!
//! ```text
//! [u8  0xEF start marker]
//! [u16 type id]
//! [u16 type size in bytes]
//! [u8  member count N]
//! N x [u16 member size][u16 member type id]
//! [u8  0xBE end marker]
//! ```
//!
//! A composite's member descriptors are always written before the
//! composite itself, so a reader can resolve any id by looking backwards.

use tracing::debug;

use crate::error::{FxsdError, Result, SectionKind};
use crate::section::ByteSection;

/// Descriptor record start marker.
pub const TYPE_ENTRY_START: u8 = 0xEF;

/// Descriptor record end marker.
pub const TYPE_ENTRY_END: u8 = 0xBE;

/// Most members a single descriptor can list.
pub const MAX_MEMBERS: usize = u8::MAX as usize;

/// Nesting depth past which `resolve` treats the catalog as cyclic.
pub const MAX_RESOLVE_DEPTH: usize = 64;

/// Start + id + size + count + end.
const RECORD_OVERHEAD: usize = 7;
const MEMBER_LEN: usize = 4;

/// Index row: where the descriptor for `id` starts in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TypeEntry {
    pub id: u16,
    pub offset: u32,
}

/// One member slot of a descriptor: its size and type id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MemberShape {
    pub size: u16,
    pub type_id: u16,
}

/// A descriptor record as stored, with members left as ids.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RawDescriptor {
    pub id: u16,
    pub size: u16,
    pub members: Vec<MemberShape>,
}

/// A fully resolved descriptor: every member is itself a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TypeDescriptor {
    pub id: u16,
    pub size: u16,
    pub members: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// Whether this type has no members (a primitive).
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.members.is_empty()
    }

    /// Find a nested descriptor by id, depth first, including `self`.
    #[must_use]
    pub fn find(&self, id: u16) -> Option<&TypeDescriptor> {
        if self.id == id {
            return Some(self);
        }
        self.members.iter().find_map(|member| member.find(id))
    }
}

/// The catalog section plus its in-memory entry index.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    section: ByteSection,
    entries: Vec<TypeEntry>,
}

impl TypeCatalog {
    /// Create an empty catalog over `section`.
    #[must_use]
    pub fn new(section: ByteSection) -> Self {
        Self {
            section,
            entries: Vec::new(),
        }
    }

    /// Rebuild a catalog from stored bytes.
    ///
    /// Every record is checked for intact markers, unique ids, and members
    /// whose descriptors precede their parent.
    pub fn from_bytes(bytes: Vec<u8>, limit: Option<usize>) -> Result<Self> {
        if let Some(limit) = limit
            && bytes.len() > limit
        {
            return Err(FxsdError::SectionTooLarge {
                section: SectionKind::Catalog,
                length: bytes.len(),
                limit,
            });
        }

        let mut section = ByteSection::from_bytes(bytes, limit);
        let mut entries: Vec<TypeEntry> = Vec::new();

        while section.remaining() > 0 {
            let offset = section.position();
            let raw = read_descriptor(&mut section).map_err(|err| match err {
                FxsdError::OutOfBounds { .. } => {
                    FxsdError::corrupt_catalog(offset, "descriptor record is cut short")
                }
                other => other,
            })?;

            if entries.iter().any(|entry| entry.id == raw.id) {
                return Err(FxsdError::corrupt_catalog(
                    offset,
                    format!("duplicate descriptor for type id {}", raw.id),
                ));
            }
            for member in &raw.members {
                if !entries.iter().any(|entry| entry.id == member.type_id) {
                    return Err(FxsdError::corrupt_catalog(
                        offset,
                        format!(
                            "type id {} lists member type id {} before its descriptor",
                            raw.id, member.type_id
                        ),
                    ));
                }
            }

            entries.push(TypeEntry {
                id: raw.id,
                offset: entry_offset(offset)?,
            });
        }

        Ok(Self { section, entries })
    }

    /// True iff a descriptor with this id has been registered.
    #[must_use]
    pub fn is_registered(&self, type_id: u16) -> bool {
        self.entries.iter().any(|entry| entry.id == type_id)
    }

    /// Index row for a registered id.
    #[must_use]
    pub fn entry(&self, type_id: u16) -> Option<&TypeEntry> {
        self.entries.iter().find(|entry| entry.id == type_id)
    }

    /// All index rows in registration order.
    #[must_use]
    pub fn entries(&self) -> &[TypeEntry] {
        &self.entries
    }

    /// Size of the catalog in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.section.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.section.is_empty()
    }

    /// Raw catalog bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.section.as_bytes()
    }

    /// Register a type with no members. Returns `false` if it was already present.
    pub fn register_leaf(&mut self, type_id: u16, size: u16) -> Result<bool> {
        self.register_composite(type_id, size, &[])
    }

    /// Register a composite type. Returns `false` if it was already present.
    ///
    /// Every member type must already be registered; the caller walks the
    /// member types first so nested descriptors precede their parent.
    pub fn register_composite(
        &mut self,
        type_id: u16,
        size: u16,
        members: &[MemberShape],
    ) -> Result<bool> {
        if self.is_registered(type_id) {
            return Ok(false);
        }
        if members.len() > MAX_MEMBERS {
            return Err(FxsdError::TooManyMembers {
                type_id,
                count: members.len(),
            });
        }
        if let Some(missing) = members.iter().find(|m| !self.is_registered(m.type_id)) {
            return Err(FxsdError::UnknownType {
                type_id: missing.type_id,
            });
        }

        let offset = self.section.len();
        let entry = TypeEntry {
            id: type_id,
            offset: entry_offset(offset)?,
        };

        self.section.seek(offset)?;
        self.section
            .ensure_writable(RECORD_OVERHEAD + members.len() * MEMBER_LEN)?;

        self.section.write_u8(TYPE_ENTRY_START)?;
        self.section.write_u16(type_id)?;
        self.section.write_u16(size)?;
        // Bounded by MAX_MEMBERS above.
        self.section.write_u8(members.len() as u8)?;
        for member in members {
            self.section.write_u16(member.size)?;
            self.section.write_u16(member.type_id)?;
        }
        self.section.write_u8(TYPE_ENTRY_END)?;

        self.entries.push(entry);
        debug!(
            type_id,
            size,
            members = members.len(),
            offset,
            "registered type descriptor"
        );
        Ok(true)
    }

    /// Byte offset of the descriptor for `type_id`.
    ///
    /// Scans records from the start, validating the markers of every record
    /// it passes. The cursor is restored whether or not the scan succeeds.
    pub fn find_entry_offset(&mut self, type_id: u16) -> Result<usize> {
        self.section.preserve_cursor(|section| {
            section.rewind();
            while section.remaining() > 0 {
                let offset = section.position();
                expect_marker(section, TYPE_ENTRY_START)?;
                if section.read_u16()? == type_id {
                    return Ok(offset);
                }
                section.skip(2)?;
                let count = section.read_u8()? as usize;
                section.skip(count * MEMBER_LEN)?;
                expect_marker(section, TYPE_ENTRY_END)?;
            }
            Err(FxsdError::UnknownType { type_id })
        })
    }

    /// Parse the descriptor record starting at `offset` without resolving members.
    pub fn read_raw(&mut self, offset: usize) -> Result<RawDescriptor> {
        self.section.preserve_cursor(|section| {
            section.seek(offset)?;
            read_descriptor(section)
        })
    }

    /// Resolve `type_id` into a descriptor tree.
    pub fn resolve(&mut self, type_id: u16) -> Result<TypeDescriptor> {
        self.resolve_nested(type_id, 0)
    }

    fn resolve_nested(&mut self, type_id: u16, depth: usize) -> Result<TypeDescriptor> {
        let offset = self.find_entry_offset(type_id)?;
        if depth > MAX_RESOLVE_DEPTH {
            return Err(FxsdError::corrupt_catalog(
                offset,
                format!("type id {type_id} nests deeper than {MAX_RESOLVE_DEPTH} levels"),
            ));
        }

        let raw = self.read_raw(offset)?;
        let mut members = Vec::with_capacity(raw.members.len());
        for member in &raw.members {
            let resolved = self.resolve_nested(member.type_id, depth + 1)?;
            if resolved.size != member.size {
                return Err(FxsdError::corrupt_catalog(
                    offset,
                    format!(
                        "type id {} declares member type id {} with size {}, descriptor says {}",
                        raw.id, member.type_id, member.size, resolved.size
                    ),
                ));
            }
            members.push(resolved);
        }

        Ok(TypeDescriptor {
            id: raw.id,
            size: raw.size,
            members,
        })
    }

    /// Resolve every registered type, in registration order.
    pub fn descriptors(&mut self) -> Result<Vec<TypeDescriptor>> {
        let ids: Vec<u16> = self.entries.iter().map(|entry| entry.id).collect();
        ids.into_iter().map(|id| self.resolve(id)).collect()
    }
}

fn entry_offset(offset: usize) -> Result<u32> {
    u32::try_from(offset).map_err(|_| FxsdError::SectionTooLarge {
        section: SectionKind::Catalog,
        length: offset,
        limit: u32::MAX as usize,
    })
}

fn expect_marker(section: &mut ByteSection, expected: u8) -> Result<()> {
    let offset = section.position();
    let found = section.read_u8()?;
    if found != expected {
        return Err(FxsdError::Framing {
            section: SectionKind::Catalog,
            offset,
            expected,
            found,
        });
    }
    Ok(())
}

fn read_descriptor(section: &mut ByteSection) -> Result<RawDescriptor> {
    expect_marker(section, TYPE_ENTRY_START)?;
    let id = section.read_u16()?;
    let size = section.read_u16()?;
    let count = section.read_u8()?;

    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let size = section.read_u16()?;
        let type_id = section.read_u16()?;
        members.push(MemberShape { size, type_id });
    }

    expect_marker(section, TYPE_ENTRY_END)?;
    Ok(RawDescriptor { id, size, members })
}
