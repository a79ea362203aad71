//! Byte section: a cursor-addressed byte buffer with big-endian integer codecs.
//!
//! Every read and write happens at the cursor and advances it by the
//! operand width. Operations that would move the cursor past the readable
//! extent (reads) or past the configured hard cap (writes) fail with
//! [`FxsdError::OutOfBounds`] before touching the buffer. Without a cap the
//! section grows on demand.

use crate::error::{FxsdError, Result};

/// A saved cursor position and buffer length, used to undo a partial write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    index: usize,
    len: usize,
}

/// A mutable byte buffer with a single read/write cursor.
#[derive(Debug, Clone, Default)]
pub struct ByteSection {
    data: Vec<u8>,
    index: usize,
    limit: Option<usize>,
}

impl ByteSection {
    /// Create an empty, growable section.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            index: 0,
            limit: None,
        }
    }

    /// Create an empty section that refuses to grow past `limit` bytes.
    #[must_use]
    pub fn bounded(capacity: usize, limit: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.min(limit)),
            index: 0,
            limit: Some(limit),
        }
    }

    /// Wrap existing bytes with the cursor at the start.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>, limit: Option<usize>) -> Self {
        Self {
            data,
            index: 0,
            limit,
        }
    }

    /// Current cursor position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }

    /// Number of bytes held by the section.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the section holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The hard cap on the section size, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes left to read after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// All bytes held by the section.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Move the cursor to `position`.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(FxsdError::OutOfBounds {
                offset: position,
                width: 0,
                size: self.data.len(),
            });
        }
        self.index = position;
        Ok(())
    }

    /// Move the cursor past the last byte, where appends go.
    pub fn seek_end(&mut self) {
        self.index = self.data.len();
    }

    /// Move the cursor back to the start.
    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Run `f` and put the cursor back where it was, whatever `f` returns.
    pub fn preserve_cursor<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.index;
        let result = f(self);
        self.index = saved;
        result
    }

    /// Remember the cursor and length so a failed write can be undone.
    #[must_use]
    pub fn mark(&self) -> Mark {
        Mark {
            index: self.index,
            len: self.data.len(),
        }
    }

    /// Restore a [`Mark`]: bytes appended since are dropped and the cursor returns.
    pub fn reset_to(&mut self, mark: Mark) {
        if self.data.len() > mark.len {
            self.data.truncate(mark.len);
        }
        self.index = mark.index.min(self.data.len());
    }

    /// Check that `width` more bytes can be written at the cursor.
    pub fn ensure_writable(&self, width: usize) -> Result<()> {
        self.write_end(width).map(|_| ())
    }

    fn write_end(&self, width: usize) -> Result<usize> {
        let out_of_bounds = || FxsdError::OutOfBounds {
            offset: self.index,
            width,
            size: self.limit.unwrap_or(usize::MAX),
        };
        let end = self.index.checked_add(width).ok_or_else(out_of_bounds)?;
        match self.limit {
            Some(limit) if end > limit => Err(out_of_bounds()),
            _ => Ok(end),
        }
    }

    fn read_end(&self, width: usize) -> Result<usize> {
        let end = self.index.checked_add(width);
        match end {
            Some(end) if end <= self.data.len() => Ok(end),
            _ => Err(FxsdError::OutOfBounds {
                offset: self.index,
                width,
                size: self.data.len(),
            }),
        }
    }

    ////////////////////////
    // Write functions
    ////////////////////////

    /// Write a raw run of bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.write_end(bytes.len())?;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.index..end].copy_from_slice(bytes);
        self.index = end;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    ////////////////////////
    // Read functions
    ////////////////////////

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        let start = self.index;
        let end = self.read_end(len)?;
        self.index = end;
        Ok(&self.data[start..end])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Advance the cursor over `len` bytes without decoding them.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.index = self.read_end(len)?;
        Ok(())
    }
}
