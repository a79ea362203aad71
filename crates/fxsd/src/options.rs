//! Serializer session options.

use crate::section::ByteSection;

/// Default initial allocation of each section, in bytes.
pub const DEFAULT_INITIAL_CAPACITY: usize = 10_000;

/// Options for a [`Serializer`](crate::Serializer) session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerOptions {
    /// Bytes allocated up front for each section (default: 10 000).
    pub initial_capacity: usize,
    /// Hard cap on each section's size. `None` lets sections grow (default).
    pub max_section_size: Option<usize>,
    /// Check each record's catalog shape against its field list on read (default: false).
    pub verify_shapes: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_section_size: None,
            verify_shapes: false,
        }
    }
}

impl SerializerOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial allocation of each section.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Cap each section at `limit` bytes.
    #[must_use]
    pub fn with_max_section_size(mut self, limit: usize) -> Self {
        self.max_section_size = Some(limit);
        self
    }

    /// Enable or disable shape verification on read.
    #[must_use]
    pub fn with_verify_shapes(mut self, enable: bool) -> Self {
        self.verify_shapes = enable;
        self
    }

    /// A fresh, empty section sized by these options.
    pub(crate) fn new_section(&self) -> ByteSection {
        match self.max_section_size {
            Some(limit) => ByteSection::bounded(self.initial_capacity, limit),
            None => ByteSection::with_capacity(self.initial_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SerializerOptions::default();
        assert_eq!(opts.initial_capacity, 10_000);
        assert_eq!(opts.max_section_size, None);
        assert!(!opts.verify_shapes);
        assert_eq!(opts.new_section().limit(), None);
    }

    #[test]
    fn test_builder() {
        let opts = SerializerOptions::new()
            .with_initial_capacity(64)
            .with_max_section_size(128)
            .with_verify_shapes(true);
        assert_eq!(opts.initial_capacity, 64);
        assert_eq!(opts.max_section_size, Some(128));
        assert!(opts.verify_shapes);
        assert_eq!(opts.new_section().limit(), Some(128));
    }
}
