//! Data page header.

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::{Error, Result};

/// Record bookkeeping at the start of a data page body.
///
/// # Layout (5 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       2     last_insert_offset (i16)
/// 2       2     record_count (i16)
/// 4       1     is_dirty (0 or 1)
/// ```
///
/// The dirty byte is persisted with the page but carries no meaning on disk:
/// whoever loads a page resets it, since the loaded copy matches the file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Offset of the last inserted record within the record area.
    pub last_insert_offset: u16,
    /// Number of records on the page.
    pub record_count: u16,
    /// Page differs from its on-disk image.
    pub is_dirty: bool,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 5;

    pub fn new(last_insert_offset: u16, record_count: u16, is_dirty: bool) -> Self {
        Self {
            last_insert_offset,
            record_count,
            is_dirty,
        }
    }

    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let last_insert_offset = reader.read_u16()?;
        let record_count = reader.read_u16()?;
        let is_dirty = match reader.read_u8()? {
            0 => false,
            1 => true,
            other => return Err(Error::Corrupted(format!("bad dirty flag byte {}", other))),
        };
        Ok(Self::new(last_insert_offset, record_count, is_dirty))
    }

    pub fn write_to(&self, writer: &mut ByteWriter<'_>) {
        writer.write_u16(self.last_insert_offset);
        writer.write_u16(self.record_count);
        writer.write_u8(self.is_dirty as u8);
    }
}

// ============================================================================
// TESTS
// ============================================================================
