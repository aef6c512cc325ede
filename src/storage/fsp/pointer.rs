//! Intra-page address of an extent descriptor.

use std::fmt;

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::Result;

/// Position of an extent descriptor: a page number plus a byte offset into
/// that page's descriptor array.
///
/// Pointers are plain values. They are resolved only against the `entries`
/// array of the FSP header they were taken from, never against file offsets.
///
/// # Layout (8 bytes)
/// ```text
/// Offset  Size  Field
/// 0       4     page_number (i32)
/// 4       4     offset (i32)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pointer {
    page_number: i32,
    offset: i32,
}

impl Pointer {
    /// Serialized size in bytes.
    pub const SIZE: usize = 4 + 4;

    /// The null pointer: no target.
    pub const NULL: Pointer = Pointer {
        page_number: -1,
        offset: -1,
    };

    #[inline]
    pub fn new(page_number: i32, offset: i32) -> Self {
        Self {
            page_number,
            offset,
        }
    }

    /// Pointer to byte `offset` of the descriptor array on page 0.
    #[inline]
    pub fn to_entry(offset: usize) -> Self {
        Self::new(0, offset as i32)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    #[inline]
    pub fn page_number(&self) -> i32 {
        self.page_number
    }

    #[inline]
    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let page_number = reader.read_i32()?;
        let offset = reader.read_i32()?;
        Ok(Self::new(page_number, offset))
    }

    pub fn write_to(&self, writer: &mut ByteWriter<'_>) {
        writer.write_i32(self.page_number);
        writer.write_i32(self.offset);
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Pointer(NULL)")
        } else {
            write!(f, "Pointer({}+{})", self.page_number, self.offset)
        }
    }
}
