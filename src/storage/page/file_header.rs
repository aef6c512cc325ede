//! Common page prefix and page type definitions.
//!
//! Every page starts with a [`FileHeader`] containing:
//! - [`PageType`] discriminator
//! - the page's own number
//! - optional previous/next sibling page numbers

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::{Error, Result};

/// Type of page stored on disk.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    /// Record-holding data page.
    Data = 0,
    /// File-space header (always page 0).
    FspHeader = 1,
}

impl PageType {
    /// Convert from the on-disk code.
    ///
    /// # Errors
    /// `Error::UnknownPageType` for any other byte. Unlike a cache miss this
    /// is never recoverable: the file is not ours or is damaged.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(PageType::Data),
            1 => Ok(PageType::FspHeader),
            other => Err(Error::UnknownPageType(other)),
        }
    }

    /// Human-readable name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            PageType::Data => "data",
            PageType::FspHeader => "FSP header",
        }
    }
}

/// Metadata stored at the beginning of every page.
///
/// # Layout (13 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     page_number (i32, little-endian)
/// 5       4     prev_page (i32, -1 = none)
/// 9       4     next_page (i32, -1 = none)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    page_type: PageType,
    page_number: u32,
    prev_page: Option<u32>,
    next_page: Option<u32>,
}

impl FileHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 13;

    /// On-disk value of an absent sibling.
    const NO_PAGE: i32 = -1;

    /// Create a header with no siblings.
    pub fn new(page_type: PageType, page_number: u32) -> Self {
        Self::with_siblings(page_type, page_number, None, None)
    }

    pub fn with_siblings(
        page_type: PageType,
        page_number: u32,
        prev_page: Option<u32>,
        next_page: Option<u32>,
    ) -> Self {
        Self {
            page_type,
            page_number,
            prev_page,
            next_page,
        }
    }

    #[inline]
    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    #[inline]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    #[inline]
    pub fn prev_page(&self) -> Option<u32> {
        self.prev_page
    }

    #[inline]
    pub fn next_page(&self) -> Option<u32> {
        self.next_page
    }

    pub fn set_prev_page(&mut self, prev_page: Option<u32>) {
        self.prev_page = prev_page;
    }

    pub fn set_next_page(&mut self, next_page: Option<u32>) {
        self.next_page = next_page;
    }

    /// Read a header from the reader's current position.
    ///
    /// # Errors
    /// - `Error::UnknownPageType` on a bad type byte
    /// - `Error::Corrupted` on a negative page number or truncated input
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let page_type = PageType::from_u8(reader.read_u8()?)?;
        let page_number = reader.read_i32()?;
        let page_number = u32::try_from(page_number)
            .map_err(|_| Error::Corrupted(format!("negative page number {}", page_number)))?;
        let prev_page = Self::decode_sibling(reader.read_i32()?)?;
        let next_page = Self::decode_sibling(reader.read_i32()?)?;

        Ok(Self::with_siblings(page_type, page_number, prev_page, next_page))
    }

    pub fn write_to(&self, writer: &mut ByteWriter<'_>) {
        writer.write_u8(self.page_type as u8);
        writer.write_u32(self.page_number);
        writer.write_i32(Self::encode_sibling(self.prev_page));
        writer.write_i32(Self::encode_sibling(self.next_page));
    }

    /// Peek at the type byte of a serialized page without decoding the rest.
    pub fn peek_page_type(data: &[u8]) -> Result<PageType> {
        let byte = data
            .first()
            .copied()
            .ok_or_else(|| Error::truncated("empty page"))?;
        PageType::from_u8(byte)
    }

    fn encode_sibling(page: Option<u32>) -> i32 {
        page.map_or(Self::NO_PAGE, |n| n as i32)
    }

    fn decode_sibling(raw: i32) -> Result<Option<u32>> {
        match raw {
            Self::NO_PAGE => Ok(None),
            n if n >= 0 => Ok(Some(n as u32)),
            n => Err(Error::Corrupted(format!("bad sibling page number {}", n))),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
