//! Page - the fundamental 16KB unit of storage.
//!
//! A [`Page`] is the decoded form of one page-sized block of a table file.
//! The first byte of every block names its format; [`Page::deserialize`]
//! dispatches on it through [`PageType::deserializer`].

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result};
use crate::storage::fsp::FspHeader;

use super::{DataPage, FileHeader, PageType};

/// Decoder for one page format.
pub type Deserializer = fn(&[u8]) -> Result<Page>;

impl PageType {
    /// The decoder registered for this page type.
    pub fn deserializer(self) -> Deserializer {
        match self {
            PageType::Data => read_data_page,
            PageType::FspHeader => read_fsp_header,
        }
    }
}

fn read_data_page(data: &[u8]) -> Result<Page> {
    Ok(Page::Data(DataPage::read_from(&mut ByteReader::new(data))?))
}

fn read_fsp_header(data: &[u8]) -> Result<Page> {
    let header = FspHeader::read_from(&mut ByteReader::new(data))?;
    Ok(Page::FspHeader(Box::new(header)))
}

/// A decoded page.
///
/// # Example
/// ```
/// use extentdb::common::config::PAGE_SIZE;
/// use extentdb::storage::page::{DataPage, Page};
///
/// let page = Page::from(DataPage::new(3));
/// let mut buf = vec![0u8; PAGE_SIZE];
/// page.serialize_into(&mut buf).unwrap();
/// assert_eq!(Page::deserialize(&buf).unwrap(), page);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Data(DataPage),
    FspHeader(Box<FspHeader>),
}

impl Page {
    #[inline]
    pub fn page_number(&self) -> u32 {
        self.file_header().page_number()
    }

    #[inline]
    pub fn page_type(&self) -> PageType {
        self.file_header().page_type()
    }

    pub fn file_header(&self) -> &FileHeader {
        match self {
            Page::Data(page) => page.file_header(),
            Page::FspHeader(header) => header.file_header(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Page::Data(page) => page.is_dirty(),
            Page::FspHeader(header) => header.is_dirty(),
        }
    }

    pub fn mark_dirty(&mut self) {
        match self {
            Page::Data(page) => page.mark_dirty(),
            Page::FspHeader(header) => header.mark_dirty(),
        }
    }

    pub fn mark_clean(&mut self) {
        match self {
            Page::Data(page) => page.mark_clean(),
            Page::FspHeader(header) => header.mark_clean(),
        }
    }

    pub fn as_data(&self) -> Option<&DataPage> {
        match self {
            Page::Data(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_data_mut(&mut self) -> Option<&mut DataPage> {
        match self {
            Page::Data(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_fsp_header(&self) -> Option<&FspHeader> {
        match self {
            Page::FspHeader(header) => Some(header),
            _ => None,
        }
    }

    pub fn as_fsp_header_mut(&mut self) -> Option<&mut FspHeader> {
        match self {
            Page::FspHeader(header) => Some(header),
            _ => None,
        }
    }

    /// Error describing this page when a different format was required.
    pub(crate) fn unexpected(&self, expected: PageType) -> Error {
        Error::UnexpectedPageType {
            page_number: self.page_number(),
            expected: expected.name(),
            actual: self.page_type().name(),
        }
    }

    /// Write the full page image into `buf`, zeroing unused bytes.
    ///
    /// # Errors
    /// `Error::BufferSizeMismatch` unless `buf` is exactly `PAGE_SIZE` bytes.
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != PAGE_SIZE {
            return Err(Error::BufferSizeMismatch {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }
        buf.fill(0);
        let mut writer = ByteWriter::new(buf);
        match self {
            Page::Data(page) => page.write_to(&mut writer),
            Page::FspHeader(header) => header.write_to(&mut writer),
        }
        Ok(())
    }

    /// Decode a page image, dispatching on its type byte.
    ///
    /// # Errors
    /// - `Error::UnknownPageType` on an unrecognised type byte
    /// - `Error::Corrupted` on truncated or inconsistent contents
    pub fn deserialize(data: &[u8]) -> Result<Page> {
        let page_type = FileHeader::peek_page_type(data)?;
        page_type.deserializer()(data)
    }
}

impl From<DataPage> for Page {
    fn from(page: DataPage) -> Self {
        Page::Data(page)
    }
}

impl From<FspHeader> for Page {
    fn from(header: FspHeader) -> Self {
        Page::FspHeader(Box::new(header))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(page: &Page) -> Page {
        let mut buf = vec![0u8; PAGE_SIZE];
        page.serialize_into(&mut buf).unwrap();
        Page::deserialize(&buf).unwrap()
    }

    #[test]
    fn test_data_page_dispatch() {
        let page = Page::from(DataPage::new(3));
        let recovered = roundtrip(&page);

        assert_eq!(recovered.page_type(), PageType::Data);
        assert_eq!(recovered.page_number(), 3);
        assert_eq!(recovered, page);
    }

    #[test]
    fn test_fsp_header_dispatch() {
        let mut header = FspHeader::new(7);
        header.allocate_page().unwrap();
        let page = Page::from(header);

        let recovered = roundtrip(&page);
        assert_eq!(recovered.page_type(), PageType::FspHeader);
        assert_eq!(recovered.page_number(), 0);
        assert_eq!(recovered.as_fsp_header().unwrap().space_id(), 7);
        assert_eq!(recovered, page);
    }

    #[test]
    fn test_serialize_zeroes_stale_bytes() {
        let page = Page::from(DataPage::new(1));
        let mut buf = vec![0xEE; PAGE_SIZE];
        page.serialize_into(&mut buf).unwrap();
        assert_eq!(buf[PAGE_SIZE - 1], 0);
    }

    #[test]
    fn test_serialize_rejects_wrong_buffer() {
        let page = Page::from(DataPage::new(1));
        let mut buf = vec![0u8; 100];
        assert!(matches!(
            page.serialize_into(&mut buf),
            Err(Error::BufferSizeMismatch { expected: PAGE_SIZE, actual: 100 })
        ));
    }

    #[test]
    fn test_unknown_type_byte() {
        let mut buf = vec![0u8; PAGE_SIZE];
        buf[0] = 42;
        assert!(matches!(Page::deserialize(&buf), Err(Error::UnknownPageType(42))));
    }

    #[test]
    fn test_dirty_flag_delegation() {
        let mut page = Page::from(DataPage::new(2));
        assert!(!page.is_dirty());
        page.mark_dirty();
        assert!(page.as_data().unwrap().is_dirty());
        page.mark_clean();
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_typed_accessors() {
        let mut page = Page::from(DataPage::new(2));
        assert!(page.as_data_mut().is_some());
        assert!(page.as_fsp_header().is_none());
        assert!(matches!(
            page.unexpected(PageType::FspHeader),
            Error::UnexpectedPageType { page_number: 2, .. }
        ));
    }
}
