//! Data page: record storage.

use crate::common::bytes::{ByteReader, ByteWriter};
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result};

use super::{FileHeader, PageHeader, PageType};

/// Bytes available for records on an empty data page.
pub const DATA_PAGE_CAPACITY: usize = PAGE_SIZE - (FileHeader::SIZE + PageHeader::SIZE + 2);

/// A page holding raw record bytes.
///
/// Record layout inside the record area belongs to the layer above; this
/// type only keeps the bytes, the bookkeeping header and the dirty flag.
///
/// # Layout (PAGE_SIZE bytes)
/// ```text
/// Offset  Size        Field
/// ------  ----        -----
/// 0       13          FileHeader
/// 13      5           PageHeader
/// 18      2           free_space (i16)
/// 20      free_space  record bytes
/// ...                 zero padding
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPage {
    file_header: FileHeader,
    page_header: PageHeader,
    records: Vec<u8>,
}

impl DataPage {
    /// A fresh, clean, empty data page.
    pub fn new(page_number: u32) -> Self {
        Self {
            file_header: FileHeader::new(PageType::Data, page_number),
            page_header: PageHeader::default(),
            records: vec![0u8; DATA_PAGE_CAPACITY],
        }
    }

    #[inline]
    pub fn page_number(&self) -> u32 {
        self.file_header.page_number()
    }

    #[inline]
    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    /// Mutable sibling links. Marks the page dirty.
    pub fn file_header_mut(&mut self) -> &mut FileHeader {
        self.page_header.is_dirty = true;
        &mut self.file_header
    }

    #[inline]
    pub fn page_header(&self) -> &PageHeader {
        &self.page_header
    }

    /// Mutable record bookkeeping. Marks the page dirty.
    pub fn page_header_mut(&mut self) -> &mut PageHeader {
        self.page_header.is_dirty = true;
        &mut self.page_header
    }

    /// Size of the record area in bytes.
    #[inline]
    pub fn free_space(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn record_data(&self) -> &[u8] {
        &self.records
    }

    /// Mutable record area. Marks the page dirty.
    pub fn record_data_mut(&mut self) -> &mut [u8] {
        self.page_header.is_dirty = true;
        &mut self.records
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.page_header.is_dirty
    }

    pub fn mark_dirty(&mut self) {
        self.page_header.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.page_header.is_dirty = false;
    }

    /// Read a full data page, file header included.
    ///
    /// # Errors
    /// `Error::Corrupted` if the free-space counter is negative or larger
    /// than what is left of the page.
    pub fn read_from(reader: &mut ByteReader<'_>) -> Result<Self> {
        let file_header = FileHeader::read_from(reader)?;
        let page_header = PageHeader::read_from(reader)?;
        let free_space = reader.read_i16()?;
        let free_space = usize::try_from(free_space)
            .map_err(|_| Error::Corrupted(format!("negative free space {}", free_space)))?;
        if free_space > reader.remaining() {
            return Err(Error::Corrupted(format!(
                "free space {} exceeds the {} bytes left on page {}",
                free_space,
                reader.remaining(),
                file_header.page_number()
            )));
        }
        let records = reader.read_bytes(free_space)?.to_vec();

        Ok(Self {
            file_header,
            page_header,
            records,
        })
    }

    /// Write the full page image, file header included.
    pub fn write_to(&self, writer: &mut ByteWriter<'_>) {
        self.file_header.write_to(writer);
        self.page_header.write_to(writer);
        writer.write_i16(self.records.len() as i16);
        writer.write_bytes(&self.records);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(page: &DataPage) -> DataPage {
        let mut buf = vec![0u8; PAGE_SIZE];
        page.write_to(&mut ByteWriter::new(&mut buf));
        DataPage::read_from(&mut ByteReader::new(&buf)).unwrap()
    }

    #[test]
    fn test_new_data_page() {
        let page = DataPage::new(3);
        assert_eq!(page.page_number(), 3);
        assert_eq!(page.file_header().page_type(), PageType::Data);
        assert_eq!(page.free_space(), 16364);
        assert!(!page.is_dirty());
        assert!(page.record_data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_record_mutation_marks_dirty() {
        let mut page = DataPage::new(1);
        page.record_data_mut()[..5].copy_from_slice(b"hello");
        assert!(page.is_dirty());
        assert_eq!(&page.record_data()[..5], b"hello");

        page.mark_clean();
        page.page_header_mut().record_count = 1;
        assert!(page.is_dirty());
    }

    #[test]
    fn test_data_page_roundtrip() {
        let mut page = DataPage::new(9);
        page.file_header_mut().set_next_page(Some(10));
        page.record_data_mut()[100] = 0xAB;
        *page.page_header_mut() = PageHeader::new(100, 1, true);

        let recovered = roundtrip(&page);
        assert_eq!(recovered, page);
        assert!(recovered.is_dirty());
        assert_eq!(recovered.file_header().next_page(), Some(10));
    }

    #[test]
    fn test_data_page_byte_layout() {
        let page = DataPage::new(3);
        let mut buf = vec![0u8; PAGE_SIZE];
        page.write_to(&mut ByteWriter::new(&mut buf));

        assert_eq!(buf[0], PageType::Data as u8);
        assert_eq!(&buf[1..5], &3i32.to_le_bytes());
        assert_eq!(&buf[18..20], &16364i16.to_le_bytes());
    }

    #[test]
    fn test_oversized_free_space_is_corruption() {
        let page = DataPage::new(3);
        let mut buf = vec![0u8; PAGE_SIZE];
        page.write_to(&mut ByteWriter::new(&mut buf));
        buf[18..20].copy_from_slice(&16365i16.to_le_bytes());

        let result = DataPage::read_from(&mut ByteReader::new(&buf));
        assert!(matches!(result, Err(Error::Corrupted(_))));
    }
}
