//! Table space - page allocation for one table file.
//!
//! A [`TableSpace`] ties a table name to the FSP header in page 0 of its
//! file. All access goes through the [`BufferPool`], so the header is cached,
//! mutated in place and written back like any other page.

use log::{debug, info};

use crate::buffer::BufferPool;
use crate::catalog::Metadata;
use crate::common::{Error, PageId, Result};
use crate::storage::fsp::{FspHeader, FSP_HEADER_PAGE};
use crate::storage::page::{DataPage, Page, PageType};

/// Handle to one table's file space.
///
/// Holds only the table name; the pool is passed to each call so one pool
/// can serve many spaces.
///
/// # Example
/// ```ignore
/// let space = TableSpace::create(&mut pool, "jazz", 1)?;
/// let page_number = space.allocate_page(&mut pool)?.page_number();
/// space.deallocate_page(&mut pool, page_number)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpace {
    name: String,
}

impl TableSpace {
    /// Initialise a new space and write its header page to disk.
    ///
    /// # Errors
    /// `Error::AlreadyExists` if the table already has a file or a cached
    /// header page.
    pub fn create(pool: &mut BufferPool, name: impl Into<String>, space_id: u32) -> Result<Self> {
        let space = Self { name: name.into() };
        let header_id = space.header_id();
        if pool.contains_page(&header_id) || pool.file_manager().table_exists(&space.name) {
            return Err(Error::AlreadyExists(format!("table space {}", space.name)));
        }

        let mut header = FspHeader::new(space_id);
        header.mark_dirty();
        pool.put_page(header_id.clone(), Page::from(header))?;
        pool.flush_page(&header_id)?;

        info!("created table space {} (space id {})", space.name, space_id);
        Ok(space)
    }

    /// Attach to an existing space, loading its header page.
    ///
    /// # Errors
    /// `Error::UnexpectedPageType` if page 0 is not an FSP header.
    pub fn open(pool: &mut BufferPool, name: impl Into<String>) -> Result<Self> {
        let space = Self { name: name.into() };
        space.header_mut(pool)?;
        Ok(space)
    }

    /// Allocate a page and cache a fresh, dirty data page for it.
    ///
    /// # Errors
    /// `Error::SpaceFull` once all 16,383 data pages are taken.
    pub fn allocate_page<'a>(&self, pool: &'a mut BufferPool) -> Result<&'a mut Page> {
        let page_number = self.header_mut(pool)?.allocate_page()?;

        let mut data = DataPage::new(page_number);
        data.mark_dirty();
        debug!("{}: allocated page {}", self.name, page_number);

        pool.put_page(self.page_id(page_number), Page::from(data))
    }

    /// Free `page_number` and drop its cached copy.
    ///
    /// # Errors
    /// `Error::InvalidPageNumber` / `Error::PageNotAllocated` from the header.
    pub fn deallocate_page(&self, pool: &mut BufferPool, page_number: u32) -> Result<()> {
        self.header_mut(pool)?.deallocate_page(page_number)?;
        pool.remove_page(&self.page_id(page_number))?;
        debug!("{}: deallocated page {}", self.name, page_number);
        Ok(())
    }

    /// Load the root page of the table's clustered index.
    pub fn fetch_root<'a>(&self, pool: &'a mut BufferPool, metadata: &Metadata) -> Result<&'a mut Page> {
        let root = metadata.clustered_index()?.root_page_number();
        pool.get_page(&self.page_id(root))
    }

    /// The cached FSP header of this space.
    pub fn header<'a>(&self, pool: &'a mut BufferPool) -> Result<&'a FspHeader> {
        self.header_mut(pool).map(|header| &*header)
    }

    /// Write the header page back if it changed.
    pub fn flush(&self, pool: &mut BufferPool) -> Result<()> {
        pool.flush_page(&self.header_id())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn page_id(&self, page_number: u32) -> PageId {
        PageId::new(self.name.as_str(), page_number)
    }

    #[inline]
    pub fn header_id(&self) -> PageId {
        self.page_id(FSP_HEADER_PAGE)
    }

    fn header_mut<'a>(&self, pool: &'a mut BufferPool) -> Result<&'a mut FspHeader> {
        let page = pool.get_page(&self.header_id())?;
        if page.page_type() != PageType::FspHeader {
            return Err(page.unexpected(PageType::FspHeader));
        }
        page.as_fsp_header_mut()
            .ok_or_else(|| Error::Corrupted("FSP header page lost its type".to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::replacer::LruStrategy;
    use crate::catalog::{Column, DataType, Index, IndexType};
    use crate::common::config::{StorageConfig, PAGE_SIZE};
    use tempfile::{tempdir, TempDir};

    fn setup(capacity: usize) -> (TempDir, BufferPool) {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempdir().unwrap();
        let config = StorageConfig::new(dir.path()).with_io_memory(PAGE_SIZE * 2);
        let pool = BufferPool::open(config, LruStrategy::new(capacity)).unwrap();
        (dir, pool)
    }

    #[test]
    fn test_create_writes_header() {
        let (_dir, mut pool) = setup(4);
        let space = TableSpace::create(&mut pool, "jazz", 5).unwrap();

        let on_disk = pool.file_manager().load_page("jazz", 0).unwrap();
        let header = on_disk.as_fsp_header().unwrap();
        assert_eq!(header.space_id(), 5);
        assert_eq!(header.size(), 1);
        assert!(!space.header(&mut pool).unwrap().is_dirty());
    }

    #[test]
    fn test_create_twice_fails() {
        let (_dir, mut pool) = setup(4);
        TableSpace::create(&mut pool, "jazz", 1).unwrap();
        assert!(matches!(
            TableSpace::create(&mut pool, "jazz", 1),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_allocate_caches_dirty_data_page() {
        let (_dir, mut pool) = setup(4);
        let space = TableSpace::create(&mut pool, "jazz", 1).unwrap();

        let page = space.allocate_page(&mut pool).unwrap();
        assert_eq!(page.page_number(), 1);
        assert_eq!(page.page_type(), PageType::Data);
        assert!(page.is_dirty());

        assert_eq!(space.allocate_page(&mut pool).unwrap().page_number(), 2);
        assert!(pool.contains_page(&space.page_id(2)));
        assert!(space.header(&mut pool).unwrap().is_dirty());
    }

    #[test]
    fn test_deallocate_drops_cached_page() {
        let (_dir, mut pool) = setup(4);
        let space = TableSpace::create(&mut pool, "jazz", 1).unwrap();
        space.allocate_page(&mut pool).unwrap();

        space.deallocate_page(&mut pool, 1).unwrap();
        assert!(!pool.contains_page(&space.page_id(1)));
        assert!(!space.header(&mut pool).unwrap().is_page_allocated(1).unwrap());

        assert!(matches!(
            space.deallocate_page(&mut pool, 1),
            Err(Error::PageNotAllocated(1))
        ));
    }

    #[test]
    fn test_reopen_after_flush() {
        let (_dir, mut pool) = setup(4);
        let space = TableSpace::create(&mut pool, "jazz", 1).unwrap();
        for _ in 0..3 {
            space.allocate_page(&mut pool).unwrap();
        }
        pool.flush_all_pages().unwrap();
        pool.remove_page(&space.header_id()).unwrap();

        let reopened = TableSpace::open(&mut pool, "jazz").unwrap();
        let header = reopened.header(&mut pool).unwrap();
        assert_eq!(header.size(), 4);
        assert_eq!(header.allocated_pages().unwrap(), 4);
    }

    #[test]
    fn test_header_survives_eviction() {
        // Capacity 1: every allocation evicts the header and reloads it.
        let (_dir, mut pool) = setup(1);
        let space = TableSpace::create(&mut pool, "jazz", 1).unwrap();
        for expected in 1..=5 {
            let page = space.allocate_page(&mut pool).unwrap();
            assert_eq!(page.page_number(), expected);
        }
        assert!(pool.stats().snapshot().evictions > 0);
        assert_eq!(space.header(&mut pool).unwrap().size(), 6);
    }

    #[test]
    fn test_open_rejects_data_page_zero() {
        let (_dir, mut pool) = setup(2);
        pool.file_manager()
            .write_page("heap", &Page::from(DataPage::new(0)))
            .unwrap();

        assert!(matches!(
            TableSpace::open(&mut pool, "heap"),
            Err(Error::UnexpectedPageType { page_number: 0, .. })
        ));
    }

    #[test]
    fn test_fetch_root() {
        let (_dir, mut pool) = setup(4);
        let space = TableSpace::create(&mut pool, "jazz", 1).unwrap();
        let root = space.allocate_page(&mut pool).unwrap().page_number();
        pool.flush_all_pages().unwrap();

        let metadata = Metadata::new(
            1,
            "jazz",
            vec![Column::new("id", DataType::Int, false, 4)],
            vec![Index::new("PRIMARY", IndexType::Clustered, root)],
        )
        .unwrap();

        let page = space.fetch_root(&mut pool, &metadata).unwrap();
        assert_eq!(page.page_number(), root);
    }
}
