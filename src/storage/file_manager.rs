//! File Manager - page-at-a-time I/O on per-table files.
//!
//! The [`FileManager`] maps a table name to `<data_dir>/<table>.<ext>` and
//! moves single pages between that file and memory. Every transfer goes
//! through a buffer borrowed from the shared [`ByteBufferPool`], which caps
//! the memory spent on in-flight I/O.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};

use crate::common::config::{StorageConfig, PAGE_SIZE};
use crate::common::{Error, Result};
use crate::storage::page::Page;
use crate::storage::ByteBufferPool;

/// Reads and writes pages of table files.
///
/// # File Layout
/// Each table lives in its own file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (FSP)   │ (16KB)  │ (16KB)  │         │ (16KB)  │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0     16384    32768    ...   N×16384
/// ```
///
/// # Thread Safety
/// `FileManager` is `Sync`. It keeps no open handles: every call opens the
/// file, performs one transfer and closes it again.
///
/// # Durability
/// With `sync_on_write` set (the default) every write is followed by
/// `sync_data()`.
pub struct FileManager {
    config: StorageConfig,
    buffers: Arc<ByteBufferPool>,
    dir_ready: AtomicBool,
}

impl FileManager {
    /// Create a file manager over an existing buffer pool.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if the pool's buffers are not page-sized.
    pub fn new(config: StorageConfig, buffers: Arc<ByteBufferPool>) -> Result<Self> {
        if buffers.buffer_size() != PAGE_SIZE {
            return Err(Error::InvalidConfig(format!(
                "file manager needs {} byte buffers, pool hands out {}",
                PAGE_SIZE,
                buffers.buffer_size()
            )));
        }
        Ok(Self {
            config,
            buffers,
            dir_ready: AtomicBool::new(false),
        })
    }

    /// Create a file manager with its own buffer pool of `config.io_memory` bytes.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let buffers = Arc::new(ByteBufferPool::new(config.io_memory, PAGE_SIZE)?);
        Self::new(config, buffers)
    }

    /// Read and decode page `page_number` of `table`.
    ///
    /// The returned page is clean.
    ///
    /// # Errors
    /// - `Error::PageIo` if the file is missing or shorter than the page
    /// - `Error::AllocationTimeout` / `Error::PoolClosed` from the buffer pool
    /// - decoding errors, or `Error::Corrupted` if the page on disk carries
    ///   another page number
    pub fn load_page(&self, table: &str, page_number: u32) -> Result<Page> {
        let mut buffer = self.buffers.acquire(self.config.max_block)?;

        let path = self.config.table_path(table);
        File::open(&path)
            .and_then(|mut file| {
                file.seek(SeekFrom::Start(Self::offset_of(page_number)))?;
                file.read_exact(&mut buffer)
            })
            .map_err(|e| Error::page_io("load", table, page_number, e))?;

        let mut page = Page::deserialize(&buffer)?;
        if page.page_number() != page_number {
            return Err(Error::Corrupted(format!(
                "slot {} of table {} holds page {}",
                page_number,
                table,
                page.page_number()
            )));
        }
        page.mark_clean();

        trace!("loaded {}:{}", table, page_number);
        Ok(page)
    }

    /// Encode `page` and write it at its own offset in `table`'s file.
    ///
    /// Creates the data directory and the file on first use. Does not
    /// touch the page's dirty flag.
    pub fn write_page(&self, table: &str, page: &Page) -> Result<()> {
        let page_number = page.page_number();
        self.ensure_data_dir()
            .map_err(|e| Error::page_io("write", table, page_number, e))?;

        let mut buffer = self.buffers.acquire(self.config.max_block)?;
        page.serialize_into(&mut buffer)?;

        let path = self.config.table_path(table);
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .and_then(|mut file| {
                file.seek(SeekFrom::Start(Self::offset_of(page_number)))?;
                file.write_all(&buffer)?;
                if self.config.sync_on_write {
                    file.sync_data()?;
                }
                Ok(())
            })
            .map_err(|e| Error::page_io("write", table, page_number, e))?;

        trace!("wrote {}:{}", table, page_number);
        Ok(())
    }

    /// Number of whole pages in `table`'s file, 0 if it does not exist.
    pub fn page_count(&self, table: &str) -> Result<u32> {
        match fs::metadata(self.config.table_path(table)) {
            Ok(metadata) => Ok((metadata.len() / PAGE_SIZE as u64) as u32),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `table` has a backing file.
    pub fn table_exists(&self, table: &str) -> bool {
        self.config.table_path(table).is_file()
    }

    #[inline]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    #[inline]
    pub fn buffer_pool(&self) -> &Arc<ByteBufferPool> {
        &self.buffers
    }

    fn offset_of(page_number: u32) -> u64 {
        page_number as u64 * PAGE_SIZE as u64
    }

    fn ensure_data_dir(&self) -> io::Result<()> {
        if !self.dir_ready.load(Ordering::Acquire) {
            fs::create_dir_all(&self.config.data_dir)?;
            self.dir_ready.store(true, Ordering::Release);
            debug!("data directory ready at {}", self.config.data_dir.display());
        }
        Ok(())
    }
}

impl std::fmt::Debug for FileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileManager")
            .field("data_dir", &self.config.data_dir)
            .field("buffers", &self.buffers)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
