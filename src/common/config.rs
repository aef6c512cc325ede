//! Configuration constants and the storage configuration struct.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Size of a page in bytes (16KB).
///
/// Every structure in the file, including the file-space header on page 0,
/// occupies exactly one page. Page N lives at file offset `N × PAGE_SIZE`.
pub const PAGE_SIZE: usize = 16 * 1024;

/// Number of consecutive pages tracked by one extent descriptor.
pub const PAGES_PER_EXTENT: u32 = 64;

/// Number of extent descriptors in a file space.
///
/// The descriptor array is created once when the space is initialised and
/// never grows, so a space addresses at most `TOTAL_EXTENTS × PAGES_PER_EXTENT`
/// pages.
pub const TOTAL_EXTENTS: u32 = 256;

/// Maximum number of pages one file space can address.
pub const MAX_PAGES_PER_SPACE: u32 = TOTAL_EXTENTS * PAGES_PER_EXTENT;

/// Default directory holding one file per table.
pub const DEFAULT_DATA_DIR: &str = "files/data";

/// Default table file extension.
pub const DEFAULT_FILE_EXTENSION: &str = "idb";

/// Default time a page read/write waits for an I/O buffer.
pub const DEFAULT_MAX_BLOCK: Duration = Duration::from_millis(2000);

/// Smallest I/O buffer pool handed out by [`StorageConfig::io_memory_for`].
pub const MIN_IO_MEMORY: usize = PAGE_SIZE * 30;

/// Settings for the file layer.
///
/// Passed explicitly at construction instead of relying on the process
/// working directory.
///
/// # Example
/// ```
/// use extentdb::common::config::StorageConfig;
///
/// let config = StorageConfig::new("/tmp/extentdb").with_extension("ibd");
/// assert!(config.table_path("jazz").ends_with("jazz.ibd"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding the table files. Created lazily on first use.
    pub data_dir: PathBuf,
    /// Extension appended to the table name, without the dot.
    pub extension: String,
    /// How long a page read/write waits for an I/O buffer.
    pub max_block: Duration,
    /// Call `sync_data` after every page write.
    pub sync_on_write: bool,
    /// Bytes reserved for pooled page I/O buffers (multiple of `PAGE_SIZE`).
    pub io_memory: usize,
}

impl StorageConfig {
    /// Create a config rooted at `data_dir` with default settings.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_max_block(mut self, max_block: Duration) -> Self {
        self.max_block = max_block;
        self
    }

    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    pub fn with_io_memory(mut self, io_memory: usize) -> Self {
        self.io_memory = io_memory;
        self
    }

    /// Path of the file backing `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", table, self.extension))
    }

    /// I/O buffer memory for a process allowed `total_memory` bytes.
    ///
    /// One tenth of the total, never less than [`MIN_IO_MEMORY`], rounded
    /// down to whole pages.
    pub fn io_memory_for(total_memory: usize) -> usize {
        let memory = (total_memory / 10).max(MIN_IO_MEMORY);
        memory - memory % PAGE_SIZE
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            extension: DEFAULT_FILE_EXTENSION.to_string(),
            max_block: DEFAULT_MAX_BLOCK,
            sync_on_write: true,
            io_memory: MIN_IO_MEMORY,
        }
    }
}
