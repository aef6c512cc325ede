//! Error types for extentdb.

use std::io;

use thiserror::Error;

use super::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in extentdb.
///
/// A single error type keeps handling uniform across the allocator, the
/// buffer pool and the I/O layer. Nothing in the crate retries on error;
/// the only built-in recovery is the bounded wait in the byte buffer pool.
#[derive(Debug, Error)]
pub enum Error {
    // --- configuration -----------------------------------------------------
    /// A component was constructed with unusable parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // --- resource exhaustion -----------------------------------------------
    /// `allocate` was called on, or was waiting in, a closed pool.
    #[error("byte buffer pool closed while allocating memory")]
    PoolClosed,

    /// No buffer was returned within the caller's blocking budget.
    #[error("failed to allocate buffer within the configured max blocking time {waited_ms} ms")]
    AllocationTimeout { waited_ms: u64 },

    /// A buffer handed back to the pool has the wrong length.
    #[error("buffer size {actual} does not match the pool's buffer size of {expected} bytes")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// More buffers were returned than the pool ever handed out.
    #[error("byte buffer pool already holds all {capacity} buffers")]
    PoolOverflow { capacity: usize },

    /// Every extent of the file space is fully allocated.
    #[error("file space has no free pages left")]
    SpaceFull,

    // --- I/O -----------------------------------------------------------------
    /// I/O error without page context (directory creation and the like).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// I/O error while reading or writing a specific page of a table file.
    #[error("failed to {op} page {page_number} for table {table}")]
    PageIo {
        op: &'static str,
        table: String,
        page_number: u32,
        #[source]
        source: io::Error,
    },

    // --- data ----------------------------------------------------------------
    /// The page type byte does not name a known page format.
    #[error("unknown page type code: {0}")]
    UnknownPageType(u8),

    /// An extent descriptor carries a state byte we do not understand.
    #[error("unknown extent state code: {0}")]
    UnknownExtentState(u8),

    /// A catalog record carries an unknown index type code.
    #[error("unknown index type code: {0}")]
    UnknownIndexType(u8),

    /// A catalog record carries an unknown column data type code.
    #[error("unknown data type code: {0}")]
    UnknownDataType(u8),

    /// A serialized structure is truncated or internally inconsistent.
    #[error("corrupted data: {0}")]
    Corrupted(String),

    /// A page was found where a different page format was required.
    #[error("page {page_number} is a {actual} page, expected {expected}")]
    UnexpectedPageType {
        page_number: u32,
        expected: &'static str,
        actual: &'static str,
    },

    // --- allocator misuse ------------------------------------------------------
    /// The page number lies outside the file space or names the header page.
    #[error("invalid page number: {0}")]
    InvalidPageNumber(u32),

    /// The page is already free.
    #[error("page {0} is not allocated")]
    PageNotAllocated(u32),

    // --- lookup ----------------------------------------------------------------
    /// A catalog lookup by name failed.
    #[error("{0} not found")]
    NotFound(String),

    /// Creating something that is already there.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The page is not resident in the buffer pool.
    #[error("page {0} is not cached")]
    PageNotCached(PageId),

    /// A page was handed to the buffer pool under another page's id.
    #[error("page {page_number} cannot be cached as {id}")]
    PageIdMismatch { id: PageId, page_number: u32 },
}

impl Error {
    /// Wrap an I/O error with the table and page it happened on.
    pub(crate) fn page_io(op: &'static str, table: &str, page_number: u32, source: io::Error) -> Self {
        Error::PageIo {
            op,
            table: table.to_string(),
            page_number,
            source,
        }
    }

    /// Shorthand for a truncated read.
    pub(crate) fn truncated(what: &str) -> Self {
        Error::Corrupted(format!("unexpected end of data while reading {what}"))
    }
}
