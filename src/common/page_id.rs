//! Page identifier type.

use std::fmt;

/// Identifies a cached page: the table file it lives in plus its page number.
///
/// This is the buffer pool's map key, so equality and hashing are by value.
///
/// # Example
/// ```
/// use extentdb::PageId;
///
/// let page_id = PageId::new("jazz", 3);
/// assert_eq!(page_id.file_name(), "jazz");
/// assert_eq!(page_id.page_number(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    file_name: String,
    page_number: u32,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(file_name: impl Into<String>, page_number: u32) -> Self {
        Self {
            file_name: file_name.into(),
            page_number,
        }
    }

    /// Table file the page belongs to.
    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    pub fn page_number(&self) -> u32 {
        self.page_number
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_name, self.page_number)
    }
}
