//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - A decoded 16KB page (data page or FSP header)
//! - [`FileHeader`] - Common prefix of every page
//! - [`PageType`] - Discriminator for different page formats
//! - [`PageHeader`] / [`DataPage`] - Record page format

mod data;
mod file_header;
#[allow(clippy::module_inception)]
mod page;
mod page_header;

pub use data::{DataPage, DATA_PAGE_CAPACITY};
pub use file_header::{FileHeader, PageType};
pub use page::{Deserializer, Page};
pub use page_header::PageHeader;
