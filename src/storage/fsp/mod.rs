//! Extent-based free-space management.
//!
//! Page 0 of every table space is an [`FspHeader`]. It tracks 256 extents of
//! 64 pages each through per-extent bitmaps, and keeps the extents on three
//! lists so allocation never has to scan:
//!
//! - [`Pointer`] - byte offset of a descriptor inside the header
//! - [`BaseNode`] - list anchor (length, first, last)
//! - [`ExtentDescriptor`] - bitmap, state and list links of one extent
//! - [`FspHeader`] - the lists plus `allocate_page`/`deallocate_page`

mod base_node;
mod extent;
mod fsp_header;
mod pointer;

pub use base_node::BaseNode;
pub use extent::{ExtentDescriptor, ExtentState, ALL_FREE};
pub use fsp_header::{ExtentList, FspHeader, ENTRIES_SIZE, FSP_HEADER_PAGE};
pub use pointer::Pointer;
