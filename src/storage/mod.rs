//! Storage layer - disk I/O, page formats and space management.
//!
//! This module handles persistent storage:
//! - [`FileManager`] - Page-at-a-time file I/O
//! - [`ByteBufferPool`] - Bounded pool of I/O buffers
//! - [`page`] - Page types and layouts
//! - [`fsp`] - Extent-based free-space management (page 0)

mod byte_buffer_pool;
mod file_manager;
pub mod fsp;
pub mod page;

pub use byte_buffer_pool::{ByteBufferPool, PooledBuffer};
pub use file_manager::FileManager;
