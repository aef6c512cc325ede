//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between the storage engine
//! and table files. It holds a bounded number of decoded pages and writes
//! dirty ones back before letting them go.
//!
//! # Components
//! - [`BufferPool`] - The main page cache
//! - [`BufferPoolStats`] - Performance statistics
//! - [`replacer`] - Eviction policy implementations

mod buffer_pool;
pub mod replacer;
mod stats;

pub use buffer_pool::BufferPool;
pub use stats::{BufferPoolStats, StatsSnapshot};
