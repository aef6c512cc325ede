//! extentdb - the disk-backed page storage core of a small relational engine.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            extentdb                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Table Spaces (space/)                       │   │
//! │  │     TableSpace: allocate / free pages of one table       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │       Buffer Pool (buffer/)  [Pluggable Eviction]       │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │      Replacement Strategies: LRU | Midpoint      │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │          BufferPool + Statistics                         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │   FileManager + ByteBufferPool + Page formats + FSP      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, config, byte cursors)
//! - [`storage`] - Page formats, the extent allocator and page file I/O
//! - [`buffer`] - Buffer pool and replacement strategies
//! - [`space`] - Per-table space management
//! - [`catalog`] - Table metadata records
//!
//! # Quick Start
//! ```no_run
//! use extentdb::{BufferPool, LruStrategy, StorageConfig, TableSpace};
//!
//! let mut pool = BufferPool::open(StorageConfig::new("files/data"), LruStrategy::new(64)).unwrap();
//! let space = TableSpace::create(&mut pool, "jazz", 1).unwrap();
//!
//! let page_number = space.allocate_page(&mut pool).unwrap().page_number();
//! pool.flush_all_pages().unwrap();
//! # let _ = page_number;
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod space;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{StorageConfig, PAGE_SIZE};
pub use common::{Error, PageId, Result};

pub use buffer::replacer::{LruStrategy, MidpointStrategy, ReplacementStrategy};
pub use buffer::{BufferPool, BufferPoolStats, StatsSnapshot};
pub use catalog::Metadata;
pub use space::TableSpace;
pub use storage::fsp::FspHeader;
pub use storage::page::{DataPage, Page, PageType};
pub use storage::{ByteBufferPool, FileManager};
