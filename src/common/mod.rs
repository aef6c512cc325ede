//! Common types and utilities shared across extentdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`config::StorageConfig`]
//! - Error types
//! - The [`PageId`] cache key
//! - Little-endian byte cursors used by every on-disk codec

pub mod bytes;
pub mod config;
pub mod error;
mod page_id;

pub use error::{Error, Result};
pub use page_id::PageId;
