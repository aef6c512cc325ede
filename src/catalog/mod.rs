//! Catalog records consumed by the storage core.
//!
//! The data dictionary itself lives above this crate; the core only needs
//! a table's [`Metadata`] to find the root page of its clustered index.

mod metadata;

pub use metadata::{Column, DataType, Index, IndexType, Metadata};
