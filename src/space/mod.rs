//! Table-level space management on top of the buffer pool.

mod table_space;

pub use table_space::TableSpace;
