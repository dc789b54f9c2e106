//! In-memory container structures for Oxbow.
//!
//! This crate provides the dynamic hashing structure used as the page
//! directory of the buffer pool:
//!
//! - **Extendible Hash Table**: a directory-of-buckets map that grows by
//!   splitting overflowing buckets, doubling the directory only when a
//!   split outgrows it
//!
//! # Example
//!
//! ```rust
//! use oxbow_container::ExtendibleHashTable;
//!
//! let table: ExtendibleHashTable<u64, u32> = ExtendibleHashTable::new(4);
//! table.insert(1, 10);
//! assert_eq!(table.find(&1), Some(10));
//! assert!(table.remove(&1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extendible;
pub mod stats;

pub use extendible::ExtendibleHashTable;
pub use stats::TableStats;

/// Default bucket capacity when not specified.
pub const DEFAULT_BUCKET_SIZE: usize = 4;
