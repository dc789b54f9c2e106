//! # oxbow-common
//!
//! Common types and constants for the Oxbow storage engine.
//!
//! This crate provides the foundational pieces shared by the storage
//! components:
//!
//! - **Types**: core identifiers (`PageId`, `Lsn`)
//! - **Constants**: page geometry and buffer pool defaults
//!
//! ## Example
//!
//! ```rust
//! use oxbow_common::types::PageId;
//!
//! let page = PageId::new(42);
//! assert_eq!(page.as_u64(), 42);
//! assert!(page.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{Lsn, PageId};
