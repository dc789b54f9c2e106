//! System-wide constants for Oxbow.
//!
//! This module defines the fixed geometry of on-disk pages and the default
//! sizing of the buffer management core.

// =============================================================================
// Page Constants
// =============================================================================

/// Page size in bytes (4 KB).
///
/// Every on-disk page and every in-memory frame buffer is exactly this
/// large. The value matches the common OS page size.
pub const PAGE_SIZE: usize = 4 * 1024;

/// Minimum supported page size in bytes.
pub const MIN_PAGE_SIZE: usize = 512;

// =============================================================================
// Buffer Pool Constants
// =============================================================================

/// Default number of frames in the buffer pool.
pub const DEFAULT_POOL_SIZE: usize = 128;

/// Default K parameter for LRU-K replacement.
///
/// K = 2 distinguishes pages accessed repeatedly from pages touched once
/// by a scan, at minimal bookkeeping cost.
pub const DEFAULT_REPLACER_K: usize = 2;

// =============================================================================
// Page Directory Constants
// =============================================================================

/// Default bucket capacity for the extendible-hash page directory.
pub const DEFAULT_BUCKET_SIZE: usize = 4;
