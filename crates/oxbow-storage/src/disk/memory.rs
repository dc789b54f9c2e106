//! In-memory disk manager for tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use oxbow_common::types::PageId;
use parking_lot::RwLock;

use super::DiskManager;

/// In-memory stand-in for a disk, with observable I/O counters.
///
/// Tests use the counters to assert what crosses the disk boundary, e.g.
/// that evicting a dirty page produced exactly one write.
#[derive(Debug, Default)]
pub struct MemoryDiskManager {
    /// Page store.
    pages: RwLock<HashMap<PageId, Vec<u8>>>,
    /// Number of read_page calls.
    reads: AtomicU64,
    /// Number of write_page calls.
    writes: AtomicU64,
    /// Number of deallocate_page calls.
    deallocations: AtomicU64,
}

impl MemoryDiskManager {
    /// Creates an empty in-memory disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pages ever written.
    pub fn num_pages(&self) -> usize {
        self.pages.read().len()
    }

    /// Returns the number of read_page calls so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of write_page calls so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of deallocate_page calls so far.
    pub fn deallocations(&self) -> u64 {
        self.deallocations.load(Ordering::Relaxed)
    }

    /// Returns a copy of the stored bytes for a page, if any write
    /// reached it.
    pub fn page_bytes(&self, page_id: PageId) -> Option<Vec<u8>> {
        self.pages.read().get(&page_id).cloned()
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> io::Result<()> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        match self.pages.read().get(&page_id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &[u8]) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.pages.write().insert(page_id, data.to_vec());
        Ok(())
    }

    fn deallocate_page(&self, page_id: PageId) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
        self.pages.write().remove(&page_id);
    }
}
