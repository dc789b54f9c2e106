//! RAII pin guards for safe page access.
//!
//! Guards layer over the explicit [`fetch_page`]/[`unpin_page`] protocol:
//! holding a guard holds a pin, and dropping it unpins through the pool
//! so the replacer sees the evictability transition. The write guard
//! remembers whether it handed out mutable access and reports that as
//! the dirty hint on drop.
//!
//! [`fetch_page`]: super::BufferPoolManager::fetch_page
//! [`unpin_page`]: super::BufferPoolManager::unpin_page

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use oxbow_common::types::PageId;

use super::frame::{BufferFrame, FrameId};
use super::pool::BufferPoolManager;

/// Read guard for a pinned page.
pub struct PageReadGuard<'a> {
    pool: &'a BufferPoolManager,
    frame: Arc<BufferFrame>,
    page_id: PageId,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPoolManager, frame: Arc<BufferFrame>, page_id: PageId) -> Self {
        Self {
            pool,
            frame,
            page_id,
        }
    }

    /// Returns the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame.frame_id()
    }

    /// Returns a reference to the page data.
    #[inline]
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame.read_data(),
        }
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        self.pool.unpin_page(self.page_id, false);
    }
}

impl std::fmt::Debug for PageReadGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageReadGuard")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame.frame_id())
            .finish()
    }
}

/// Helper struct providing `Deref` for page data.
struct PageDataRef<'a> {
    guard: parking_lot::RwLockReadGuard<'a, Vec<u8>>,
}

impl Deref for PageDataRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Write guard for a pinned page.
///
/// Mutable access marks the guard modified; the drop-time unpin then
/// carries a dirty hint, which the pool's dirty-merge rule turns into a
/// sticky dirty mark on the frame.
pub struct PageWriteGuard<'a> {
    pool: &'a BufferPoolManager,
    frame: Arc<BufferFrame>,
    page_id: PageId,
    /// Whether mutable access was handed out.
    modified: bool,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPoolManager, frame: Arc<BufferFrame>, page_id: PageId) -> Self {
        Self {
            pool,
            frame,
            page_id,
            modified: false,
        }
    }

    /// Returns the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame.frame_id()
    }

    /// Returns a reference to the page data.
    #[inline]
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame.read_data(),
        }
    }

    /// Returns a mutable reference to the page data, marking the guard
    /// modified.
    #[inline]
    pub fn data_mut(&mut self) -> impl DerefMut<Target = [u8]> + '_ {
        self.modified = true;
        PageDataMut {
            guard: self.frame.write_data(),
        }
    }

    /// Marks the guard modified without touching the data.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.modified = true;
    }

    /// Returns true if mutable access was handed out.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.pool.unpin_page(self.page_id, self.modified);
    }
}

impl std::fmt::Debug for PageWriteGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageWriteGuard")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame.frame_id())
            .field("modified", &self.modified)
            .finish()
    }
}

/// Helper struct providing `DerefMut` for page data.
struct PageDataMut<'a> {
    guard: parking_lot::RwLockWriteGuard<'a, Vec<u8>>,
}

impl Deref for PageDataMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PageDataMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferPoolConfig;
    use crate::disk::MemoryDiskManager;

    fn create_pool(pool_size: usize) -> BufferPoolManager {
        let disk = Arc::new(MemoryDiskManager::new());
        BufferPoolManager::new(BufferPoolConfig::new(pool_size), disk).unwrap()
    }

    #[test]
    fn test_read_guard_unpins_on_drop() {
        let pool = create_pool(2);
        let (page_id, frame) = pool.new_page().unwrap();
        pool.unpin_page(page_id, false);

        {
            let guard = pool.fetch_page_read(page_id).unwrap();
            assert_eq!(guard.page_id(), page_id);
            assert_eq!(frame.pin_count(), 1);
        }
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_write_guard_reports_dirty_on_drop() {
        let pool = create_pool(2);

        let page_id = {
            let mut guard = pool.new_page_write().unwrap();
            guard.data_mut()[0..4].copy_from_slice(&[9, 8, 7, 6]);
            assert!(guard.is_modified());
            guard.page_id()
        };

        // The unpin carried a dirty hint.
        let frame = pool.fetch_page(page_id).unwrap();
        assert!(frame.is_dirty());
        assert_eq!(&frame.read_data()[0..4], &[9, 8, 7, 6]);
    }

    #[test]
    fn test_unwritten_write_guard_stays_clean() {
        let pool = create_pool(2);

        let page_id = {
            let guard = pool.new_page_write().unwrap();
            guard.page_id()
        };

        let frame = pool.fetch_page(page_id).unwrap();
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_mark_dirty_without_write() {
        let pool = create_pool(2);

        let page_id = {
            let mut guard = pool.new_page_write().unwrap();
            guard.mark_dirty();
            guard.page_id()
        };

        let frame = pool.fetch_page(page_id).unwrap();
        assert!(frame.is_dirty());
    }

    #[test]
    fn test_guard_data_round_trip() {
        let pool = create_pool(2);

        let page_id = {
            let mut guard = pool.new_page_write().unwrap();
            guard.data_mut()[0..5].copy_from_slice(b"pages");
            guard.page_id()
        };

        let guard = pool.fetch_page_read(page_id).unwrap();
        assert_eq!(&guard.data()[0..5], b"pages");
    }
}
