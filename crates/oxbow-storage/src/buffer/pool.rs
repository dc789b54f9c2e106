//! Buffer pool manager implementation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use oxbow_common::types::PageId;
use oxbow_container::ExtendibleHashTable;
use parking_lot::Mutex;

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::eviction::LruKReplacer;
use super::frame::{BufferFrame, FrameId};
use super::guard::{PageReadGuard, PageWriteGuard};
use super::BufferPoolStats;
use crate::disk::DiskManager;
use crate::wal::LogManager;

/// Pool state that changes as pages come and go.
///
/// Guarded by the pool mutex, which also serializes every public
/// operation end to end; the directory and replacer mutexes only ever
/// nest inside it.
struct PoolState {
    /// Frames not holding any page.
    free_list: VecDeque<FrameId>,
    /// Next page ID to allocate. Monotonic, never reused.
    next_page_id: PageId,
}

/// The buffer pool manager.
///
/// Mediates between fixed-size on-disk pages and the rest of the engine:
/// callers request pages by ID, pin them while working, mark them dirty,
/// and release them. A bounded frame pool caches hot pages, evicts cold
/// ones under LRU-K, and writes dirty pages back on eviction and on
/// explicit flush.
///
/// Returned frames are a borrowing contract: the caller holds a pin until
/// it calls [`unpin_page`](Self::unpin_page) (or drops a guard from
/// [`fetch_page_read`](Self::fetch_page_read) /
/// [`fetch_page_write`](Self::fetch_page_write)); while pinned, the frame
/// stays resident.
pub struct BufferPoolManager {
    /// Number of frames.
    pool_size: usize,
    /// Page size in bytes.
    page_size: usize,
    /// The frame array.
    frames: Vec<Arc<BufferFrame>>,
    /// Page directory: PageId -> FrameId for resident pages.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Eviction policy.
    replacer: LruKReplacer,
    /// Disk boundary.
    disk: Arc<dyn DiskManager>,
    /// Write-ahead logging hook; stored for future integration.
    log_manager: Option<Arc<LogManager>>,
    /// Free list and ID counter.
    state: Mutex<PoolState>,
    /// Fetch counter for statistics.
    fetches: AtomicU64,
    /// Hit counter for statistics.
    hits: AtomicU64,
    /// Miss counter for statistics.
    misses: AtomicU64,
    /// Eviction counter for statistics.
    evictions: AtomicU64,
    /// Write-back counter for statistics.
    flushes: AtomicU64,
}

impl BufferPoolManager {
    /// Creates a new buffer pool over the given disk manager.
    ///
    /// Every frame starts on the free list.
    pub fn new(config: BufferPoolConfig, disk: Arc<dyn DiskManager>) -> BufferResult<Self> {
        config.validate().map_err(BufferError::config)?;

        let frames: Vec<Arc<BufferFrame>> = (0..config.pool_size)
            .map(|i| Arc::new(BufferFrame::new(FrameId::new(i), config.page_size)))
            .collect();
        let free_list: VecDeque<FrameId> = (0..config.pool_size).map(FrameId::new).collect();

        Ok(Self {
            pool_size: config.pool_size,
            page_size: config.page_size,
            frames,
            page_table: ExtendibleHashTable::new(config.bucket_size),
            replacer: LruKReplacer::new(config.pool_size, config.replacer_k),
            disk,
            log_manager: None,
            state: Mutex::new(PoolState {
                free_list,
                next_page_id: PageId::FIRST,
            }),
            fetches: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        })
    }

    /// Attaches a log manager handle.
    pub fn with_log_manager(mut self, log_manager: Arc<LogManager>) -> Self {
        self.log_manager = Some(log_manager);
        self
    }

    /// Creates a new page, pinned, with a freshly allocated ID.
    ///
    /// The page's buffer is zeroed and the frame returned with
    /// `pin_count = 1`. Fails with [`BufferError::PoolExhausted`] when
    /// every frame is occupied by a pinned page; no page ID is consumed
    /// by a failed call.
    pub fn new_page(&self) -> BufferResult<(PageId, Arc<BufferFrame>)> {
        let mut state = self.state.lock();
        if state.free_list.is_empty() && self.replacer.size() == 0 {
            return Err(BufferError::PoolExhausted);
        }

        let frame_id = self.acquire_frame(&mut state)?;
        let page_id = state.next_page_id;
        state.next_page_id = page_id.next();

        let frame = &self.frames[frame_id.index()];
        frame.reset();
        frame.set_page_id(page_id);
        frame.pin();
        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Ok((page_id, Arc::clone(frame)))
    }

    /// Fetches the page with the given ID, pinned.
    ///
    /// A resident page is returned directly with its pin count bumped.
    /// Otherwise a frame is acquired (from the free list, or by evicting
    /// a cold page, writing it back first if dirty) and the page's bytes
    /// are read from disk. Fails with [`BufferError::PoolExhausted`] when
    /// every frame is occupied by a pinned page.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<Arc<BufferFrame>> {
        debug_assert!(page_id.is_valid(), "fetched the INVALID page id");
        let mut state = self.state.lock();
        self.fetches.fetch_add(1, Ordering::Relaxed);

        if let Some(frame_id) = self.page_table.find(&page_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            let frame = &self.frames[frame_id.index()];
            frame.pin();
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            return Ok(Arc::clone(frame));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        if state.free_list.is_empty() && self.replacer.size() == 0 {
            return Err(BufferError::PoolExhausted);
        }

        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id.index()];
        frame.reset();
        if let Err(e) = self.disk.read_page(page_id, &mut frame.write_data()) {
            // The frame holds nothing yet; hand it back rather than leak it.
            state.free_list.push_back(frame_id);
            return Err(e.into());
        }
        frame.set_page_id(page_id);
        frame.pin();
        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Ok(Arc::clone(frame))
    }

    /// Releases one pin on the page.
    ///
    /// Returns false if the page is not resident or has no outstanding
    /// pins. A true `is_dirty` hint marks the frame dirty; a false hint
    /// never clears an existing dirty mark, so a read-only unpinner
    /// cannot erase a concurrent writer's mark. When the last pin is
    /// released the frame becomes an eviction candidate.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _state = self.state.lock();
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes the page's buffer to disk and clears its dirty mark.
    ///
    /// Returns `Ok(false)` if the page is not resident. The page is
    /// written whether or not it is dirty, and pin state is unchanged;
    /// flushing a pinned page is allowed.
    pub fn flush_page(&self, page_id: PageId) -> BufferResult<bool> {
        let _state = self.state.lock();
        self.flush_page_locked(page_id)
    }

    /// Flushes every resident page.
    pub fn flush_all_pages(&self) -> BufferResult<()> {
        let _state = self.state.lock();
        tracing::debug!("flushing all resident pages");
        for frame in &self.frames {
            let page_id = frame.page_id();
            if page_id.is_valid() {
                self.flush_page_locked(page_id)?;
            }
        }
        Ok(())
    }

    /// Deletes the page from the pool.
    ///
    /// Returns true if the page is not resident (the desired post-state
    /// already holds) and false if it is resident but pinned. Otherwise
    /// the frame is reset, returned to the free list, and the disk
    /// manager's deallocation hook invoked.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return true;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.is_pinned() {
            return false;
        }

        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id);
        state.free_list.push_back(frame_id);
        frame.reset();
        self.disk.deallocate_page(page_id);
        true
    }

    /// Fetches a page and wraps it in a read guard that unpins on drop.
    pub fn fetch_page_read(&self, page_id: PageId) -> BufferResult<PageReadGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageReadGuard::new(self, frame, page_id))
    }

    /// Fetches a page and wraps it in a write guard that unpins on drop,
    /// reporting a dirty hint if the guard was written through.
    pub fn fetch_page_write(&self, page_id: PageId) -> BufferResult<PageWriteGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageWriteGuard::new(self, frame, page_id))
    }

    /// Creates a new page and wraps it in a write guard.
    pub fn new_page_write(&self) -> BufferResult<PageWriteGuard<'_>> {
        let (page_id, frame) = self.new_page()?;
        Ok(PageWriteGuard::new(self, frame, page_id))
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns true if the page is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        let _state = self.state.lock();
        self.page_table.contains(&page_id)
    }

    /// Returns the number of frames on the free list.
    pub fn free_frames(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Returns the attached log manager, if any.
    pub fn log_manager(&self) -> Option<&Arc<LogManager>> {
        self.log_manager.as_ref()
    }

    /// Returns a statistics snapshot.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            fetches: self.fetches.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Acquires a frame for a new residency: from the free list if
    /// possible, otherwise by evicting a victim.
    ///
    /// A dirty victim is written back before its directory mapping is
    /// removed, so an evicted page is never silently lost.
    fn acquire_frame(&self, state: &mut PoolState) -> BufferResult<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self.replacer.evict().ok_or(BufferError::PoolExhausted)?;
        let frame = &self.frames[frame_id.index()];
        let victim_id = frame.page_id();

        if frame.is_dirty() {
            self.disk.write_page(victim_id, &frame.read_data())?;
            frame.set_dirty(false);
            self.flushes.fetch_add(1, Ordering::Relaxed);
        }
        self.page_table.remove(&victim_id);
        self.evictions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(victim = %victim_id, frame = frame_id.index(), "evicted page");

        Ok(frame_id)
    }

    /// Flush with the pool mutex already held.
    fn flush_page_locked(&self, page_id: PageId) -> BufferResult<bool> {
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.index()];
        self.disk.write_page(page_id, &frame.read_data())?;
        frame.set_dirty(false);
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("pool_size", &self.pool_size)
            .field("page_size", &self.page_size)
            .field("resident_pages", &self.page_table.len())
            .field("free_frames", &self.free_frames())
            .finish()
    }
}
