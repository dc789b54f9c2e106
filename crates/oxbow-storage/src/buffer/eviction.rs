//! LRU-K eviction policy for the buffer pool.
//!
//! LRU-K ranks frames by the K-th most recent access instead of the most
//! recent one, which keeps a burst of touches from making a page look
//! hot. Frames with fewer than K recorded accesses have an infinite
//! backward K-distance and are always preferred as victims, oldest
//! arrival first; among frames with a full history the one whose K-th
//! most recent access is furthest in the past loses.
//!
//! The replacer tracks frames by index only. The buffer pool tells it
//! which frames are evictable; pinned frames are not.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use super::frame::FrameId;

/// Per-frame access bookkeeping.
struct FrameAccess {
    /// Total number of recorded accesses.
    count: usize,
    /// The last K access timestamps, oldest at the front.
    timestamps: VecDeque<u64>,
    /// Whether the buffer pool allows evicting this frame.
    evictable: bool,
}

/// Replacer state, guarded by the replacer mutex.
struct ReplacerInner {
    /// Logical clock; stamps every access.
    clock: u64,
    /// Bookkeeping for every tracked frame.
    entries: HashMap<FrameId, FrameAccess>,
    /// Frames with fewer than K accesses, newest arrival at the front.
    history: VecDeque<FrameId>,
    /// Frames with at least K accesses; sorted by K-th most recent
    /// timestamp when a victim is needed.
    cache: Vec<FrameId>,
}

/// LRU-K page replacement policy.
///
/// # Example
///
/// ```
/// use oxbow_storage::buffer::{FrameId, LruKReplacer};
///
/// let replacer = LruKReplacer::new(8, 2);
/// replacer.record_access(FrameId::new(0));
/// replacer.record_access(FrameId::new(1));
/// // Frame 0 arrived first, so it is evicted first.
/// assert_eq!(replacer.evict(), Some(FrameId::new(0)));
/// ```
pub struct LruKReplacer {
    /// Upper bound on tracked frame indices.
    num_frames: usize,
    /// History depth.
    k: usize,
    /// All mutable state.
    inner: Mutex<ReplacerInner>,
}

impl LruKReplacer {
    /// Creates a replacer for `num_frames` frames with history depth `k`.
    pub fn new(num_frames: usize, k: usize) -> Self {
        Self {
            num_frames,
            k: k.max(1),
            inner: Mutex::new(ReplacerInner {
                clock: 0,
                entries: HashMap::new(),
                history: VecDeque::new(),
                cache: Vec::new(),
            }),
        }
    }

    /// Returns the history depth K.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Records an access to the given frame.
    ///
    /// A first access starts tracking the frame, evictable by default, in
    /// the history list. The K-th access promotes it to the cache list.
    /// Only the last K timestamps are retained.
    ///
    /// # Panics
    ///
    /// Panics if `frame.index() >= num_frames`.
    pub fn record_access(&self, frame: FrameId) {
        assert!(
            frame.index() < self.num_frames,
            "frame {} out of range (pool has {} frames)",
            frame.index(),
            self.num_frames
        );

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = inner.clock;
        let entry = inner.entries.entry(frame).or_insert_with(|| FrameAccess {
            count: 0,
            timestamps: VecDeque::new(),
            evictable: false,
        });

        entry.count += 1;
        entry.timestamps.push_back(now);
        if entry.timestamps.len() > self.k {
            entry.timestamps.pop_front();
        }

        if entry.count == 1 {
            entry.evictable = true;
            inner.history.push_front(frame);
        }
        if entry.count == self.k {
            let pos = inner
                .history
                .iter()
                .position(|&f| f == frame)
                .expect("frame reaching K accesses must be in the history list");
            inner.history.remove(pos);
            inner.cache.push(frame);
        }

        inner.clock += 1;
    }

    /// Sets whether the frame may be chosen as an eviction victim.
    ///
    /// A frame that is not tracked is left untouched; no state is created
    /// for it.
    ///
    /// # Panics
    ///
    /// Panics if `frame.index() >= num_frames`.
    pub fn set_evictable(&self, frame: FrameId, evictable: bool) {
        assert!(
            frame.index() < self.num_frames,
            "frame {} out of range (pool has {} frames)",
            frame.index(),
            self.num_frames
        );

        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get_mut(&frame) {
            entry.evictable = evictable;
        }
    }

    /// Picks and removes an eviction victim.
    ///
    /// Frames with fewer than K accesses are considered first, oldest
    /// arrival first. Otherwise the evictable frame with the smallest
    /// K-th most recent timestamp wins. Returns `None` when no tracked
    /// frame is evictable.
    ///
    /// The victim's tracking state is erased entirely; a later access
    /// starts it from scratch.
    pub fn evict(&self) -> Option<FrameId> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        // Pass 1: frames with an incomplete history, FIFO by arrival.
        let victim = inner
            .history
            .iter()
            .rev()
            .copied()
            .find(|f| inner.entries[f].evictable);
        if let Some(frame) = victim {
            let pos = inner
                .history
                .iter()
                .position(|&f| f == frame)
                .expect("victim came from the history list");
            inner.history.remove(pos);
            inner.entries.remove(&frame);
            return Some(frame);
        }

        // Pass 2: full-history frames, ordered by K-th most recent access.
        let entries = &inner.entries;
        inner.cache.sort_by_key(|f| {
            entries[f]
                .timestamps
                .front()
                .copied()
                .expect("cache-resident frame has at least K timestamps")
        });
        let victim = inner
            .cache
            .iter()
            .copied()
            .find(|f| inner.entries[f].evictable);
        if let Some(frame) = victim {
            let pos = inner
                .cache
                .iter()
                .position(|&f| f == frame)
                .expect("victim came from the cache list");
            inner.cache.remove(pos);
            inner.entries.remove(&frame);
            return Some(frame);
        }

        None
    }

    /// Stops tracking a frame, regardless of its access history.
    ///
    /// Untracked frames are ignored.
    ///
    /// # Panics
    ///
    /// Panics if the frame is tracked but not evictable; callers must
    /// only remove frames they have marked evictable.
    pub fn remove(&self, frame: FrameId) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(entry) = inner.entries.get(&frame) else {
            return;
        };
        assert!(
            entry.evictable,
            "tried to remove non-evictable frame {}",
            frame.index()
        );

        if entry.count >= self.k {
            let pos = inner
                .cache
                .iter()
                .position(|&f| f == frame)
                .expect("tracked frame with a full history is in the cache list");
            inner.cache.remove(pos);
        } else {
            let pos = inner
                .history
                .iter()
                .position(|&f| f == frame)
                .expect("tracked frame with a short history is in the history list");
            inner.history.remove(pos);
        }
        inner.entries.remove(&frame);
    }

    /// Returns the number of evictable tracked frames.
    pub fn size(&self) -> usize {
        self.inner
            .lock()
            .entries
            .values()
            .filter(|e| e.evictable)
            .count()
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LruKReplacer")
            .field("num_frames", &self.num_frames)
            .field("k", &self.k)
            .field("tracked", &inner.entries.len())
            .field("clock", &inner.clock)
            .finish()
    }
}
