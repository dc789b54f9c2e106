//! Table statistics for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for hash table operations.
#[derive(Debug, Default)]
pub struct TableStats {
    /// Total number of lookups.
    lookups: AtomicU64,
    /// Number of lookups that found the key.
    hits: AtomicU64,
    /// Number of insertions (including overwrites).
    inserts: AtomicU64,
    /// Number of bucket splits.
    splits: AtomicU64,
    /// Number of removals that found the key.
    removals: AtomicU64,
}

impl TableStats {
    /// Creates new statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lookup.
    #[inline]
    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a lookup hit.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an insertion.
    #[inline]
    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a bucket split.
    #[inline]
    pub fn record_split(&self) {
        self.splits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a removal.
    #[inline]
    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns total lookups.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Returns lookup hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns insertions.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Returns bucket splits.
    pub fn splits(&self) -> u64 {
        self.splits.load(Ordering::Relaxed)
    }

    /// Returns removals.
    pub fn removals(&self) -> u64 {
        self.removals.load(Ordering::Relaxed)
    }

    /// Returns the hit ratio (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.lookups();
        if lookups == 0 {
            0.0
        } else {
            self.hits() as f64 / lookups as f64
        }
    }

    /// Resets all statistics.
    pub fn reset(&self) {
        self.lookups.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.inserts.store(0, Ordering::Relaxed);
        self.splits.store(0, Ordering::Relaxed);
        self.removals.store(0, Ordering::Relaxed);
    }
}

impl Clone for TableStats {
    fn clone(&self) -> Self {
        Self {
            lookups: AtomicU64::new(self.lookups()),
            hits: AtomicU64::new(self.hits()),
            inserts: AtomicU64::new(self.inserts()),
            splits: AtomicU64::new(self.splits()),
            removals: AtomicU64::new(self.removals()),
        }
    }
}

impl std::fmt::Display for TableStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TableStats {{ lookups: {}, hits: {}, hit_ratio: {:.2}%, inserts: {}, splits: {} }}",
            self.lookups(),
            self.hits(),
            self.hit_ratio() * 100.0,
            self.inserts(),
            self.splits()
        )
    }
}
