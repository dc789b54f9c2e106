//! Extendible hash table implementation.
//!
//! Extendible hashing keeps a directory of 2^global_depth slots, each
//! pointing at a bucket of bounded capacity. A slot is chosen by the low
//! `global_depth` bits of the key's hash. When a bucket overflows it is
//! split in two on the next hash bit; the directory only doubles when the
//! overflowing bucket already uses every directory bit. Several slots may
//! point at the same bucket, so growth is localized to hot buckets.
//!
//! The table never shrinks and never merges buckets.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;

use crate::stats::TableStats;
use crate::DEFAULT_BUCKET_SIZE;

/// A bucket holding up to `bucket_size` key-value entries.
struct Bucket<K, V> {
    /// Number of hash bits this bucket distinguishes.
    depth: usize,
    /// Entries, in insertion order. No duplicate keys.
    items: Vec<(K, V)>,
}

impl<K, V> Bucket<K, V> {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            items: Vec::new(),
        }
    }
}

/// Directory and bucket storage, guarded by the table mutex.
///
/// Buckets live in an append-only arena; directory slots hold arena
/// indices. Since buckets are never freed, indices stay valid for the
/// table's lifetime even while multiple slots share one bucket.
struct TableInner<K, V> {
    /// Number of hash bits used to index the directory.
    global_depth: usize,
    /// Directory: slot -> bucket arena index. Length is 2^global_depth.
    dir: Vec<usize>,
    /// Bucket arena.
    buckets: Vec<Bucket<K, V>>,
}

/// A thread-safe extendible hash table.
///
/// Used as the page directory of the buffer pool (`PageId` -> frame
/// index), but generic over any hashable key. All public operations are
/// serialized by a single table-wide mutex.
///
/// # Example
///
/// ```
/// use oxbow_container::ExtendibleHashTable;
///
/// let table: ExtendibleHashTable<u64, &str> = ExtendibleHashTable::new(2);
/// table.insert(1, "a");
/// table.insert(2, "b");
/// assert_eq!(table.find(&1), Some("a"));
/// table.insert(1, "c");
/// assert_eq!(table.find(&1), Some("c"));
/// ```
pub struct ExtendibleHashTable<K, V> {
    /// Maximum entries per bucket.
    bucket_size: usize,
    /// Directory and buckets.
    inner: Mutex<TableInner<K, V>>,
    /// Statistics.
    stats: TableStats,
}

impl<K: Hash + Eq, V: Clone> ExtendibleHashTable<K, V> {
    /// Creates a new table with the given bucket capacity.
    pub fn new(bucket_size: usize) -> Self {
        Self {
            bucket_size: bucket_size.max(1),
            inner: Mutex::new(TableInner {
                global_depth: 0,
                dir: vec![0],
                buckets: vec![Bucket::new(0)],
            }),
            stats: TableStats::new(),
        }
    }

    /// Returns the bucket capacity.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// Returns the number of directory bits currently in use.
    pub fn global_depth(&self) -> usize {
        self.inner.lock().global_depth
    }

    /// Returns the local depth of the bucket behind the given directory
    /// slot.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is outside the directory.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let inner = self.inner.lock();
        inner.buckets[inner.dir[dir_index]].depth
    }

    /// Returns the number of distinct buckets.
    pub fn num_buckets(&self) -> usize {
        self.inner.lock().buckets.len()
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .buckets
            .iter()
            .map(|b| b.items.len())
            .sum()
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().buckets.iter().all(|b| b.items.is_empty())
    }

    /// Returns table statistics.
    pub fn stats(&self) -> &TableStats {
        &self.stats
    }

    /// Looks up the value for the given key.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stats.record_lookup();
        let inner = self.inner.lock();
        let slot = Self::index_of(key, inner.global_depth);
        let bucket = &inner.buckets[inner.dir[slot]];
        let found = bucket
            .items
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v.clone());
        if found.is_some() {
            self.stats.record_hit();
        }
        found
    }

    /// Returns true if the key is present.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let inner = self.inner.lock();
        let slot = Self::index_of(key, inner.global_depth);
        inner.buckets[inner.dir[slot]]
            .items
            .iter()
            .any(|(k, _)| k.borrow() == key)
    }

    /// Removes the entry for the given key.
    ///
    /// Returns whether an entry was removed. Buckets are not merged.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.lock();
        let slot = Self::index_of(key, inner.global_depth);
        let bucket_idx = inner.dir[slot];
        let bucket = &mut inner.buckets[bucket_idx];
        match bucket.items.iter().position(|(k, _)| k.borrow() == key) {
            Some(pos) => {
                bucket.items.remove(pos);
                self.stats.record_removal();
                true
            }
            None => false,
        }
    }

    /// Inserts a key-value pair, overwriting any existing value for the
    /// key.
    ///
    /// If the target bucket is full, it is split (possibly doubling the
    /// directory) and the insertion retried. Insertion always succeeds;
    /// an overflowing bucket whose entries all share the next hash bit is
    /// split repeatedly until the new key fits.
    pub fn insert(&self, key: K, value: V) {
        self.stats.record_insert();
        let mut inner = self.inner.lock();
        loop {
            let slot = Self::index_of(&key, inner.global_depth);
            let bucket_idx = inner.dir[slot];
            let bucket = &mut inner.buckets[bucket_idx];

            if let Some(existing) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = value;
                return;
            }
            if bucket.items.len() < self.bucket_size {
                bucket.items.push((key, value));
                return;
            }

            Self::split_bucket(&mut inner, slot);
            self.stats.record_split();
        }
    }

    /// Computes the directory slot of `key` under `depth` bits.
    fn index_of<Q>(key: &Q, depth: usize) -> usize
    where
        Q: Hash + ?Sized,
    {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & ((1usize << depth) - 1)
    }

    /// Splits the full bucket behind directory slot `slot`.
    ///
    /// Assumes the table mutex is held. The bucket's entries are
    /// partitioned on the newly significant hash bit between the old
    /// bucket and a fresh sibling, and every directory slot that selects
    /// the sibling under the deeper mask is repointed.
    fn split_bucket(inner: &mut TableInner<K, V>, slot: usize) {
        let bucket_idx = inner.dir[slot];
        let depth = inner.buckets[bucket_idx].depth;

        // The directory must distinguish one more bit than the bucket.
        if depth == inner.global_depth {
            let doubled = inner.dir.clone();
            inner.dir.extend(doubled);
            inner.global_depth += 1;
        }

        let new_depth = depth + 1;
        let low_mask = (1usize << depth) - 1;
        let new_mask = (1usize << new_depth) - 1;
        let old_slot = slot & low_mask;

        let sibling_idx = inner.buckets.len();
        inner.buckets.push(Bucket::new(new_depth));
        inner.buckets[bucket_idx].depth = new_depth;

        // Entries whose hash sets the new bit migrate to the sibling.
        let items = std::mem::take(&mut inner.buckets[bucket_idx].items);
        for (k, v) in items {
            if Self::index_of(&k, new_depth) == old_slot {
                inner.buckets[bucket_idx].items.push((k, v));
            } else {
                inner.buckets[sibling_idx].items.push((k, v));
            }
        }

        for i in 0..inner.dir.len() {
            if i & low_mask == old_slot && i & new_mask != old_slot {
                inner.dir[i] = sibling_idx;
            }
        }
    }
}

impl<K: Hash + Eq, V: Clone> Default for ExtendibleHashTable<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_SIZE)
    }
}

impl<K, V> std::fmt::Debug for ExtendibleHashTable<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &inner.global_depth)
            .field("num_buckets", &inner.buckets.len())
            .field("bucket_size", &self.bucket_size)
            .finish()
    }
}
