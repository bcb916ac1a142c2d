#![forbid(unsafe_code)]

//! Fixed-capacity most-recently-used pool of record text.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use serde::Serialize;

use crate::types::{GisError, Result};

/// Default number of records held by the pool.
pub const DEFAULT_POOL_CAPACITY: usize = 15;

/// Lookup counters accumulated since the last [`BufferPool::take_stats`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BufferPoolStats {
    /// Lookups answered from the pool.
    pub hits: u64,
    /// Lookups that fell through to the caller.
    pub misses: u64,
    /// Items dropped off the LRU end.
    pub evictions: u64,
}

/// Recency-ordered pool; position 0 is the most recently used item.
///
/// Inserting an item already in the pool promotes it instead of duplicating it,
/// and inserting past capacity drops the least recently used item.
pub struct BufferPool<T = String>
where
    T: Hash + Eq,
{
    items: LruCache<T, ()>,
    stats: BufferPoolStats,
}

impl<T: Hash + Eq> BufferPool<T> {
    /// Creates an empty pool; `capacity` must be at least 1.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            GisError::InvalidArgument("buffer pool capacity must be at least 1".into())
        })?;
        Ok(Self {
            items: LruCache::new(capacity),
            stats: BufferPoolStats::default(),
        })
    }

    /// Adds `item` at position 0, removing any earlier occurrence first.
    pub fn insert(&mut self, item: T) {
        if let Some((evicted, ())) = self.items.push(item, ()) {
            // `push` hands back the replaced key when the item was already
            // present; only a different key is a real eviction.
            if !self.items.contains(&evicted) {
                self.stats.evictions += 1;
            }
        }
    }

    /// Item at `index`, counting from the most recently used.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.iter().nth(index).map(|(item, _)| item)
    }

    /// Checks membership without changing recency.
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// First item, from most to least recent, satisfying `pred`. Counts as a
    /// pool hit or miss; the caller promotes the item by re-inserting it.
    pub fn find<F>(&mut self, mut pred: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        let found = self.items.iter().map(|(item, _)| item).find(|&item| pred(item));
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the pool holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of items held.
    pub fn capacity(&self) -> usize {
        self.items.cap().get()
    }

    /// Items from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(item, _)| item)
    }

    /// Current counters, left in place.
    pub fn stats(&self) -> BufferPoolStats {
        self.stats
    }

    /// Returns the current counters and resets them.
    pub fn take_stats(&mut self) -> BufferPoolStats {
        std::mem::take(&mut self.stats)
    }
}
