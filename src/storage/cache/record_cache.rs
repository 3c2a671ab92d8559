//! Bounded LRU cache of records

use crate::error::{Error, Result};
use crate::storage::record::{Record, RecordId};
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

/// Default capacity of a standalone cache
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// LRU cache mapping record id → record
///
/// `get` and `put` both promote the touched key to most-recently-used.
/// Inserting into a full cache evicts exactly one least-recently-used entry.
pub struct RecordCache {
    entries: LruCache<RecordId, Record>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl RecordCache {
    /// Create a cache holding at most `maxsize` records
    pub fn new(maxsize: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(maxsize)
            .ok_or_else(|| Error::InvalidArgument("cache size must be at least 1".to_string()))?;
        Ok(Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        })
    }

    /// Insert or replace an entry and mark it most-recently-used
    pub fn put(&mut self, key: RecordId, value: Record) {
        let replacing = self.entries.contains(&key);
        if let Some((evicted, _)) = self.entries.push(key, value) {
            if !replacing {
                self.evictions += 1;
                debug!(evicted, inserted = key, "Evicted least recently used record");
            }
        }
    }

    /// Look up an entry, promoting it on hit
    pub fn get(&mut self, key: RecordId) -> Option<Record> {
        match self.entries.get(&key) {
            Some(record) => {
                self.hits += 1;
                Some(record.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up an entry without touching recency or counters
    pub fn peek(&self, key: RecordId) -> Option<&Record> {
        self.entries.peek(&key)
    }

    pub fn contains(&self, key: RecordId) -> bool {
        self.entries.contains(&key)
    }

    /// Remove an entry; absent keys are ignored
    pub fn delete(&mut self, key: RecordId) -> Option<Record> {
        self.entries.pop(&key)
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries from least- to most-recently used
    pub fn index(&self) -> Vec<(RecordId, Record)> {
        self.entries
            .iter()
            .rev()
            .map(|(id, record)| (*id, record.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate,
            size: self.entries.len(),
            capacity: self.capacity(),
        }
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::MIN.saturating_add(DEFAULT_CACHE_CAPACITY - 1)),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
    pub size: usize,
    pub capacity: usize,
}
