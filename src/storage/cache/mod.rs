//! LRU caching
//!
//! [`RecordCache`] is the bounded recency-ordered map itself.
//! [`CachedStore`] composes it in front of any [`RecordStore`](crate::storage::RecordStore):
//!
//! ```text
//! get ──→ RecordCache ──hit──→ record
//!              │
//!             miss ──→ backing store ──found──→ put into cache
//!
//! add / update / delete ──→ backing store ──success──→ drop cache entry
//! ```

pub mod cached;
pub mod record_cache;

pub use cached::{CachedStore, DEFAULT_OVERLAY_CAPACITY};
pub use record_cache::{CacheStats, RecordCache, DEFAULT_CACHE_CAPACITY};
