//! LRU overlay in front of a slower record store
//!
//! Reads go through the cache; writes go to the backing store and then
//! drop the cached entry, so the next read repopulates from the source of
//! truth. The cache is never refreshed in place.

use super::record_cache::{CacheStats, RecordCache};
use crate::error::{Error, Result};
use crate::storage::engine::{Outcome, RecordStore};
use crate::storage::record::{Record, RecordId};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

/// Default cache size in front of a remote store
pub const DEFAULT_OVERLAY_CAPACITY: usize = 5;

/// Read-through, invalidate-on-write cache over another store
///
/// The cache lock only guards in-memory steps; it is released before
/// every call into the backing store.
pub struct CachedStore<S> {
    inner: S,
    cache: Mutex<Overlay>,
}

/// Cached records plus a write epoch
///
/// Every invalidation bumps `epoch`. A read that missed only fills the
/// cache if the epoch is unchanged since before its backing-store call.
struct Overlay {
    records: RecordCache,
    epoch: u64,
}

impl Overlay {
    fn invalidate(&mut self, id: RecordId) -> bool {
        self.epoch = self.epoch.wrapping_add(1);
        self.records.delete(id).is_some()
    }
}

impl<S: RecordStore> CachedStore<S> {
    /// Wrap `inner` with a cache of `capacity` records
    pub fn new(inner: S, capacity: usize) -> Result<Self> {
        Ok(Self {
            inner,
            cache: Mutex::new(Overlay {
                records: RecordCache::new(capacity)?,
                epoch: 0,
            }),
        })
    }

    /// The backing store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Cached entries from least- to most-recently used
    pub fn cache_index(&self) -> Vec<(RecordId, Record)> {
        self.cache.lock().records.index()
    }

    /// Check if an id is cached, without promoting it
    pub fn is_cached(&self, id: RecordId) -> bool {
        self.cache.lock().records.contains(id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().records.stats()
    }

    /// Drop every cached entry
    pub fn invalidate_all(&self) {
        let mut cache = self.cache.lock();
        cache.epoch = cache.epoch.wrapping_add(1);
        cache.records.clear();
    }

    fn invalidate(&self, id: RecordId) {
        if self.cache.lock().invalidate(id) {
            debug!(id, "Invalidated cached record");
        }
    }

    /// Report an unavailable backing store as an empty result
    fn degrade<T: Default>(op: &'static str, result: Result<T>) -> Result<T> {
        match result {
            Err(Error::Unavailable(reason)) => {
                warn!(op, %reason, "Backing store unavailable, returning empty result");
                Ok(T::default())
            }
            other => other,
        }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for CachedStore<S> {
    #[instrument(skip(self))]
    async fn get(&self, id: RecordId) -> Result<Option<Record>> {
        let epoch = {
            let mut cache = self.cache.lock();
            if let Some(record) = cache.records.get(id) {
                debug!("Cache hit");
                return Ok(Some(record));
            }
            cache.epoch
        };

        debug!("Cache miss");
        match self.inner.get(id).await {
            Ok(Some(record)) => {
                let mut cache = self.cache.lock();
                if cache.epoch == epoch {
                    cache.records.put(id, record.clone());
                } else {
                    debug!("Write raced the read, not caching");
                }
                Ok(Some(record))
            }
            // Absence is never cached
            Ok(None) => Ok(None),
            Err(Error::Unavailable(reason)) => {
                warn!(%reason, "Backing store unavailable, treating record as absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn list(&self) -> Result<Vec<Record>> {
        Self::degrade("list", self.inner.list().await)
    }

    async fn list_paginated(&self, page: usize) -> Result<Vec<Record>> {
        Self::degrade("list_paginated", self.inner.list_paginated(page).await)
    }

    async fn add(&self, record: Record) -> Result<Outcome> {
        let id = record.id;
        let outcome = self.inner.add(record).await?;
        if outcome.is_success() {
            self.invalidate(id);
        }
        Ok(outcome)
    }

    async fn delete(&self, id: RecordId) -> Result<Outcome> {
        let outcome = self.inner.delete(id).await?;
        if outcome.is_success() {
            self.invalidate(id);
        }
        Ok(outcome)
    }

    async fn update(&self, record: Record) -> Result<Outcome> {
        let id = record.id;
        let outcome = self.inner.update(record).await?;
        if outcome.is_success() {
            self.invalidate(id);
        }
        Ok(outcome)
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>> {
        Self::degrade("search", self.inner.search(query).await)
    }

    async fn count(&self) -> Result<usize> {
        Self::degrade("count", self.inner.count().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ordered::OrderedMapStore;
    use crate::storage::record::Template;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Backing store that counts reads and can be switched off
    #[derive(Default)]
    struct RemoteStore {
        records: OrderedMapStore,
        down: AtomicBool,
        reads: AtomicUsize,
    }

    impl RemoteStore {
        fn check(&self) -> Result<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(Error::Unavailable("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RecordStore for RemoteStore {
        async fn get(&self, id: RecordId) -> Result<Option<Record>> {
            self.check()?;
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.records.get(id).await
        }

        async fn list(&self) -> Result<Vec<Record>> {
            self.check()?;
            self.records.list().await
        }

        async fn list_paginated(&self, page: usize) -> Result<Vec<Record>> {
            self.check()?;
            self.records.list_paginated(page).await
        }

        async fn add(&self, record: Record) -> Result<Outcome> {
            self.check()?;
            self.records.add(record).await
        }

        async fn delete(&self, id: RecordId) -> Result<Outcome> {
            self.check()?;
            self.records.delete(id).await
        }

        async fn update(&self, record: Record) -> Result<Outcome> {
            self.check()?;
            self.records.update(record).await
        }

        async fn search(&self, query: &str) -> Result<Vec<Record>> {
            self.check()?;
            self.records.search(query).await
        }
    }

    fn store() -> CachedStore<RemoteStore> {
        CachedStore::new(RemoteStore::default(), 2).unwrap()
    }

    #[tokio::test]
    async fn test_read_through_populates_cache() -> Result<()> {
        let store = store();
        let template = Template::default();
        let _ = store.add(template.blank(1, "A")).await?;
        assert!(!store.is_cached(1));

        assert_eq!(store.get(1).await?, Some(template.blank(1, "A")));
        assert!(store.is_cached(1));
        assert_eq!(store.get(1).await?, Some(template.blank(1, "A")));

        // Second read served from the cache
        assert_eq!(store.inner().reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.cache_stats().hits, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_writes_invalidate() -> Result<()> {
        let store = store();
        let template = Template::default();
        let _ = store.add(template.blank(1, "A")).await?;
        let _ = store.get(1).await?;

        assert_eq!(store.update(template.blank(1, "B")).await?, Outcome::Success);
        assert!(!store.is_cached(1));
        assert_eq!(store.get(1).await?, Some(template.blank(1, "B")));

        assert_eq!(store.delete(1).await?, Outcome::Success);
        assert!(store.cache_index().is_empty());
        assert_eq!(store.get(1).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_absence_is_not_cached() -> Result<()> {
        let store = store();
        assert_eq!(store.get(7).await?, None);
        assert!(!store.is_cached(7));

        let _ = store.add(Template::default().blank(7, "late")).await?;
        assert!(store.get(7).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_reads_as_absent() -> Result<()> {
        let store = store();
        let template = Template::default();
        let _ = store.add(template.blank(1, "A")).await?;

        store.inner().down.store(true, Ordering::SeqCst);
        assert_eq!(store.get(1).await?, None);
        assert!(!store.is_cached(1));
        assert!(store.list().await?.is_empty());
        assert!(store.search("A").await?.is_empty());
        assert!(matches!(
            store.add(template.blank(2, "B")).await,
            Err(Error::Unavailable(_))
        ));

        store.inner().down.store(false, Ordering::SeqCst);
        assert_eq!(store.get(1).await?, Some(template.blank(1, "A")));
        Ok(())
    }

    #[tokio::test]
    async fn test_cached_entry_survives_outage() -> Result<()> {
        let store = store();
        let _ = store.add(Template::default().blank(1, "A")).await?;
        let _ = store.get(1).await?;

        store.inner().down.store(true, Ordering::SeqCst);
        assert!(store.get(1).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() -> Result<()> {
        let store = store();
        let template = Template::default();
        let _ = store.add(template.blank(1, "A")).await?;
        let _ = store.get(1).await?;

        assert_eq!(store.add(template.blank(1, "dup")).await?, Outcome::AlreadyExists);
        assert!(store.is_cached(1));
        assert_eq!(store.update(template.blank(2, "x")).await?, Outcome::NotFound);
        assert_eq!(store.cache_index().len(), 1);
        Ok(())
    }

    /// Backing store whose `get` can stall after reading
    #[derive(Default)]
    struct StallingStore {
        records: OrderedMapStore,
        stall: AtomicBool,
        fetched: Notify,
        resume: Notify,
    }

    #[async_trait]
    impl RecordStore for StallingStore {
        async fn get(&self, id: RecordId) -> Result<Option<Record>> {
            let record = self.records.get(id).await?;
            if self.stall.load(Ordering::SeqCst) {
                self.fetched.notify_one();
                self.resume.notified().await;
            }
            Ok(record)
        }

        async fn list(&self) -> Result<Vec<Record>> {
            self.records.list().await
        }

        async fn list_paginated(&self, page: usize) -> Result<Vec<Record>> {
            self.records.list_paginated(page).await
        }

        async fn add(&self, record: Record) -> Result<Outcome> {
            self.records.add(record).await
        }

        async fn delete(&self, id: RecordId) -> Result<Outcome> {
            self.records.delete(id).await
        }

        async fn update(&self, record: Record) -> Result<Outcome> {
            self.records.update(record).await
        }

        async fn search(&self, query: &str) -> Result<Vec<Record>> {
            self.records.search(query).await
        }
    }

    #[tokio::test]
    async fn test_write_during_miss_is_not_overwritten() -> Result<()> {
        let template = Template::default();
        let store = Arc::new(CachedStore::new(StallingStore::default(), 2)?);
        let _ = store.add(template.blank(1, "old")).await?;
        store.inner().stall.store(true, Ordering::SeqCst);

        let reader = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.get(1).await }
        });
        store.inner().fetched.notified().await;

        assert_eq!(store.update(template.blank(1, "new")).await?, Outcome::Success);
        store.inner().stall.store(false, Ordering::SeqCst);
        store.inner().resume.notify_one();

        // The in-flight read answers with what it fetched but must not cache it
        assert_eq!(reader.await.unwrap()?, Some(template.blank(1, "old")));
        assert!(!store.is_cached(1));
        assert_eq!(store.get(1).await?, Some(template.blank(1, "new")));
        assert!(store.is_cached(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalidate_all_blocks_in_flight_fill() -> Result<()> {
        let template = Template::default();
        let store = Arc::new(CachedStore::new(StallingStore::default(), 2)?);
        let _ = store.add(template.blank(1, "A")).await?;
        store.inner().stall.store(true, Ordering::SeqCst);

        let reader = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.get(1).await }
        });
        store.inner().fetched.notified().await;

        store.invalidate_all();
        store.inner().stall.store(false, Ordering::SeqCst);
        store.inner().resume.notify_one();

        assert!(reader.await.unwrap()?.is_some());
        assert!(store.cache_index().is_empty());
        Ok(())
    }
}
