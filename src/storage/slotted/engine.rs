//! RecordStore implementation for the slot buffer

use super::buffer::{SlotBuffer, SlotStats};
use super::layout::{DEFAULT_CAPACITY, DEFAULT_FIELD_WIDTH};
use crate::error::Result;
use crate::storage::engine::{Outcome, RecordStore};
use crate::storage::record::{Record, RecordId, Template};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Fixed-capacity store with O(1) slot addressing
///
/// Wraps a [`SlotBuffer`] behind one lock. Encoding and byte copy of a
/// write are not atomic on their own, so every operation holds the lock
/// for its whole duration.
pub struct SlottedStore {
    inner: Mutex<SlotBuffer>,
}

impl SlottedStore {
    /// Create a store of `capacity` slots, `field_width` bytes per field
    pub fn new(capacity: usize, field_width: usize, template: Template) -> Result<Self> {
        let inner = SlotBuffer::new(capacity, field_width, template)?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Create with default settings (15 slots, 40 bytes per field)
    pub fn with_defaults(template: Template) -> Result<Self> {
        Self::new(DEFAULT_CAPACITY, DEFAULT_FIELD_WIDTH, template)
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().layout().capacity
    }

    pub fn template(&self) -> Template {
        self.inner.lock().template().clone()
    }

    /// Copy of one slot's raw bytes, `None` when out of range
    pub fn slot_bytes(&self, id: RecordId) -> Option<Vec<u8>> {
        self.inner.lock().slot_bytes(id).map(<[u8]>::to_vec)
    }

    pub fn stats(&self) -> SlotStats {
        self.inner.lock().stats()
    }
}

#[async_trait]
impl RecordStore for SlottedStore {
    async fn get(&self, id: RecordId) -> Result<Option<Record>> {
        self.inner.lock().get(id)
    }

    async fn list(&self) -> Result<Vec<Record>> {
        self.inner.lock().list()
    }

    async fn list_paginated(&self, page: usize) -> Result<Vec<Record>> {
        self.inner.lock().list_paginated(page)
    }

    async fn add(&self, record: Record) -> Result<Outcome> {
        self.inner.lock().add(&record)
    }

    async fn delete(&self, id: RecordId) -> Result<Outcome> {
        Ok(self.inner.lock().delete(id))
    }

    async fn update(&self, record: Record) -> Result<Outcome> {
        self.inner.lock().update(&record)
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>> {
        self.inner.lock().search(query)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.lock().occupied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_slotted_store_scenario() -> Result<()> {
        let template = Template::default();
        let store = SlottedStore::new(4, 40, template.clone())?;

        assert_eq!(store.add(template.blank(1, "A")).await?, Outcome::Success);
        assert_eq!(store.add(template.blank(1, "B")).await?, Outcome::AlreadyExists);
        assert_eq!(store.get(1).await?, Some(template.blank(1, "A")));

        assert_eq!(store.update(template.blank(1, "C")).await?, Outcome::Success);
        assert_eq!(store.get(1).await?, Some(template.blank(1, "C")));

        assert_eq!(store.delete(1).await?, Outcome::Success);
        assert_eq!(store.get(1).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_slotted_store_bounds() -> Result<()> {
        let template = Template::default();
        let store = SlottedStore::new(4, 40, template.clone())?;

        assert_eq!(store.get(5).await?, None);
        assert!(matches!(
            store.add(template.blank(5, "x")).await,
            Err(Error::OutOfRange { id: 5, capacity: 4 })
        ));
        assert_eq!(store.delete(0).await?, Outcome::NotFound);
        assert!(store.slot_bytes(5).is_none());
        assert_eq!(store.stats().occupied, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_slotted_store_pages_over_occupied_slots() -> Result<()> {
        let template = Template::default();
        let store = SlottedStore::new(40, 40, template.clone())?;
        let ids: Vec<RecordId> = (1..=40).filter(|id| id % 3 == 0).collect();
        for &id in &ids {
            let _ = store.add(template.blank(id, "x")).await?;
        }

        let page = |records: Vec<Record>| records.iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(page(store.list_paginated(1).await?), ids[..10].to_vec());
        assert_eq!(page(store.list_paginated(2).await?), ids[10..].to_vec());
        assert!(store.list_paginated(3).await?.is_empty());
        assert_eq!(store.count().await?, 13);
        assert_eq!(store.page_count().await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_last_slot_is_listed() -> Result<()> {
        let template = Template::default();
        let store = SlottedStore::with_defaults(template.clone())?;
        let _ = store.add(template.blank(15, "last")).await?;

        assert_eq!(store.capacity(), 15);
        assert_eq!(store.list().await?, vec![template.blank(15, "last")]);
        Ok(())
    }
}
