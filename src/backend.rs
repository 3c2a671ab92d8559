//! Backend selection
//!
//! The backend kind is a closed enum resolved once at startup. [`Backend`]
//! dispatches the [`RecordStore`] contract to whichever store was built.

use crate::config::StoreConfig;
use crate::error::Result;
use crate::storage::{
    CachedStore, ListStore, OrderedMapStore, Outcome, Record, RecordId, RecordStore, SlottedStore,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Available storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum BackendKind {
    /// Vector scanned linearly
    List,
    /// BTreeMap keyed by id
    OrderedMap,
    /// Fixed-size slots in one byte buffer
    Slotted,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::List => write!(f, "list"),
            BackendKind::OrderedMap => write!(f, "ordered_map"),
            BackendKind::Slotted => write!(f, "slotted"),
        }
    }
}

/// A constructed backend
pub enum Backend {
    List(ListStore),
    OrderedMap(OrderedMapStore),
    Slotted(SlottedStore),
    Cached(Box<CachedStore<Backend>>),
}

impl Backend {
    /// Build the configured backend, wrapped in the LRU overlay if enabled
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let template = config.template.clone();
        let backend = match config.backend {
            BackendKind::List => Backend::List(ListStore::new(template)),
            BackendKind::OrderedMap => Backend::OrderedMap(OrderedMapStore::new(template)),
            BackendKind::Slotted => Backend::Slotted(SlottedStore::new(
                config.slotted.capacity,
                config.slotted.field_width,
                template,
            )?),
        };

        info!(backend = %config.backend, cache = config.cache.enabled, "Storage backend selected");

        if config.cache.enabled {
            let cached = CachedStore::new(backend, config.cache.capacity)?;
            return Ok(Backend::Cached(Box::new(cached)));
        }
        Ok(backend)
    }

    /// Kind of the underlying store
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::List(_) => BackendKind::List,
            Backend::OrderedMap(_) => BackendKind::OrderedMap,
            Backend::Slotted(_) => BackendKind::Slotted,
            Backend::Cached(cached) => cached.inner().kind(),
        }
    }

    /// The LRU overlay, if one is installed
    pub fn cache(&self) -> Option<&CachedStore<Backend>> {
        match self {
            Backend::Cached(cached) => Some(cached),
            _ => None,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("kind", &self.kind())
            .field("cached", &self.cache().is_some())
            .finish()
    }
}

#[async_trait]
impl RecordStore for Backend {
    async fn get(&self, id: RecordId) -> Result<Option<Record>> {
        match self {
            Backend::List(store) => store.get(id).await,
            Backend::OrderedMap(store) => store.get(id).await,
            Backend::Slotted(store) => store.get(id).await,
            Backend::Cached(store) => store.get(id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Record>> {
        match self {
            Backend::List(store) => store.list().await,
            Backend::OrderedMap(store) => store.list().await,
            Backend::Slotted(store) => store.list().await,
            Backend::Cached(store) => store.list().await,
        }
    }

    async fn list_paginated(&self, page: usize) -> Result<Vec<Record>> {
        match self {
            Backend::List(store) => store.list_paginated(page).await,
            Backend::OrderedMap(store) => store.list_paginated(page).await,
            Backend::Slotted(store) => store.list_paginated(page).await,
            Backend::Cached(store) => store.list_paginated(page).await,
        }
    }

    async fn add(&self, record: Record) -> Result<Outcome> {
        match self {
            Backend::List(store) => store.add(record).await,
            Backend::OrderedMap(store) => store.add(record).await,
            Backend::Slotted(store) => store.add(record).await,
            Backend::Cached(store) => store.add(record).await,
        }
    }

    async fn delete(&self, id: RecordId) -> Result<Outcome> {
        match self {
            Backend::List(store) => store.delete(id).await,
            Backend::OrderedMap(store) => store.delete(id).await,
            Backend::Slotted(store) => store.delete(id).await,
            Backend::Cached(store) => store.delete(id).await,
        }
    }

    async fn update(&self, record: Record) -> Result<Outcome> {
        match self {
            Backend::List(store) => store.update(record).await,
            Backend::OrderedMap(store) => store.update(record).await,
            Backend::Slotted(store) => store.update(record).await,
            Backend::Cached(store) => store.update(record).await,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>> {
        match self {
            Backend::List(store) => store.search(query).await,
            Backend::OrderedMap(store) => store.search(query).await,
            Backend::Slotted(store) => store.search(query).await,
            Backend::Cached(store) => store.search(query).await,
        }
    }

    async fn count(&self) -> Result<usize> {
        match self {
            Backend::List(store) => store.count().await,
            Backend::OrderedMap(store) => store.count().await,
            Backend::Slotted(store) => store.count().await,
            Backend::Cached(store) => store.count().await,
        }
    }
}
