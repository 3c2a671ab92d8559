//! Ordered-map record store
//!
//! Records live in a `BTreeMap` keyed by id, so keyed operations are
//! logarithmic and listing is always in ascending id order.

use crate::error::Result;
use crate::storage::engine::{page_offset, Outcome, RecordStore, PAGE_SIZE};
use crate::storage::record::{Record, RecordId, Template};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// In-memory ordered-map store
#[derive(Default)]
pub struct OrderedMapStore {
    template: Template,
    records: Mutex<BTreeMap<RecordId, Record>>,
}

impl OrderedMapStore {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            records: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop every record
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

#[async_trait]
impl RecordStore for OrderedMapStore {
    async fn get(&self, id: RecordId) -> Result<Option<Record>> {
        Ok(self.records.lock().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.records.lock().values().cloned().collect())
    }

    async fn list_paginated(&self, page: usize) -> Result<Vec<Record>> {
        let Some(offset) = page_offset(page) else {
            return Ok(Vec::new());
        };
        Ok(self
            .records
            .lock()
            .values()
            .skip(offset)
            .take(PAGE_SIZE)
            .cloned()
            .collect())
    }

    async fn add(&self, record: Record) -> Result<Outcome> {
        let record = self.template.normalize(&record)?;
        match self.records.lock().entry(record.id) {
            Entry::Occupied(_) => Ok(Outcome::AlreadyExists),
            Entry::Vacant(slot) => {
                debug!(id = record.id, "Added record");
                slot.insert(record);
                Ok(Outcome::Success)
            }
        }
    }

    async fn delete(&self, id: RecordId) -> Result<Outcome> {
        match self.records.lock().remove(&id) {
            Some(_) => {
                debug!(id, "Deleted record");
                Ok(Outcome::Success)
            }
            None => Ok(Outcome::NotFound),
        }
    }

    async fn update(&self, record: Record) -> Result<Outcome> {
        let record = self.template.normalize(&record)?;
        match self.records.lock().get_mut(&record.id) {
            Some(stored) => {
                debug!(id = record.id, "Updated record");
                *stored = record;
                Ok(Outcome::Success)
            }
            None => Ok(Outcome::NotFound),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>> {
        let field = self.template.searchable_field();
        Ok(self
            .records
            .lock()
            .values()
            .filter(|record| record.matches(field, query))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.len())
    }
}
