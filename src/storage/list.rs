//! List-backed record store
//!
//! Keeps records in insertion order in a plain vector. Every keyed
//! operation is a linear scan, so this is the slowest backend and the
//! simplest reference for the contract.

use crate::error::Result;
use crate::storage::engine::{page_offset, Outcome, RecordStore, PAGE_SIZE};
use crate::storage::record::{Record, RecordId, Template};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

/// In-memory list store
#[derive(Default)]
pub struct ListStore {
    template: Template,
    records: Mutex<Vec<Record>>,
}

impl ListStore {
    /// Create an empty store for records of `template`
    pub fn new(template: Template) -> Self {
        Self {
            template,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Get the number of records stored
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    fn position(records: &[Record], id: RecordId) -> Option<usize> {
        records.iter().position(|record| record.id == id)
    }
}

#[async_trait]
impl RecordStore for ListStore {
    async fn get(&self, id: RecordId) -> Result<Option<Record>> {
        let records = self.records.lock();
        Ok(Self::position(&records, id).map(|i| records[i].clone()))
    }

    async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.records.lock().clone())
    }

    async fn list_paginated(&self, page: usize) -> Result<Vec<Record>> {
        let Some(offset) = page_offset(page) else {
            return Ok(Vec::new());
        };
        let records = self.records.lock();
        Ok(records.iter().skip(offset).take(PAGE_SIZE).cloned().collect())
    }

    async fn add(&self, record: Record) -> Result<Outcome> {
        let record = self.template.normalize(&record)?;
        let mut records = self.records.lock();
        if Self::position(&records, record.id).is_some() {
            return Ok(Outcome::AlreadyExists);
        }
        debug!(id = record.id, "Added record");
        records.push(record);
        Ok(Outcome::Success)
    }

    async fn delete(&self, id: RecordId) -> Result<Outcome> {
        let mut records = self.records.lock();
        match Self::position(&records, id) {
            Some(i) => {
                records.remove(i);
                debug!(id, "Deleted record");
                Ok(Outcome::Success)
            }
            None => Ok(Outcome::NotFound),
        }
    }

    async fn update(&self, record: Record) -> Result<Outcome> {
        let record = self.template.normalize(&record)?;
        let mut records = self.records.lock();
        match Self::position(&records, record.id) {
            Some(i) => {
                debug!(id = record.id, "Updated record");
                records[i] = record;
                Ok(Outcome::Success)
            }
            None => Ok(Outcome::NotFound),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>> {
        let field = self.template.searchable_field();
        let records = self.records.lock();
        Ok(records
            .iter()
            .filter(|record| record.matches(field, query))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.len())
    }
}
