//! Record store trait

use super::record::{Record, RecordId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Records per page for every backend offering pagination
pub const PAGE_SIZE: usize = 10;

/// Result of an existence-gated mutation
///
/// Not-found and conflict are ordinary outcomes, not errors.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    NotFound,
    AlreadyExists,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::NotFound => write!(f, "not found"),
            Outcome::AlreadyExists => write!(f, "already exists"),
        }
    }
}

/// Zero-based offset of the first record on a 1-based page
///
/// Returns `None` for page 0.
pub fn page_offset(page: usize) -> Option<usize> {
    page.checked_sub(1)?.checked_mul(PAGE_SIZE)
}

/// Number of pages needed for `count` records
pub fn pages_for(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE)
}

/// Storage contract every backend implements
///
/// Mutations are existence-gated: `add` requires the id to be absent,
/// `update` and `delete` require it to be present. There is no upsert.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get one record; `None` when no record has this id
    async fn get(&self, id: RecordId) -> Result<Option<Record>>;

    /// All records (empty when the store is empty)
    async fn list(&self) -> Result<Vec<Record>>;

    /// Up to [`PAGE_SIZE`] records of a 1-based page; out-of-range pages are empty
    async fn list_paginated(&self, page: usize) -> Result<Vec<Record>>;

    /// Insert a record whose id is not present yet
    async fn add(&self, record: Record) -> Result<Outcome>;

    /// Remove the record with this id
    async fn delete(&self, id: RecordId) -> Result<Outcome>;

    /// Replace the fields of an existing record
    async fn update(&self, record: Record) -> Result<Outcome>;

    /// Records whose searchable field contains `query` (case-sensitive)
    async fn search(&self, query: &str) -> Result<Vec<Record>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }

    /// Number of pages `list_paginated` serves
    async fn page_count(&self) -> Result<usize> {
        Ok(pages_for(self.count().await?))
    }
}
