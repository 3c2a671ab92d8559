//! Storage layer
//!
//! # Architecture
//!
//! Every backend implements one contract, [`RecordStore`]:
//!
//! ```text
//! RecordStore (get, list, list_paginated, add, delete, update, search)
//!   ├─→ ListStore        Vec<Record>, linear scans
//!   ├─→ OrderedMapStore  BTreeMap<id, Record>
//!   ├─→ SlottedStore     fixed-size slots in one byte buffer
//!   └─→ CachedStore<S>   LRU overlay in front of another store
//! ```
//!
//! Mutations are existence-gated and report [`Outcome`] values; the error
//! side of `Result` is reserved for serialization faults, out-of-range ids
//! on insert, invalid input and unavailable backing stores.
//!
//! ## Search
//!
//! All in-memory backends match `query` as a case-sensitive substring of
//! the decoded searchable field (the first template field). An empty query
//! matches every record.

pub mod cache;
pub mod engine;
pub mod list;
pub mod ordered;
pub mod record;
pub mod slotted;

pub use cache::{CacheStats, CachedStore, RecordCache};
pub use engine::{pages_for, Outcome, RecordStore, PAGE_SIZE};
pub use list::ListStore;
pub use ordered::OrderedMapStore;
pub use record::{Fields, Record, RecordId, Template};
pub use slotted::{SlotStats, SlottedStore};
