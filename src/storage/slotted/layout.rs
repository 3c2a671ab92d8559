//! Fixed slot geometry
//!
//! Every slot is `field_width * field_count` bytes and slot `id` starts at
//! `(id - 1) * entry_length`. Ids outside `1..=capacity` have no address.

use super::slot::SlotAddress;
use crate::error::{Error, Result};
use crate::storage::record::RecordId;
use std::ops::RangeInclusive;

/// Default number of slots
pub const DEFAULT_CAPACITY: usize = 15;

/// Default bytes reserved per non-id field
pub const DEFAULT_FIELD_WIDTH: usize = 40;

/// Geometry of a slot buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    /// Number of slots (valid ids are `1..=capacity`)
    pub capacity: usize,
    /// Bytes reserved per non-id field
    pub field_width: usize,
    /// Bytes per slot
    pub entry_length: usize,
}

impl SlotLayout {
    /// Compute the layout for `capacity` slots of `field_count` fields each
    pub fn new(capacity: usize, field_width: usize, field_count: usize) -> Result<Self> {
        if capacity == 0 || field_width == 0 || field_count == 0 {
            return Err(Error::Serialization(format!(
                "degenerate slot layout: capacity={}, field_width={}, fields={}",
                capacity, field_width, field_count
            )));
        }

        let entry_length = field_width
            .checked_mul(field_count)
            .filter(|len| len.checked_mul(capacity).is_some())
            .ok_or_else(|| {
                Error::Serialization(format!(
                    "slot buffer of {} x {} x {} bytes overflows",
                    capacity, field_width, field_count
                ))
            })?;

        Ok(Self {
            capacity,
            field_width,
            entry_length,
        })
    }

    /// Total buffer length in bytes
    pub fn buffer_len(&self) -> usize {
        self.entry_length * self.capacity
    }

    /// Check if an id has a slot
    pub fn contains(&self, id: RecordId) -> bool {
        id >= 1 && id <= self.capacity as u64
    }

    /// Slot address for an id, `None` when out of range
    pub fn address(&self, id: RecordId) -> Option<SlotAddress> {
        if !self.contains(id) {
            return None;
        }
        let first_byte = (id as usize - 1) * self.entry_length;
        let last_byte = first_byte + self.entry_length;
        Some(SlotAddress::new(id, first_byte, last_byte))
    }

    /// Check if a payload of `len` bytes fits in one slot
    pub fn can_fit(&self, len: usize) -> bool {
        len <= self.entry_length
    }

    /// All valid ids in ascending order
    pub fn ids(&self) -> RangeInclusive<RecordId> {
        1..=self.capacity as u64
    }
}
