//! Flat byte buffer holding one fixed-size slot per record id
//!
//! Combines [`SlotLayout`] addressing with JSON encoding of a record's
//! non-id fields. The id is never stored; it is implied by the slot position.
//!
//! # Slot format
//!
//! ```text
//! first_byte                                  last_byte
//! |{"title":"A","value":"x"}\0\0\0\0 ... \0\0|
//!  ^ non-zero sentinel = occupied
//! ```
//!
//! serde_json escapes U+0000, so an encoded payload never contains a raw
//! zero byte and never starts with one. Trailing zeros are padding.

use super::layout::SlotLayout;
use super::slot::{SlotAddress, SlotState};
use crate::error::{Error, Result};
use crate::storage::engine::{page_offset, Outcome, PAGE_SIZE};
use crate::storage::record::{Fields, Record, RecordId, Template};
use tracing::{debug, info};

/// Slot buffer with encoding and slot lifecycle
pub struct SlotBuffer {
    layout: SlotLayout,
    template: Template,
    bytes: Vec<u8>,
}

impl SlotBuffer {
    /// Allocate a zeroed buffer of `capacity` slots
    ///
    /// Fails if the template's fixed encoding overhead (field names and
    /// punctuation of an all-empty record) does not fit in one slot.
    pub fn new(capacity: usize, field_width: usize, template: Template) -> Result<Self> {
        let layout = SlotLayout::new(capacity, field_width, template.len())?;

        let overhead = encode(&template.blank(0, "").fields)?.len();
        if !layout.can_fit(overhead) {
            return Err(Error::Serialization(format!(
                "template needs {} bytes per record but slots are {} bytes",
                overhead, layout.entry_length
            )));
        }

        info!(
            capacity,
            field_width,
            entry_length = layout.entry_length,
            "Allocated slot buffer"
        );

        Ok(Self {
            bytes: vec![0; layout.buffer_len()],
            layout,
            template,
        })
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Occupancy of the slot at `addr`
    fn state(&self, addr: &SlotAddress) -> SlotState {
        SlotState::from_sentinel(self.bytes[addr.first_byte])
    }

    /// Raw bytes of one slot, `None` when out of range
    pub fn slot_bytes(&self, id: RecordId) -> Option<&[u8]> {
        self.layout.address(id).map(|addr| &self.bytes[addr.range()])
    }

    /// Decode the record at `addr`, `None` when the slot is empty
    fn read(&self, addr: &SlotAddress) -> Result<Option<Record>> {
        if !self.state(addr).is_occupied() {
            return Ok(None);
        }

        let slot = &self.bytes[addr.range()];
        let end = slot.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let fields: Fields = serde_json::from_slice(&slot[..end]).map_err(|e| {
            Error::Serialization(format!("Failed to decode {}: {}", addr, e))
        })?;
        let fields = self.template.conform(&fields).map_err(|e| {
            Error::Serialization(format!("Decoded {} does not match template: {}", addr, e))
        })?;

        Ok(Some(Record::new(addr.id, fields)))
    }

    /// Write `payload` at `addr` and zero the rest of the slot
    fn write(&mut self, addr: &SlotAddress, payload: &[u8]) {
        let slot = &mut self.bytes[addr.range()];
        slot[..payload.len()].copy_from_slice(payload);
        slot[payload.len()..].fill(0);
    }

    /// Encode a record's fields, checking they fit in one slot
    fn encode_record(&self, record: &Record) -> Result<Vec<u8>> {
        let fields = self.template.conform(&record.fields)?;
        let payload = encode(&fields)?;
        if !self.layout.can_fit(payload.len()) {
            return Err(Error::Serialization(format!(
                "record {} needs {} bytes but slots are {} bytes",
                record.id,
                payload.len(),
                self.layout.entry_length
            )));
        }
        Ok(payload)
    }

    /// Get the record stored for `id`
    pub fn get(&self, id: RecordId) -> Result<Option<Record>> {
        match self.layout.address(id) {
            Some(addr) => self.read(&addr),
            None => Ok(None),
        }
    }

    /// Addresses of occupied slots in ascending id order
    fn occupied_slots(&self) -> impl Iterator<Item = SlotAddress> + '_ {
        self.layout
            .ids()
            .filter_map(|id| self.layout.address(id))
            .filter(|addr| self.state(addr).is_occupied())
    }

    /// All records in ascending id order
    pub fn list(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for addr in self.occupied_slots() {
            records.extend(self.read(&addr)?);
        }
        Ok(records)
    }

    /// One page of occupied slots in ascending id order
    ///
    /// Slots before the page are skipped on their sentinel byte alone and
    /// the scan stops once the page is full.
    pub fn list_paginated(&self, page: usize) -> Result<Vec<Record>> {
        let Some(offset) = page_offset(page) else {
            return Ok(Vec::new());
        };
        let mut records = Vec::with_capacity(PAGE_SIZE);
        for addr in self.occupied_slots().skip(offset).take(PAGE_SIZE) {
            records.extend(self.read(&addr)?);
        }
        Ok(records)
    }

    /// Insert into an empty slot
    ///
    /// Ids outside `1..=capacity` are rejected with [`Error::OutOfRange`].
    pub fn add(&mut self, record: &Record) -> Result<Outcome> {
        let addr = self.layout.address(record.id).ok_or(Error::OutOfRange {
            id: record.id,
            capacity: self.layout.capacity as u64,
        })?;

        if self.state(&addr).is_occupied() {
            return Ok(Outcome::AlreadyExists);
        }

        let payload = self.encode_record(record)?;
        self.write(&addr, &payload);
        debug!(%addr, payload_len = payload.len(), "Added record");
        Ok(Outcome::Success)
    }

    /// Zero-fill an occupied slot
    pub fn delete(&mut self, id: RecordId) -> Outcome {
        let Some(addr) = self.layout.address(id) else {
            return Outcome::NotFound;
        };
        if !self.state(&addr).is_occupied() {
            return Outcome::NotFound;
        }

        self.bytes[addr.range()].fill(0);
        debug!(%addr, "Deleted record");
        Outcome::Success
    }

    /// Overwrite an occupied slot, zeroing whatever the old payload left behind
    pub fn update(&mut self, record: &Record) -> Result<Outcome> {
        let Some(addr) = self.layout.address(record.id) else {
            return Ok(Outcome::NotFound);
        };
        if !self.state(&addr).is_occupied() {
            return Ok(Outcome::NotFound);
        }

        let payload = self.encode_record(record)?;
        self.write(&addr, &payload);
        debug!(%addr, payload_len = payload.len(), "Updated record");
        Ok(Outcome::Success)
    }

    /// Records whose searchable field contains `query`
    pub fn search(&self, query: &str) -> Result<Vec<Record>> {
        let field = self.template.searchable_field();
        Ok(self
            .list()?
            .into_iter()
            .filter(|record| record.matches(field, query))
            .collect())
    }

    /// Number of occupied slots
    pub fn occupied(&self) -> usize {
        self.occupied_slots().count()
    }

    /// Buffer statistics
    pub fn stats(&self) -> SlotStats {
        let used_bytes = self
            .bytes
            .chunks(self.layout.entry_length)
            .filter(|slot| slot[0] != 0)
            .map(|slot| slot.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1))
            .sum::<usize>();

        SlotStats {
            capacity: self.layout.capacity,
            entry_length: self.layout.entry_length,
            occupied: self.occupied(),
            used_bytes,
        }
    }
}

/// Encode fields as compact JSON
fn encode(fields: &Fields) -> Result<Vec<u8>> {
    serde_json::to_vec(fields)
        .map_err(|e| Error::Serialization(format!("Failed to encode fields: {}", e)))
}

/// Slot buffer statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotStats {
    pub capacity: usize,
    pub entry_length: usize,
    pub occupied: usize,
    pub used_bytes: usize,
}
