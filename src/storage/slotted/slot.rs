//! Slot addressing and occupancy for the slotted store

use crate::storage::record::RecordId;
use std::fmt;
use std::ops::Range;

/// Byte region of one record in the slot buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAddress {
    /// Record id the slot belongs to
    pub id: RecordId,
    /// First byte of the slot (inclusive)
    pub first_byte: usize,
    /// End of the slot (exclusive)
    pub last_byte: usize,
}

impl SlotAddress {
    pub fn new(id: RecordId, first_byte: usize, last_byte: usize) -> Self {
        Self {
            id,
            first_byte,
            last_byte,
        }
    }

    /// Byte range covered by this slot
    pub fn range(&self) -> Range<usize> {
        self.first_byte..self.last_byte
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Slot(id={}, bytes={}..{})",
            self.id, self.first_byte, self.last_byte
        )
    }
}

/// Occupancy of a slot, read from its first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Occupied,
}

impl SlotState {
    /// Zero sentinel means empty, anything else occupied
    pub fn from_sentinel(byte: u8) -> Self {
        if byte == 0 {
            SlotState::Empty
        } else {
            SlotState::Occupied
        }
    }

    pub fn is_occupied(self) -> bool {
        self == SlotState::Occupied
    }
}
