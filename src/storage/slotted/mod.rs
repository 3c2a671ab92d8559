//! Slotted store
//!
//! A fixed number of equal-size slots in one flat byte buffer. Slot
//! addresses are pure arithmetic on the record id, so there is no
//! allocation step and no free list.
//!
//! # Architecture
//!
//! ```text
//! SlottedStore (lock)
//!   └─→ SlotBuffer
//!        ├─→ SlotLayout   id → [first_byte, last_byte)
//!        ├─→ Template     field order, JSON encode / decode
//!        └─→ Vec<u8>      |slot 1|slot 2|...|slot N|
//! ```
//!
//! A slot whose first byte is zero is empty. Deleting zero-fills the whole
//! slot; writing zero-fills everything after the new payload.

pub mod buffer;
pub mod engine;
pub mod layout;
pub mod slot;

pub use buffer::{SlotBuffer, SlotStats};
pub use engine::SlottedStore;
pub use layout::{SlotLayout, DEFAULT_CAPACITY, DEFAULT_FIELD_WIDTH};
pub use slot::{SlotAddress, SlotState};
