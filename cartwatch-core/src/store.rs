//! In-memory durable store
//!
//! A [`DurableStore`] backed by a fixed-capacity map. Useful on hosts
//! without flash and in tests; slots that were never written read back as
//! the erased sentinel, exactly like a blank flash page.

use heapless::LinearMap;

use crate::{
    constants::time::ERASED_SENTINEL,
    errors::{StoreError, StoreResult},
    traits::DurableStore,
};

/// Maximum number of distinct slots the memory store can hold
pub const MEMORY_STORE_SLOTS: usize = 16;

/// Durable store kept in RAM
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: LinearMap<u16, u64, MEMORY_STORE_SLOTS>,
    writes: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a slot, e.g. to simulate a previous boot
    pub fn with_slot(mut self, slot: u16, value: u64) -> Self {
        // Capacity covers every channel slot; extra test slots past it are dropped.
        let _ = self.slots.insert(slot, value);
        self
    }

    /// Value currently held at `slot`, if it was ever written
    pub fn get(&self, slot: u16) -> Option<u64> {
        self.slots.get(&slot).copied()
    }

    /// Number of successful writes since creation
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl DurableStore for MemoryStore {
    fn restore(&mut self, slot: u16) -> StoreResult<u64> {
        Ok(self.slots.get(&slot).copied().unwrap_or(ERASED_SENTINEL))
    }

    fn persist(&mut self, slot: u16, value: u64) -> StoreResult<()> {
        self.slots
            .insert(slot, value)
            .map_err(|_| StoreError::WriteFailed { slot })?;
        self.writes += 1;
        Ok(())
    }
}
