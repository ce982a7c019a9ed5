//! Seams to the external collaborators
//!
//! The core owns no hardware. Durable storage and the audible alert are
//! reached through these traits so the same engine runs on the node, on a
//! host and in tests.

use crate::errors::StoreResult;

/// Word-addressed durable store for operating-time accumulators.
///
/// Each channel owns one fixed slot. An erased slot reads back as
/// [`ERASED_SENTINEL`](crate::constants::time::ERASED_SENTINEL).
pub trait DurableStore {
    /// Read the value stored at `slot`
    fn restore(&mut self, slot: u16) -> StoreResult<u64>;

    /// Write and commit `value` at `slot`
    fn persist(&mut self, slot: u16, value: u64) -> StoreResult<()>;
}

impl<S: DurableStore + ?Sized> DurableStore for &mut S {
    fn restore(&mut self, slot: u16) -> StoreResult<u64> {
        (**self).restore(slot)
    }

    fn persist(&mut self, slot: u16, value: u64) -> StoreResult<()> {
        (**self).persist(slot, value)
    }
}

/// Driver for the audible/visual alert.
///
/// Called by the host when [`CycleReport::sound_alert`](crate::CycleReport::sound_alert)
/// is set. Tone generation is entirely the implementor's business.
pub trait AlertSink {
    /// Emit one warning pattern
    fn sound_warning(&mut self);
}
