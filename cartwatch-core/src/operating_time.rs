//! Operating-Time Accumulation
//!
//! Converts the stream of debounced on/off states of one device into a
//! cumulative running time that survives reboots.
//!
//! ## Persistence Policy
//!
//! Flash has limited write endurance, so the total is not written every
//! cycle:
//! - on every on→off edge (the interval just closed is never lost)
//! - while running, at most once per persist interval (one minute by
//!   default), rolling the open interval into the total
//!
//! An abrupt power cut therefore loses at most one persist interval.
//!
//! ## Restore
//!
//! A slot that reads back as the erased sentinel, fails to read, or holds
//! more than ten years of operation is corrupt: the accumulator restarts at
//! zero and immediately re-persists so the next boot reads a sane value.

use core::fmt::Write;

use heapless::String;

use crate::{
    constants::time::{
        ERASED_SENTINEL, MS_PER_SECOND, OPERATING_TIME_CEILING_MS, PERSIST_INTERVAL_MS,
        SECONDS_PER_HOUR, SECONDS_PER_MINUTE,
    },
    time::{elapsed, Timestamp},
    traits::DurableStore,
};

/// Formatted operating time, `HH:MM:SS` (hours may exceed two digits)
pub type FormattedDuration = String<24>;

/// Render whole seconds of `ms` as zero-padded `HH:MM:SS`
pub fn format_hms(ms: u64) -> FormattedDuration {
    let seconds = ms / MS_PER_SECOND;
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;

    let mut out = FormattedDuration::new();
    // 24 bytes hold the widest u64 rendering, so the write cannot overflow.
    let _ = write!(out, "{:02}:{:02}:{:02}", hours, minutes, secs);
    out
}

/// Cumulative active time of one device
#[derive(Debug, Clone)]
pub struct OperatingTimeAccumulator {
    slot: u16,
    total_ms: u64,
    last_on: Option<Timestamp>,
    is_on: bool,
    was_on: bool,
    last_persisted: Timestamp,
    persist_interval_ms: u64,
}

impl OperatingTimeAccumulator {
    /// Restore the accumulator kept at `slot`
    pub fn restore<S: DurableStore>(slot: u16, store: &mut S, now: Timestamp) -> Self {
        Self::restore_with_interval(slot, store, now, PERSIST_INTERVAL_MS)
    }

    pub fn restore_with_interval<S: DurableStore>(
        slot: u16,
        store: &mut S,
        now: Timestamp,
        persist_interval_ms: u64,
    ) -> Self {
        let mut acc = Self {
            slot,
            total_ms: 0,
            last_on: None,
            is_on: false,
            was_on: false,
            last_persisted: now,
            persist_interval_ms,
        };

        match store.restore(slot) {
            Ok(value) if value != ERASED_SENTINEL && value <= OPERATING_TIME_CEILING_MS => {
                acc.total_ms = value;
            }
            Ok(value) => {
                log_warn!("Operating time at slot {} corrupt ({}), resetting", slot, value);
                acc.persist(store, now);
            }
            Err(_e) => {
                log_warn!("Operating time at slot {} unreadable: {}, resetting", slot, _e);
                acc.persist(store, now);
            }
        }
        acc
    }

    /// Feed the debounced running state for this cycle
    pub fn update<S: DurableStore>(&mut self, is_on: bool, now: Timestamp, store: &mut S) {
        self.is_on = is_on;

        if self.is_on && !self.was_on {
            self.last_on = Some(now);
        }

        if !self.is_on && self.was_on {
            if let Some(since) = self.last_on.take() {
                self.total_ms += elapsed(since, now);
                self.persist(store, now);
            }
        }

        if self.is_on && elapsed(self.last_persisted, now) > self.persist_interval_ms {
            if let Some(since) = self.last_on {
                self.total_ms += elapsed(since, now);
                self.last_on = Some(now);
                self.persist(store, now);
            }
        }

        self.was_on = self.is_on;
    }

    /// Total running time including the interval in progress
    pub fn get(&self, now: Timestamp) -> u64 {
        match (self.is_on, self.last_on) {
            (true, Some(since)) => self.total_ms + elapsed(since, now),
            _ => self.total_ms,
        }
    }

    /// [`get`](Self::get) rendered as `HH:MM:SS`
    pub fn formatted(&self, now: Timestamp) -> FormattedDuration {
        format_hms(self.get(now))
    }

    /// Zero the counter, e.g. after device replacement
    pub fn reset<S: DurableStore>(&mut self, now: Timestamp, store: &mut S) {
        self.total_ms = 0;
        self.last_on = if self.is_on { Some(now) } else { None };
        self.persist(store, now);
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn slot(&self) -> u16 {
        self.slot
    }

    /// Total already rolled into durable storage bookkeeping
    pub fn committed_ms(&self) -> u64 {
        self.total_ms
    }

    fn persist<S: DurableStore>(&mut self, store: &mut S, now: Timestamp) {
        if let Err(_e) = store.persist(self.slot, self.total_ms) {
            log_warn!("Persisting operating time to slot {} failed: {}", self.slot, _e);
        }
        self.last_persisted = now;
    }
}
