//! Common test utilities for integration tests
//!
//! This module provides:
//! - A durable store that records every write
//! - A cart harness driving the engine with a fixed clock
//! - Ready-made cycle inputs (see [`scenarios`])

#![allow(dead_code)]

use cartwatch_core::{
    time::FixedTime, AlertSink, CycleInput, CycleReport, DurableStore, Engine, EngineConfig,
    MemoryStore, StoreResult, TimeSource, Timestamp,
};

pub mod scenarios;

/// Memory store that keeps a log of `(slot, value)` writes
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub writes: Vec<(u16, u64)>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(slot: u16, value: u64) -> Self {
        Self {
            inner: MemoryStore::new().with_slot(slot, value),
            writes: Vec::new(),
        }
    }

    pub fn value(&self, slot: u16) -> Option<u64> {
        self.inner.get(slot)
    }

    pub fn writes_to(&self, slot: u16) -> usize {
        self.writes.iter().filter(|(s, _)| *s == slot).count()
    }
}

impl DurableStore for RecordingStore {
    fn restore(&mut self, slot: u16) -> StoreResult<u64> {
        self.inner.restore(slot)
    }

    fn persist(&mut self, slot: u16, value: u64) -> StoreResult<()> {
        self.inner.persist(slot, value)?;
        self.writes.push((slot, value));
        Ok(())
    }
}

/// Alert driver counting how often it was asked to sound
#[derive(Debug, Default)]
pub struct CountingSink {
    pub sounded: u32,
}

impl AlertSink for CountingSink {
    fn sound_warning(&mut self) {
        self.sounded += 1;
    }
}

/// Engine plus clock, advanced one cycle at a time
pub struct CartHarness {
    pub engine: Engine<RecordingStore>,
    pub clock: FixedTime,
}

impl CartHarness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_store(config, RecordingStore::new())
    }

    pub fn with_store(config: EngineConfig, store: RecordingStore) -> Self {
        let clock = FixedTime::new(0);
        let engine = Engine::new(config, store, clock.now()).expect("valid config");
        Self { engine, clock }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Run a cycle at the current time
    pub fn cycle(&mut self, input: &CycleInput) -> CycleReport {
        self.engine.run_cycle_with(input, &self.clock)
    }

    /// Move the clock forward, then run a cycle
    pub fn cycle_after(&mut self, ms: u64, input: &CycleInput) -> CycleReport {
        self.clock.advance(ms);
        self.cycle(input)
    }

    /// Run `count` cycles `interval_ms` apart, returning the last report
    pub fn run(&mut self, input: &CycleInput, count: usize, interval_ms: u64) -> CycleReport {
        let mut last = None;
        for _ in 0..count {
            last = Some(self.cycle_after(interval_ms, input));
        }
        last.expect("at least one cycle")
    }
}
