//! Change-detection and alarm engine for an equipment-cart telemetry node
//!
//! Takes the raw readings of one sampling cycle (six metered sockets, a
//! leakage-current sensor and an ambient probe) and decides what the
//! transport layer has to publish: filtered values, a change flag per
//! field, threshold alarms, debounced "machine running" states and
//! per-device operating time.
//!
//! Key constraints:
//! - `no_std`, no heap: every buffer is fixed-size
//! - Noise-aware deltas so a quiet cart sends nothing
//! - Power-up transients never show up as alarms or "machine on" events
//!
//! ```no_run
//! use cartwatch_core::{CycleInput, Engine, EngineConfig, MemoryStore};
//!
//! let mut engine = Engine::new(EngineConfig::default(), MemoryStore::new(), 0).unwrap();
//!
//! // Once per sampling period
//! let report = engine.run_cycle(&CycleInput::unpowered(), 1000);
//! if report.has_changes() {
//!     // hand the flagged fields to the transport
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod logging;

pub mod alarm;
pub mod channel;
pub mod config;
pub mod constants;
pub mod delta;
pub mod diagnostics;
pub mod engine;
pub mod environment;
pub mod errors;
pub mod filter;
pub mod leak;
pub mod operating_time;
pub mod report;
pub mod store;
pub mod time;
pub mod traits;
pub mod validation;
pub mod warmup;

// Public API
pub use alarm::{AlarmAggregator, AlertScheduler, WarningSource};
pub use channel::{Channel, ChannelState, ElectricalSample, ElectricalValues, PowerAlarms};
pub use config::{
    Bounds, DeviceLimits, EngineConfig, EnvironmentBounds, EnvironmentEnvelope, FieldPolicies,
    LeakThresholds,
};
pub use delta::DeltaPolicy;
pub use diagnostics::SnapshotView;
pub use engine::{CycleInput, Engine, VoltagePlan};
pub use environment::{AmbientSample, BoundAlarms, EnvironmentCartState, EnvironmentDeviceState};
pub use errors::{ConfigError, SampleError, StoreError, StoreResult};
pub use filter::MedianFilter;
pub use leak::{LeakSample, LeakSensorState};
pub use operating_time::{format_hms, OperatingTimeAccumulator};
pub use report::{
    BoundFlags, CartFlags, CartReport, ChannelFlags, ChannelReport, CycleReport,
    DeviceEnvironmentReport, LeakFlags, LeakReport, PublishPhase,
};
pub use store::MemoryStore;
pub use time::{TimeSource, Timestamp};
pub use traits::{AlertSink, DurableStore};
pub use warmup::{Gate, WarmupSupervisor};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
