//! Constants for the Telemetry Core
//!
//! Every numeric value the engine relies on lives here, with its unit and
//! where it comes from. The defaults of [`EngineConfig`](crate::EngineConfig)
//! are built from these tables.
//!
//! ## Organization
//!
//! - **Sensors**: meter ranges and delta-policy terms (accuracy, resolution, noise)
//! - **Limits**: per-device alarm thresholds and environment envelopes
//! - **Time**: warm-up, persistence and alert intervals

/// Meter ranges and noise characteristics of the cart's sensors.
pub mod sensors;

/// Alarm thresholds for devices, the room and the leakage sensor.
pub mod limits;

/// Time intervals and conversion factors.
pub mod time;

pub use sensors::{
    METER_VOLTAGE_MIN_V, METER_VOLTAGE_MAX_V,
    AMBIENT_TEMP_MIN_C, AMBIENT_TEMP_MAX_C,
    VOLTAGE_SYNC_BAND_V, REFERENCE_VOLTAGE_OFFSET_V,
};

pub use limits::{
    LEAK_SOFT_THRESHOLD_MA, LEAK_STRONG_THRESHOLD_MA,
    ROOM_TEMP_MIN_C, ROOM_TEMP_MAX_C, ROOM_HUMIDITY_MIN_PCT, ROOM_HUMIDITY_MAX_PCT,
};

pub use time::{
    MS_PER_SECOND, LINE_WARMUP_MS, LOAD_WARMUP_MS,
    PERSIST_INTERVAL_MS, ALERT_REPEAT_INTERVAL_MS,
};
