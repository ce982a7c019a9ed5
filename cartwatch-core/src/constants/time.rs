//! Time-Related Constants
//!
//! All intervals are in milliseconds of the monotonic tick counter.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: u64 = 3600;

// ===== WARM-UP =====

/// Time a socket must stay valid before line readings are trusted (ms).
///
/// Voltage and frequency settle within a couple of meter refreshes after
/// the strip is energised.
pub const LINE_WARMUP_MS: u64 = 3000;

/// Time current must stay above idle before the device counts as running (ms).
///
/// Covers inrush and power-supply soft start.
pub const LOAD_WARMUP_MS: u64 = 3000;

// ===== PERSISTENCE =====

/// Minimum interval between periodic operating-time writes while running (ms).
///
/// Bounds data loss on abrupt power-off to one minute while keeping flash
/// wear far below its endurance over the cart's lifetime.
pub const PERSIST_INTERVAL_MS: u64 = 60_000;

/// Largest operating time accepted from the durable store (ms).
///
/// Ten years of continuous operation. Anything above is corruption.
pub const OPERATING_TIME_CEILING_MS: u64 = 10 * 365 * 24 * 3600 * MS_PER_SECOND;

/// Value an erased flash cell reads back as.
pub const ERASED_SENTINEL: u64 = u64::MAX;

// ===== ALERTING =====

/// Quiet interval between repeated audible alerts for a persisting warning (ms).
pub const ALERT_REPEAT_INTERVAL_MS: u64 = 15 * 60 * MS_PER_SECOND;

// ===== DIAGNOSTICS =====

/// Consecutive failed reads after which the driver-level warning is logged.
pub const READ_FAIL_NOTICE_COUNT: u32 = 5;

/// Consecutive failed reads after which the socket is reported as suspect.
pub const READ_FAIL_WARN_COUNT: u32 = 40;
