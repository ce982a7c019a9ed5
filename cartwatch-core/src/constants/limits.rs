//! Alarm Thresholds
//!
//! Device limits come from each device's service manual (rated current and
//! power with a 5% margin). Room limits follow the operating-theatre
//! guideline used by the hospital; the "common device" band is the
//! intersection of all device envelopes on the cart.

// ===== LEAKAGE CURRENT =====

/// Leakage current that starts the soft warning (mA).
pub const LEAK_SOFT_THRESHOLD_MA: f32 = 3.0;

/// Leakage current that starts the strong warning (mA).
///
/// Soft and strong are exclusive: soft covers `[3.0, 5.0)`.
pub const LEAK_STRONG_THRESHOLD_MA: f32 = 5.0;

// ===== ROOM =====

pub const ROOM_TEMP_MIN_C: f32 = 20.0;
pub const ROOM_TEMP_MAX_C: f32 = 25.0;
pub const ROOM_HUMIDITY_MIN_PCT: f32 = 40.0;
pub const ROOM_HUMIDITY_MAX_PCT: f32 = 60.0;

// ===== COMMON DEVICE BAND =====

pub const COMMON_DEVICE_TEMP_MIN_C: f32 = 15.0;
pub const COMMON_DEVICE_TEMP_MAX_C: f32 = 30.0;
pub const COMMON_DEVICE_HUMIDITY_MIN_PCT: f32 = 25.0;
pub const COMMON_DEVICE_HUMIDITY_MAX_PCT: f32 = 75.0;

// ===== SUPPLY =====

/// Acceptable supply voltage for every device on the cart (V).
pub const SUPPLY_VOLTAGE_MIN_V: f32 = 218.0;
pub const SUPPLY_VOLTAGE_MAX_V: f32 = 240.0;

/// Per-device electrical limits, indexed by [`Channel::index`](crate::Channel::index).
///
/// Columns: idle current (A), maximum current (A), maximum power (W).
/// A current above the idle threshold means the device is running.
pub const DEVICE_ELECTRICAL_LIMITS: [(f32, f32, f32); 6] = [
    (0.1, 0.65, 142.5),   // display
    (0.01, 0.534, 128.25), // imaging 1S
    (0.01, 0.38, 91.2),   // imaging 1 hub
    (0.01, 0.237, 57.0),  // tricam PAL
    (0.01, 1.78, 427.5),  // xenon 300
    (0.01, 1.52, 364.8),  // endoflator UI400
];

/// Per-device environment envelopes, indexed by [`Channel::index`](crate::Channel::index).
///
/// Columns: min °C, max °C, min %RH, max %RH.
pub const DEVICE_ENVIRONMENT_ENVELOPES: [(f32, f32, f32, f32); 6] = [
    (0.0, 40.0, 20.0, 80.0),
    (0.0, 40.0, 20.0, 85.0),
    (10.0, 40.0, 10.0, 100.0),
    (10.0, 40.0, 10.0, 100.0),
    (10.0, 40.0, 5.0, 95.0),
    (10.0, 35.0, 15.0, 85.0),
];
