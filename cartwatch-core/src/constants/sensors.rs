//! Sensor Specifications and Noise Model
//!
//! Ranges and delta-policy terms for the three sensor families on the cart:
//! the per-socket power meters, the ambient temperature/humidity probe and
//! the leakage-current clamp.
//!
//! The delta policy terms follow the manufacturer datasheets for accuracy
//! and resolution; the sigma values are measured bench noise.

// ===== POWER METER RANGE =====

/// Lowest voltage the power meter reports as a real reading (V).
///
/// Below this the meter is browning out and its registers are garbage.
pub const METER_VOLTAGE_MIN_V: f32 = 80.0;

/// Highest voltage the power meter can measure (V).
pub const METER_VOLTAGE_MAX_V: f32 = 260.0;

/// Current range of the meter (A).
pub const METER_CURRENT_MIN_A: f32 = 0.0;
pub const METER_CURRENT_MAX_A: f32 = 100.0;

/// Active power range of the meter (W).
pub const METER_POWER_MIN_W: f32 = 0.0;
pub const METER_POWER_MAX_W: f32 = 23_000.0;

/// Line frequency range of the meter (Hz).
pub const METER_FREQUENCY_MIN_HZ: f32 = 45.0;
pub const METER_FREQUENCY_MAX_HZ: f32 = 65.0;

/// Power factor range (dimensionless).
pub const METER_PF_MIN: f32 = 0.0;
pub const METER_PF_MAX: f32 = 1.0;

// ===== POWER METER DELTA POLICY =====

/// Safety factor applied to the meter noise budget.
pub const METER_SAFETY_FACTOR: f32 = 1.2;

/// Minimum number of resolution steps a change must span.
pub const METER_N_LSB: u8 = 1;

/// Relative accuracy of the meter (fraction of reading).
///
/// 0.5% for voltage, current, power and frequency; 1% for power factor.
pub const METER_ACCURACY_VOLTAGE: f32 = 0.005;
pub const METER_ACCURACY_CURRENT: f32 = 0.005;
pub const METER_ACCURACY_POWER: f32 = 0.005;
pub const METER_ACCURACY_FREQUENCY: f32 = 0.005;
pub const METER_ACCURACY_PF: f32 = 0.01;

/// Register resolution of the meter.
pub const METER_RESOLUTION_VOLTAGE: f32 = 0.1;
pub const METER_RESOLUTION_CURRENT: f32 = 0.001;
pub const METER_RESOLUTION_POWER: f32 = 0.1;
pub const METER_RESOLUTION_FREQUENCY: f32 = 0.1;
pub const METER_RESOLUTION_PF: f32 = 0.01;

/// Measured noise standard deviation on a stable load.
pub const METER_SIGMA_VOLTAGE: f32 = 0.1;
pub const METER_SIGMA_CURRENT: f32 = 0.01;
pub const METER_SIGMA_POWER: f32 = 0.1;
pub const METER_SIGMA_FREQUENCY: f32 = 0.1;
pub const METER_SIGMA_PF: f32 = 0.01;

/// Absolute floor of the change threshold.
pub const METER_DELTA_MIN_VOLTAGE: f32 = 0.2;
pub const METER_DELTA_MIN_CURRENT: f32 = 0.01;
pub const METER_DELTA_MIN_POWER: f32 = 0.2;
pub const METER_DELTA_MIN_FREQUENCY: f32 = 0.2;
pub const METER_DELTA_MIN_PF: f32 = 0.03;

// ===== VOLTAGE RECONCILIATION =====

/// Maximum distance from the reference voltage that is still treated as
/// the same supply line (V).
///
/// All sockets hang off one power strip, so independent meters should agree
/// within their combined accuracy. Beyond this band the socket is wired to
/// something else or the meter drifted.
pub const VOLTAGE_SYNC_BAND_V: f32 = 5.0;

/// Manual calibration offset added to the reference meter (V).
pub const REFERENCE_VOLTAGE_OFFSET_V: f32 = 0.0;

// ===== AMBIENT PROBE =====

/// Measurable temperature range of the probe (°C).
pub const AMBIENT_TEMP_MIN_C: f32 = -20.0;
pub const AMBIENT_TEMP_MAX_C: f32 = 80.0;

/// Measurable humidity range of the probe (%RH).
pub const AMBIENT_HUMIDITY_MIN_PCT: f32 = 0.0;
pub const AMBIENT_HUMIDITY_MAX_PCT: f32 = 100.0;

/// Safety factor for the ambient noise budget.
///
/// Higher than the meter's: the probe sits near equipment exhausts and
/// sees convective jitter.
pub const AMBIENT_SAFETY_FACTOR: f32 = 1.7;

/// Minimum number of resolution steps for ambient changes.
pub const AMBIENT_N_LSB: u8 = 3;

pub const AMBIENT_ACCURACY_TEMP: f32 = 0.005;
pub const AMBIENT_ACCURACY_HUMIDITY: f32 = 0.01;
pub const AMBIENT_RESOLUTION_TEMP: f32 = 0.1;
pub const AMBIENT_RESOLUTION_HUMIDITY: f32 = 0.1;
pub const AMBIENT_SIGMA_TEMP: f32 = 0.05;
pub const AMBIENT_SIGMA_HUMIDITY: f32 = 0.2;

/// Absolute floor of the ambient change thresholds (°C, %RH).
pub const AMBIENT_DELTA_MIN_TEMP: f32 = 0.2;
pub const AMBIENT_DELTA_MIN_HUMIDITY: f32 = 1.0;

// ===== LEAKAGE CLAMP =====

/// Smallest leakage-current change worth publishing (mA).
///
/// The clamp has no usable accuracy model at these levels, so the policy
/// reduces to this fixed floor.
pub const LEAK_DELTA_MIN_MA: f32 = 0.02;

/// Upper bound of the clamp's measuring range (mA).
pub const LEAK_CURRENT_MAX_MA: f32 = 1000.0;

// ===== FILTERING =====

/// Depth of the per-field median window.
pub const MEDIAN_WINDOW: usize = 5;
