//! Adaptive Change Thresholds
//!
//! ## Overview
//!
//! A field is republished only when it moves further than its noise budget
//! allows. A fixed epsilon does not work across the cart: 0.2 V is noise on a
//! 230 V line, but 0.2 A is the whole operating range of the tricam. The
//! threshold therefore scales with the reading and the sensor's declared
//! accuracy:
//!
//! ```text
//! δ = max( F_u · (|x|·accuracy + σ + N_lsb·resolution), δ_min )
//! ```
//!
//! - `accuracy` is relative (0.005 = 0.5% of reading)
//! - `σ` is the measured noise standard deviation
//! - `N_lsb·resolution` keeps at least `N_lsb` register steps
//! - `F_u` is a safety factor over the whole budget
//! - `δ_min` is an absolute floor
//!
//! The function is pure and non-decreasing in `|x|`.

use libm::fabsf;

use crate::constants::sensors::*;

/// Minimum-change threshold for a single value.
///
/// Never returns less than `delta_min`.
pub fn threshold(
    value: f32,
    accuracy: f32,
    resolution: f32,
    sigma: f32,
    safety_factor: f32,
    n_lsb: u8,
    delta_min: f32,
) -> f32 {
    let delta = safety_factor * (fabsf(value) * accuracy + sigma + n_lsb as f32 * resolution);
    if delta > delta_min { delta } else { delta_min }
}

/// Field-specific constants for [`threshold`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeltaPolicy {
    /// Relative accuracy (fraction of reading)
    pub accuracy: f32,
    /// Register resolution
    pub resolution: f32,
    /// Noise standard deviation
    pub sigma: f32,
    /// Safety factor
    pub safety_factor: f32,
    /// Minimum number of resolution steps
    pub n_lsb: u8,
    /// Absolute floor
    pub delta_min: f32,
}

impl DeltaPolicy {
    /// Policy that always yields `delta_min`
    pub const fn fixed(delta_min: f32) -> Self {
        Self {
            accuracy: 0.0,
            resolution: 0.0,
            sigma: 0.0,
            safety_factor: 1.0,
            n_lsb: 0,
            delta_min,
        }
    }

    /// Threshold for a reading of `value`
    #[inline]
    pub fn threshold(&self, value: f32) -> f32 {
        threshold(
            value,
            self.accuracy,
            self.resolution,
            self.sigma,
            self.safety_factor,
            self.n_lsb,
            self.delta_min,
        )
    }

    /// Whether `current` moved far enough from `published` to be reported.
    ///
    /// The threshold is taken at the new value.
    #[inline]
    pub fn exceeded(&self, current: f32, published: f32) -> bool {
        fabsf(current - published) > self.threshold(current)
    }

    pub const fn meter_voltage() -> Self {
        Self::meter(METER_ACCURACY_VOLTAGE, METER_RESOLUTION_VOLTAGE, METER_SIGMA_VOLTAGE, METER_DELTA_MIN_VOLTAGE)
    }

    pub const fn meter_current() -> Self {
        Self::meter(METER_ACCURACY_CURRENT, METER_RESOLUTION_CURRENT, METER_SIGMA_CURRENT, METER_DELTA_MIN_CURRENT)
    }

    pub const fn meter_power() -> Self {
        Self::meter(METER_ACCURACY_POWER, METER_RESOLUTION_POWER, METER_SIGMA_POWER, METER_DELTA_MIN_POWER)
    }

    pub const fn meter_frequency() -> Self {
        Self::meter(METER_ACCURACY_FREQUENCY, METER_RESOLUTION_FREQUENCY, METER_SIGMA_FREQUENCY, METER_DELTA_MIN_FREQUENCY)
    }

    pub const fn meter_power_factor() -> Self {
        Self::meter(METER_ACCURACY_PF, METER_RESOLUTION_PF, METER_SIGMA_PF, METER_DELTA_MIN_PF)
    }

    pub const fn ambient_temperature() -> Self {
        Self::ambient(AMBIENT_ACCURACY_TEMP, AMBIENT_RESOLUTION_TEMP, AMBIENT_SIGMA_TEMP, AMBIENT_DELTA_MIN_TEMP)
    }

    pub const fn ambient_humidity() -> Self {
        Self::ambient(AMBIENT_ACCURACY_HUMIDITY, AMBIENT_RESOLUTION_HUMIDITY, AMBIENT_SIGMA_HUMIDITY, AMBIENT_DELTA_MIN_HUMIDITY)
    }

    pub const fn leak_current() -> Self {
        Self::fixed(LEAK_DELTA_MIN_MA)
    }

    const fn meter(accuracy: f32, resolution: f32, sigma: f32, delta_min: f32) -> Self {
        Self {
            accuracy,
            resolution,
            sigma,
            safety_factor: METER_SAFETY_FACTOR,
            n_lsb: METER_N_LSB,
            delta_min,
        }
    }

    const fn ambient(accuracy: f32, resolution: f32, sigma: f32, delta_min: f32) -> Self {
        Self {
            accuracy,
            resolution,
            sigma,
            safety_factor: AMBIENT_SAFETY_FACTOR,
            n_lsb: AMBIENT_N_LSB,
            delta_min,
        }
    }
}
