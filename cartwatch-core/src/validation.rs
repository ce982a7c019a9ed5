//! Raw Sample Validation
//!
//! The acquisition layer hands over whatever the meter registers contained.
//! Before a sample reaches the filters it must be a finite number inside
//! what the instrument can physically report; a meter that lost its supply
//! mid-frame typically answers with zeros or a saturated register.
//!
//! A rejected sample is not an error for the cycle. The engine treats the
//! channel as offline (socket not present) and moves on.

use crate::{
    channel::ElectricalValues,
    constants::sensors::*,
    errors::SampleError,
};

/// Check if a value is within the specified range
pub fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), SampleError> {
    if !value.is_valid() {
        return Err(SampleError::InvalidValue { field });
    }
    if value < min || value > max {
        return Err(SampleError::OutOfRange { field, value, min, max });
    }
    Ok(())
}

/// Trait for values that can be validated
pub trait Validatable {
    /// Check if the value is a usable number (not NaN or infinite)
    fn is_valid(&self) -> bool;
}

impl Validatable for f32 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

/// Inclusive `[min, max]` range of a single field
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldRange {
    pub min: f32,
    pub max: f32,
}

impl FieldRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn check(&self, field: &'static str, value: f32) -> Result<(), SampleError> {
        check_range(field, value, self.min, self.max)
    }
}

/// Measuring ranges of the sensors, used to reject impossible samples
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleValidator {
    pub voltage: FieldRange,
    pub current: FieldRange,
    pub power: FieldRange,
    pub frequency: FieldRange,
    pub power_factor: FieldRange,
    pub temperature: FieldRange,
    pub humidity: FieldRange,
    pub leak_current: FieldRange,
}

impl Default for SampleValidator {
    fn default() -> Self {
        Self {
            voltage: FieldRange::new(METER_VOLTAGE_MIN_V, METER_VOLTAGE_MAX_V),
            current: FieldRange::new(METER_CURRENT_MIN_A, METER_CURRENT_MAX_A),
            power: FieldRange::new(METER_POWER_MIN_W, METER_POWER_MAX_W),
            frequency: FieldRange::new(METER_FREQUENCY_MIN_HZ, METER_FREQUENCY_MAX_HZ),
            power_factor: FieldRange::new(METER_PF_MIN, METER_PF_MAX),
            temperature: FieldRange::new(AMBIENT_TEMP_MIN_C, AMBIENT_TEMP_MAX_C),
            humidity: FieldRange::new(AMBIENT_HUMIDITY_MIN_PCT, AMBIENT_HUMIDITY_MAX_PCT),
            leak_current: FieldRange::new(0.0, LEAK_CURRENT_MAX_MA),
        }
    }
}

impl SampleValidator {
    /// Validate a power-meter sample, first failing field wins
    pub fn electrical(&self, values: &ElectricalValues) -> Result<(), SampleError> {
        self.voltage.check("voltage", values.voltage)?;
        self.current.check("current", values.current)?;
        self.power.check("power", values.power)?;
        self.frequency.check("frequency", values.frequency)?;
        self.power_factor.check("power_factor", values.power_factor)
    }

    /// Validate an ambient probe sample
    pub fn ambient(&self, temperature: f32, humidity: f32) -> Result<(), SampleError> {
        self.temperature.check("temperature", temperature)?;
        self.humidity.check("humidity", humidity)
    }

    /// Validate a leakage-current sample
    pub fn leak(&self, current_ma: f32) -> Result<(), SampleError> {
        self.leak_current.check("leak_current", current_ma)
    }
}
