//! Ambient Temperature and Humidity
//!
//! One probe on the cart feeds three sets of alarms: the room guideline,
//! the band every device tolerates and each device's own envelope. All of
//! them are evaluated against the *published* reading, so an alarm can
//! only change on a cycle where the reading itself was reported or on the
//! first report.
//!
//! A humidity of exactly zero is how the probe reports "no reading"; it
//! never raises an under-humidity alarm.

use crate::{
    channel::Channel,
    config::{EngineConfig, EnvironmentBounds},
    filter::AmbientFilters,
    report::{BoundFlags, CartFlags, PublishPhase},
};

/// One ambient probe reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AmbientSample {
    /// °C
    pub temperature: f32,
    /// %RH
    pub humidity: f32,
    pub valid: bool,
}

impl AmbientSample {
    pub fn reading(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            valid: false,
        }
    }
}

/// Over/under alarms against one [`EnvironmentBounds`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundAlarms {
    pub over_temperature: bool,
    pub under_temperature: bool,
    pub over_humidity: bool,
    pub under_humidity: bool,
}

impl BoundAlarms {
    pub fn evaluate(bounds: &EnvironmentBounds, temperature: f32, humidity: f32) -> Self {
        Self {
            over_temperature: bounds.temperature.above(temperature),
            under_temperature: bounds.temperature.below(temperature),
            over_humidity: bounds.humidity.above(humidity),
            under_humidity: humidity != 0.0 && bounds.humidity.below(humidity),
        }
    }

    pub fn any(&self) -> bool {
        self.over_temperature || self.under_temperature || self.over_humidity || self.under_humidity
    }
}

/// Cart-level ambient state
#[derive(Debug, Clone, Default)]
pub struct EnvironmentCartState {
    phase: PublishPhase,
    filters: AmbientFilters,
    temperature: f32,
    humidity: f32,
    room: BoundAlarms,
    common: BoundAlarms,
    read_failures: u32,
}

impl EnvironmentCartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process this cycle's probe reading.
    ///
    /// Returns `false` when the sample was unusable; the published state is
    /// left untouched in that case.
    pub fn observe(&mut self, sample: &AmbientSample, config: &EngineConfig, flags: &mut CartFlags) -> bool {
        if !sample.valid {
            self.read_failures = self.read_failures.saturating_add(1);
            return false;
        }
        if let Err(_e) = config.validator.ambient(sample.temperature, sample.humidity) {
            log_debug!("Ambient sample rejected: {}", _e);
            self.read_failures = self.read_failures.saturating_add(1);
            return false;
        }
        self.read_failures = 0;

        let (temperature, humidity) = self.filters.push(sample.temperature, sample.humidity);
        let policies = &config.policies;

        match self.phase {
            PublishPhase::Fresh => {
                self.temperature = temperature;
                self.humidity = humidity;
                self.room = BoundAlarms::evaluate(&config.room, temperature, humidity);
                self.common = BoundAlarms::evaluate(&config.common, temperature, humidity);
                *flags = CartFlags::ALL;
                self.phase = PublishPhase::Established;
            }
            PublishPhase::Established => {
                if policies.temperature.exceeded(temperature, self.temperature) {
                    self.temperature = temperature;
                    flags.temperature = true;
                }
                if policies.humidity.exceeded(humidity, self.humidity) {
                    self.humidity = humidity;
                    flags.humidity = true;
                }

                let room = BoundAlarms::evaluate(&config.room, self.temperature, self.humidity);
                let common = BoundAlarms::evaluate(&config.common, self.temperature, self.humidity);
                flags.room = BoundFlags::edges(&self.room, &room);
                flags.common = BoundFlags::edges(&self.common, &common);
                self.room = room;
                self.common = common;
            }
        }
        true
    }

    pub fn phase(&self) -> PublishPhase {
        self.phase
    }

    /// Published temperature (°C)
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Published humidity (%RH)
    pub fn humidity(&self) -> f32 {
        self.humidity
    }

    pub fn room(&self) -> &BoundAlarms {
        &self.room
    }

    pub fn common(&self) -> &BoundAlarms {
        &self.common
    }

    pub fn has_alarm(&self) -> bool {
        self.room.any() || self.common.any()
    }

    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }
}

/// Shared ambient reading against one device's envelope
#[derive(Debug, Clone)]
pub struct EnvironmentDeviceState {
    channel: Channel,
    phase: PublishPhase,
    alarms: BoundAlarms,
}

impl EnvironmentDeviceState {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            phase: PublishPhase::Fresh,
            alarms: BoundAlarms::default(),
        }
    }

    /// Re-evaluate against the published cart reading
    pub fn evaluate(&mut self, envelope: &EnvironmentBounds, temperature: f32, humidity: f32) -> BoundFlags {
        let next = BoundAlarms::evaluate(envelope, temperature, humidity);
        let flags = match self.phase {
            PublishPhase::Fresh => BoundFlags::ALL,
            PublishPhase::Established => BoundFlags::edges(&self.alarms, &next),
        };
        self.alarms = next;
        self.phase = PublishPhase::Established;
        flags
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn alarms(&self) -> &BoundAlarms {
        &self.alarms
    }
}
