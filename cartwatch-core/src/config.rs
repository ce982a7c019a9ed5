//! Engine Configuration
//!
//! Every tunable of the engine in one place. The defaults are the cart's
//! factory values from [`constants`](crate::constants); a host may load a
//! different table (e.g. from JSON with the `serde` feature) and must pass
//! it through [`EngineConfig::validate`] before use, which
//! [`Engine::new`](crate::Engine::new) does.

use crate::{
    channel::Channel,
    constants::{limits::*, sensors::*, time::*},
    delta::DeltaPolicy,
    errors::ConfigError,
    validation::SampleValidator,
};

/// Inclusive band; outside it an alarm is raised
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn above(&self, value: f32) -> bool {
        value > self.max
    }

    #[inline]
    pub fn below(&self, value: f32) -> bool {
        value < self.min
    }

    fn check(&self, what: &'static str) -> Result<(), ConfigError> {
        if self.min < self.max {
            Ok(())
        } else {
            Err(ConfigError::InvertedBounds { what })
        }
    }
}

/// Electrical alarm limits of one device
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceLimits {
    /// Acceptable supply voltage (V)
    pub voltage: Bounds,
    /// Current above which the device is running (A)
    pub idle_current: f32,
    /// Over-current limit (A)
    pub max_current: f32,
    /// Over-power limit (W)
    pub max_power: f32,
}

impl DeviceLimits {
    /// Factory limits of `channel`
    pub fn factory(channel: Channel) -> Self {
        let (idle_current, max_current, max_power) = DEVICE_ELECTRICAL_LIMITS[channel.index()];
        Self {
            voltage: Bounds::new(SUPPLY_VOLTAGE_MIN_V, SUPPLY_VOLTAGE_MAX_V),
            idle_current,
            max_current,
            max_power,
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        self.voltage.check("device supply voltage")?;
        if self.idle_current <= 0.0 {
            return Err(ConfigError::NonPositive { what: "idle current" });
        }
        if self.idle_current >= self.max_current {
            return Err(ConfigError::InvertedBounds { what: "idle/max current" });
        }
        if self.max_power <= 0.0 {
            return Err(ConfigError::NonPositive { what: "max power" });
        }
        Ok(())
    }
}

/// Temperature and humidity band
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvironmentBounds {
    /// °C
    pub temperature: Bounds,
    /// %RH
    pub humidity: Bounds,
}

/// Operating envelope of one device
pub type EnvironmentEnvelope = EnvironmentBounds;

impl EnvironmentBounds {
    pub const fn new(temp_min: f32, temp_max: f32, humidity_min: f32, humidity_max: f32) -> Self {
        Self {
            temperature: Bounds::new(temp_min, temp_max),
            humidity: Bounds::new(humidity_min, humidity_max),
        }
    }

    /// Room guideline for the operating theatre
    pub const fn room() -> Self {
        Self::new(ROOM_TEMP_MIN_C, ROOM_TEMP_MAX_C, ROOM_HUMIDITY_MIN_PCT, ROOM_HUMIDITY_MAX_PCT)
    }

    /// Band every device on the cart tolerates
    pub const fn common_device() -> Self {
        Self::new(
            COMMON_DEVICE_TEMP_MIN_C,
            COMMON_DEVICE_TEMP_MAX_C,
            COMMON_DEVICE_HUMIDITY_MIN_PCT,
            COMMON_DEVICE_HUMIDITY_MAX_PCT,
        )
    }

    /// Factory envelope of `channel`
    pub fn device(channel: Channel) -> Self {
        let (t_min, t_max, h_min, h_max) = DEVICE_ENVIRONMENT_ENVELOPES[channel.index()];
        Self::new(t_min, t_max, h_min, h_max)
    }

    fn check(&self, what: &'static str) -> Result<(), ConfigError> {
        self.temperature.check(what)?;
        self.humidity.check(what)
    }
}

/// Leakage-current warning levels (mA)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeakThresholds {
    pub soft_ma: f32,
    pub strong_ma: f32,
}

impl Default for LeakThresholds {
    fn default() -> Self {
        Self {
            soft_ma: LEAK_SOFT_THRESHOLD_MA,
            strong_ma: LEAK_STRONG_THRESHOLD_MA,
        }
    }
}

/// Delta policy of every reported scalar
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldPolicies {
    pub voltage: DeltaPolicy,
    pub current: DeltaPolicy,
    pub power: DeltaPolicy,
    pub frequency: DeltaPolicy,
    pub power_factor: DeltaPolicy,
    pub temperature: DeltaPolicy,
    pub humidity: DeltaPolicy,
    pub leak_current: DeltaPolicy,
}

impl Default for FieldPolicies {
    fn default() -> Self {
        Self {
            voltage: DeltaPolicy::meter_voltage(),
            current: DeltaPolicy::meter_current(),
            power: DeltaPolicy::meter_power(),
            frequency: DeltaPolicy::meter_frequency(),
            power_factor: DeltaPolicy::meter_power_factor(),
            temperature: DeltaPolicy::ambient_temperature(),
            humidity: DeltaPolicy::ambient_humidity(),
            leak_current: DeltaPolicy::leak_current(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Channel whose voltage the others reconcile against
    pub reference: Channel,
    /// Calibration offset added to the reference voltage (V)
    pub reference_offset_v: f32,
    /// Max distance from the reference to report the reference's value (V)
    pub sync_band_v: f32,
    pub line_warmup_ms: u64,
    pub load_warmup_ms: u64,
    pub persist_interval_ms: u64,
    pub alert_repeat_ms: u64,
    pub devices: [DeviceLimits; Channel::COUNT],
    pub envelopes: [EnvironmentEnvelope; Channel::COUNT],
    pub room: EnvironmentBounds,
    pub common: EnvironmentBounds,
    pub leak: LeakThresholds,
    pub policies: FieldPolicies,
    pub validator: SampleValidator,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference: Channel::Display,
            reference_offset_v: REFERENCE_VOLTAGE_OFFSET_V,
            sync_band_v: VOLTAGE_SYNC_BAND_V,
            line_warmup_ms: LINE_WARMUP_MS,
            load_warmup_ms: LOAD_WARMUP_MS,
            persist_interval_ms: PERSIST_INTERVAL_MS,
            alert_repeat_ms: ALERT_REPEAT_INTERVAL_MS,
            devices: Channel::ALL.map(DeviceLimits::factory),
            envelopes: Channel::ALL.map(EnvironmentBounds::device),
            room: EnvironmentBounds::room(),
            common: EnvironmentBounds::common_device(),
            leak: LeakThresholds::default(),
            policies: FieldPolicies::default(),
            validator: SampleValidator::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_reference(mut self, reference: Channel, offset_v: f32) -> Self {
        self.reference = reference;
        self.reference_offset_v = offset_v;
        self
    }

    pub fn with_sync_band(mut self, band_v: f32) -> Self {
        self.sync_band_v = band_v;
        self
    }

    pub fn with_warmup(mut self, line_ms: u64, load_ms: u64) -> Self {
        self.line_warmup_ms = line_ms;
        self.load_warmup_ms = load_ms;
        self
    }

    pub fn with_persist_interval(mut self, interval_ms: u64) -> Self {
        self.persist_interval_ms = interval_ms;
        self
    }

    pub fn with_alert_repeat(mut self, interval_ms: u64) -> Self {
        self.alert_repeat_ms = interval_ms;
        self
    }

    pub fn with_device_limits(mut self, channel: Channel, limits: DeviceLimits) -> Self {
        self.devices[channel.index()] = limits;
        self
    }

    pub fn with_envelope(mut self, channel: Channel, envelope: EnvironmentEnvelope) -> Self {
        self.envelopes[channel.index()] = envelope;
        self
    }

    pub fn with_leak_thresholds(mut self, soft_ma: f32, strong_ma: f32) -> Self {
        self.leak = LeakThresholds { soft_ma, strong_ma };
        self
    }

    pub fn with_policies(mut self, policies: FieldPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn limits(&self, channel: Channel) -> &DeviceLimits {
        &self.devices[channel.index()]
    }

    pub fn envelope(&self, channel: Channel) -> &EnvironmentEnvelope {
        &self.envelopes[channel.index()]
    }

    /// Check that every band is ordered and every interval positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_band_v <= 0.0 {
            return Err(ConfigError::NonPositive { what: "sync band" });
        }
        if self.persist_interval_ms == 0 {
            return Err(ConfigError::NonPositive { what: "persist interval" });
        }
        if self.alert_repeat_ms == 0 {
            return Err(ConfigError::NonPositive { what: "alert repeat interval" });
        }
        if self.line_warmup_ms == 0 || self.load_warmup_ms == 0 {
            return Err(ConfigError::NonPositive { what: "warm-up time" });
        }
        // A load settling before its line would report a machine state
        // for a socket whose line is not yet trusted
        if self.load_warmup_ms < self.line_warmup_ms {
            return Err(ConfigError::InvertedBounds { what: "warm-up times" });
        }

        for limits in &self.devices {
            limits.check()?;
        }
        for envelope in &self.envelopes {
            envelope.check("device envelope")?;
        }
        self.room.check("room bounds")?;
        self.common.check("common device bounds")?;

        if self.leak.soft_ma <= 0.0 {
            return Err(ConfigError::NonPositive { what: "leak soft threshold" });
        }
        if self.leak.soft_ma >= self.leak.strong_ma {
            return Err(ConfigError::InvertedBounds { what: "leak thresholds" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.reference, Channel::Display);
        assert_eq!(config.limits(Channel::Xenon300).max_power, 427.5);
        assert_eq!(config.envelope(Channel::EndoflatorUi400).temperature.max, 35.0);
    }

    #[test]
    fn inverted_band_rejected() {
        let config = EngineConfig::default()
            .with_envelope(Channel::TricamPal, EnvironmentBounds::new(40.0, 10.0, 10.0, 100.0));
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedBounds { what: "device envelope" })
        );
    }

    #[test]
    fn zero_sync_band_rejected() {
        let config = EngineConfig::default().with_sync_band(0.0);
        assert_eq!(config.validate(), Err(ConfigError::NonPositive { what: "sync band" }));
    }

    #[test]
    fn load_warmup_not_shorter_than_line() {
        let config = EngineConfig::default().with_warmup(3000, 1000);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedBounds { what: "warm-up times" })
        );
        assert_eq!(EngineConfig::default().with_warmup(3000, 3000).validate(), Ok(()));
    }

    #[test]
    fn leak_levels_must_be_ordered() {
        let config = EngineConfig::default().with_leak_thresholds(5.0, 3.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn bounds_are_exclusive_of_limits() {
        let band = Bounds::new(218.0, 240.0);
        assert!(!band.above(240.0));
        assert!(band.above(240.1));
        assert!(!band.below(218.0));
        assert!(band.below(217.9));
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::default()
            .with_reference(Channel::Xenon300, 1.5)
            .with_warmup(1000, 2000)
            .with_persist_interval(30_000)
            .with_alert_repeat(60_000);
        assert_eq!(config.reference, Channel::Xenon300);
        assert_eq!(config.reference_offset_v, 1.5);
        assert_eq!((config.line_warmup_ms, config.load_warmup_ms), (1000, 2000));
        assert_eq!(config.validate(), Ok(()));
    }
}
