//! Per-cycle output handed to the transport layer
//!
//! Every entity reports the value an observer should currently hold plus a
//! flag per field saying "publish this now". Flags are recomputed every
//! cycle and never persisted.

use crate::{
    channel::{Channel, ElectricalValues, PowerAlarms},
    environment::BoundAlarms,
    traits::AlertSink,
};

/// Whether an entity has already sent its full snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PublishPhase {
    /// Nothing published yet: the next report carries every field
    #[default]
    Fresh,
    /// Only changes are reported
    Established,
}

/// Change flags of one power channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelFlags {
    pub voltage: bool,
    pub current: bool,
    pub power: bool,
    pub frequency: bool,
    pub power_factor: bool,
    pub machine_running: bool,
    pub socket_present: bool,
    pub over_voltage: bool,
    pub under_voltage: bool,
    pub over_current: bool,
    pub over_power: bool,
    pub operating_time: bool,
}

impl ChannelFlags {
    pub const ALL: ChannelFlags = ChannelFlags {
        voltage: true,
        current: true,
        power: true,
        frequency: true,
        power_factor: true,
        machine_running: true,
        socket_present: true,
        over_voltage: true,
        under_voltage: true,
        over_current: true,
        over_power: true,
        operating_time: true,
    };

    pub fn set_all(&mut self) {
        *self = Self::ALL;
    }

    pub fn all(&self) -> bool {
        *self == Self::ALL
    }

    pub fn any(&self) -> bool {
        *self != Self::default()
    }

    /// Any of the five measured quantities changed
    pub fn any_electrical(&self) -> bool {
        self.voltage || self.current || self.power || self.frequency || self.power_factor
    }
}

/// State of one power channel after a cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelReport {
    pub channel: Channel,
    /// Authoritative values (what an observer holds)
    pub values: ElectricalValues,
    /// Filtered reading of this cycle
    pub measured: ElectricalValues,
    pub machine_running: bool,
    pub socket_present: bool,
    pub alarms: PowerAlarms,
    pub operating_time_ms: u64,
    pub flags: ChannelFlags,
}

/// Change flags of the leakage sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeakFlags {
    pub current: bool,
    pub soft_warning: bool,
    pub strong_warning: bool,
}

impl LeakFlags {
    pub const ALL: LeakFlags = LeakFlags {
        current: true,
        soft_warning: true,
        strong_warning: true,
    };

    pub fn any(&self) -> bool {
        self.current || self.soft_warning || self.strong_warning
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeakReport {
    /// Published leakage current (mA)
    pub current_ma: f32,
    pub soft_warning: bool,
    pub strong_warning: bool,
    pub flags: LeakFlags,
}

/// Edge flags of a [`BoundAlarms`] set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundFlags {
    pub over_temperature: bool,
    pub under_temperature: bool,
    pub over_humidity: bool,
    pub under_humidity: bool,
}

impl BoundFlags {
    pub const ALL: BoundFlags = BoundFlags {
        over_temperature: true,
        under_temperature: true,
        over_humidity: true,
        under_humidity: true,
    };

    pub fn edges(prev: &BoundAlarms, next: &BoundAlarms) -> Self {
        Self {
            over_temperature: prev.over_temperature != next.over_temperature,
            under_temperature: prev.under_temperature != next.under_temperature,
            over_humidity: prev.over_humidity != next.over_humidity,
            under_humidity: prev.under_humidity != next.under_humidity,
        }
    }

    pub fn any(&self) -> bool {
        self.over_temperature || self.under_temperature || self.over_humidity || self.under_humidity
    }
}

/// Change flags of the cart-level environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartFlags {
    pub temperature: bool,
    pub humidity: bool,
    pub room: BoundFlags,
    pub common: BoundFlags,
}

impl CartFlags {
    pub const ALL: CartFlags = CartFlags {
        temperature: true,
        humidity: true,
        room: BoundFlags::ALL,
        common: BoundFlags::ALL,
    };

    pub fn any(&self) -> bool {
        self.temperature || self.humidity || self.room.any() || self.common.any()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartReport {
    /// Published temperature (°C)
    pub temperature: f32,
    /// Published relative humidity (%)
    pub humidity: f32,
    /// Against the room guideline
    pub room: BoundAlarms,
    /// Against the band every device tolerates
    pub common: BoundAlarms,
    pub flags: CartFlags,
}

/// Shared ambient reading against one device's envelope
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceEnvironmentReport {
    pub channel: Channel,
    pub alarms: BoundAlarms,
    pub flags: BoundFlags,
}

/// Everything one cycle produced
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleReport {
    /// First cycle after start: every entity carries its full snapshot
    pub boot: bool,
    /// Cycle timestamp (ms)
    pub timestamp: u64,
    pub channels: [ChannelReport; Channel::COUNT],
    pub leak: LeakReport,
    pub cart: CartReport,
    pub devices: [DeviceEnvironmentReport; Channel::COUNT],
    /// Every socket is offline (cart unpowered)
    pub all_offline: bool,
    /// System-wide warning
    pub warning: bool,
    /// Number of conditions that raised the warning
    pub warning_sources: u8,
    /// Sound the alert now
    pub sound_alert: bool,
}

impl CycleReport {
    pub fn channel(&self, channel: Channel) -> &ChannelReport {
        &self.channels[channel.index()]
    }

    pub fn device(&self, channel: Channel) -> &DeviceEnvironmentReport {
        &self.devices[channel.index()]
    }

    /// Anything at all to publish this cycle
    pub fn has_changes(&self) -> bool {
        self.channels.iter().any(|c| c.flags.any())
            || self.leak.flags.any()
            || self.cart.flags.any()
            || self.devices.iter().any(|d| d.flags.any())
    }

    /// Drive the alert output if this cycle asks for it
    pub fn dispatch_alert<A: AlertSink + ?Sized>(&self, sink: &mut A) -> bool {
        if self.sound_alert {
            sink.sound_warning();
        }
        self.sound_alert
    }
}
