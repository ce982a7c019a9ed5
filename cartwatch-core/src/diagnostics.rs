//! Human-readable state dump for the serial console and logs

use core::fmt;

use crate::{
    channel::{Channel, ChannelState},
    config::EngineConfig,
    delta::DeltaPolicy,
    environment::{BoundAlarms, EnvironmentCartState, EnvironmentDeviceState},
    leak::LeakSensorState,
    operating_time::format_hms,
    time::Timestamp,
};

/// Borrowed view of the engine state implementing [`fmt::Display`]
pub struct SnapshotView<'a> {
    channels: &'a [ChannelState; Channel::COUNT],
    leak: &'a LeakSensorState,
    cart: &'a EnvironmentCartState,
    devices: &'a [EnvironmentDeviceState; Channel::COUNT],
    config: &'a EngineConfig,
    now: Timestamp,
}

impl<'a> SnapshotView<'a> {
    pub fn new(
        channels: &'a [ChannelState; Channel::COUNT],
        leak: &'a LeakSensorState,
        cart: &'a EnvironmentCartState,
        devices: &'a [EnvironmentDeviceState; Channel::COUNT],
        config: &'a EngineConfig,
        now: Timestamp,
    ) -> Self {
        Self {
            channels,
            leak,
            cart,
            devices,
            config,
            now,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.now
    }
}

struct Bounds<'a>(&'a BoundAlarms);

impl fmt::Display for Bounds<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        write!(
            f,
            "T+{} T-{} H+{} H-{}",
            a.over_temperature as u8, a.under_temperature as u8, a.over_humidity as u8, a.under_humidity as u8
        )
    }
}

fn field(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    reported: f32,
    measured: f32,
    policy: &DeltaPolicy,
) -> fmt::Result {
    writeln!(
        f,
        "    {:<4} last {:>8.3}  raw {:>8.3}  delta {:.3}",
        name,
        reported,
        measured,
        policy.threshold(measured)
    )
}

impl fmt::Display for SnapshotView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policies = &self.config.policies;

        writeln!(f, "==== snapshot @ {} ms ====", self.now)?;
        writeln!(
            f,
            "leak: {:.3} mA  soft {}  strong {}  (delta {:.3})",
            self.leak.current_ma(),
            self.leak.soft_warning() as u8,
            self.leak.strong_warning() as u8,
            policies.leak_current.threshold(self.leak.current_ma())
        )?;
        writeln!(
            f,
            "ambient: {:.1} C (delta {:.2})  {:.1} %RH (delta {:.2})",
            self.cart.temperature(),
            policies.temperature.threshold(self.cart.temperature()),
            self.cart.humidity(),
            policies.humidity.threshold(self.cart.humidity())
        )?;
        writeln!(f, "  room   {}", Bounds(self.cart.room()))?;
        writeln!(f, "  common {}", Bounds(self.cart.common()))?;

        if self.channels.iter().all(|c| !c.socket_present()) {
            return writeln!(f, "all sockets are power lost");
        }

        for (state, device) in self.channels.iter().zip(self.devices.iter()) {
            let channel = state.channel();
            if !state.socket_present() {
                writeln!(f, "{}: power lost ({} failed reads)", channel, state.read_failures())?;
                continue;
            }

            let last = state.published();
            let raw = state.measured();
            let alarms = state.alarms();
            writeln!(
                f,
                "{}: running {}  operating {}",
                channel,
                state.machine_running() as u8,
                format_hms(state.operating_time_ms(self.now))
            )?;
            field(f, "V", last.voltage, raw.voltage, &policies.voltage)?;
            field(f, "I", last.current, raw.current, &policies.current)?;
            field(f, "P", last.power, raw.power, &policies.power)?;
            field(f, "F", last.frequency, raw.frequency, &policies.frequency)?;
            field(f, "PF", last.power_factor, raw.power_factor, &policies.power_factor)?;
            writeln!(
                f,
                "    alarms OV {} UV {} OC {} OP {}  env {}",
                alarms.over_voltage as u8,
                alarms.under_voltage as u8,
                alarms.over_current as u8,
                alarms.over_power as u8,
                Bounds(device.alarms())
            )?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use crate::{
        AmbientSample, Channel, CycleInput, ElectricalSample, Engine, EngineConfig, LeakSample, MemoryStore,
    };

    #[test]
    fn unpowered_cart() {
        let mut engine = Engine::new(EngineConfig::default(), MemoryStore::new(), 0).unwrap();
        engine.run_cycle(&CycleInput::unpowered(), 0);
        let text = engine.snapshot().to_string();
        assert!(text.contains("all sockets are power lost"));
    }

    #[test]
    fn lists_online_sockets() {
        let mut engine = Engine::new(EngineConfig::default(), MemoryStore::new(), 0).unwrap();
        let input = CycleInput::unpowered()
            .with_channel(Channel::Xenon300, ElectricalSample::reading(229.0, 1.0, 220.0, 50.0, 0.96))
            .with_ambient(AmbientSample::reading(22.0, 48.0))
            .with_leak(LeakSample::reading(0.4));
        engine.run_cycle(&input, 125_000);

        let text = engine.snapshot().to_string();
        assert!(text.contains("xenon_300: running 1  operating 00:00:00"));
        assert!(text.contains("display: power lost"));
        assert!(text.contains("leak: 0.400 mA"));
    }
}
