//! Change-Detection Engine
//!
//! The orchestrator that owns every piece of per-cart state and runs one
//! sampling cycle at a time:
//!
//! ```text
//! CycleInput ──► pass A: validate, filter, warm-up gate (per channel)
//!                   │
//!                   ▼
//!               VoltagePlan::resolve   (immutable, all channels at once)
//!                   │
//!                   ▼
//!               pass B: compare, alarms, operating time (per channel)
//!                   │
//!                   ▼
//!               leak ─► ambient ─► device envelopes ─► warning ─► CycleReport
//! ```
//!
//! Channels reconcile their voltage against the reference channel. Every
//! channel's gate is known before any voltage is resolved, so the outcome
//! does not depend on iteration order.
//!
//! # Example
//!
//! ```rust
//! use cartwatch_core::{Channel, CycleInput, ElectricalSample, Engine, EngineConfig, MemoryStore};
//!
//! let mut engine = Engine::new(EngineConfig::default(), MemoryStore::new(), 0).unwrap();
//! let input = CycleInput::unpowered()
//!     .with_channel(Channel::Display, ElectricalSample::reading(230.0, 0.3, 60.0, 50.0, 0.95));
//!
//! let report = engine.run_cycle(&input, 0);
//! assert!(report.boot);
//! assert!(report.channel(Channel::Display).socket_present);
//! ```

use libm::fabsf;

use crate::{
    alarm::{AlarmAggregator, AlertScheduler, WarningSource},
    channel::{Channel, ChannelState, ElectricalSample, VoltageIntent},
    config::EngineConfig,
    constants::time::{READ_FAIL_NOTICE_COUNT, READ_FAIL_WARN_COUNT},
    diagnostics::SnapshotView,
    environment::{AmbientSample, EnvironmentCartState, EnvironmentDeviceState},
    errors::ConfigError,
    leak::{LeakSample, LeakSensorState},
    report::{
        BoundFlags, CartFlags, CartReport, ChannelFlags, ChannelReport, CycleReport,
        DeviceEnvironmentReport, LeakFlags, LeakReport,
    },
    time::{TimeSource, Timestamp},
    traits::DurableStore,
    warmup::{Gate, WarmupSupervisor},
};

/// Raw readings of one sampling cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleInput {
    pub electrical: [ElectricalSample; Channel::COUNT],
    pub ambient: AmbientSample,
    pub leak: LeakSample,
}

impl CycleInput {
    pub fn new(electrical: [ElectricalSample; Channel::COUNT], ambient: AmbientSample, leak: LeakSample) -> Self {
        Self {
            electrical,
            ambient,
            leak,
        }
    }

    /// No meter answers, ambient and leak sensors silent
    pub fn unpowered() -> Self {
        Self::new(
            [ElectricalSample::invalid(); Channel::COUNT],
            AmbientSample::invalid(),
            LeakSample::invalid(),
        )
    }

    pub fn with_channel(mut self, channel: Channel, sample: ElectricalSample) -> Self {
        self.electrical[channel.index()] = sample;
        self
    }

    pub fn with_ambient(mut self, sample: AmbientSample) -> Self {
        self.ambient = sample;
        self
    }

    pub fn with_leak(mut self, sample: LeakSample) -> Self {
        self.leak = sample;
        self
    }

    pub fn sample(&self, channel: Channel) -> &ElectricalSample {
        &self.electrical[channel.index()]
    }
}

/// Voltage every channel reports this cycle.
///
/// Built from the pass-A results of all channels and not modified
/// afterwards; pass B only reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltagePlan {
    intents: [VoltageIntent; Channel::COUNT],
    broadcast: bool,
    reference_ready: bool,
}

impl VoltagePlan {
    pub fn new(intents: [VoltageIntent; Channel::COUNT], broadcast: bool, reference_ready: bool) -> Self {
        Self {
            intents,
            broadcast,
            reference_ready,
        }
    }

    pub fn resolve(
        channels: &[ChannelState; Channel::COUNT],
        gates: &[Gate; Channel::COUNT],
        config: &EngineConfig,
    ) -> Self {
        let reference = config.reference;
        let ref_gate = gates[reference.index()];
        let reference_ready = ref_gate.online && ref_gate.line_stable;
        let reference_voltage = reference_ready
            .then(|| channels[reference.index()].measured().voltage + config.reference_offset_v);

        let mut intents = [VoltageIntent::default(); Channel::COUNT];
        for channel in Channel::ALL {
            let i = channel.index();
            let state = &channels[i];
            let gate = gates[i];
            intents[i] = if !gate.online || !gate.line_stable {
                VoltageIntent::Hold
            } else {
                resolve_voltage(channel, state.measured().voltage, reference_voltage, config)
            };
        }

        let broadcast = Channel::ALL.iter().any(|ch| {
            let i = ch.index();
            channels[i].wants_broadcast(gates[i], intents[i], reference_ready, &config.policies)
        });

        Self::new(intents, broadcast, reference_ready)
    }

    pub fn intent(&self, channel: Channel) -> VoltageIntent {
        self.intents[channel.index()]
    }

    /// Every line-stable channel republishes its voltage
    pub fn broadcast(&self) -> bool {
        self.broadcast
    }

    pub fn reference_ready(&self) -> bool {
        self.reference_ready
    }
}

/// Voltage a line-stable channel reports.
///
/// `reference_voltage` is the calibrated reference reading, `None` while
/// the reference is not ready. Without a reference every other channel
/// holds what it last published.
pub fn resolve_voltage(
    channel: Channel,
    raw: f32,
    reference_voltage: Option<f32>,
    config: &EngineConfig,
) -> VoltageIntent {
    if channel == config.reference {
        return VoltageIntent::report(raw + config.reference_offset_v);
    }
    match reference_voltage {
        Some(v_ref) if fabsf(raw - v_ref) < config.sync_band_v => VoltageIntent::report(v_ref),
        Some(_) => VoltageIntent::Report {
            voltage: raw,
            mismatch: true,
        },
        None => VoltageIntent::Hold,
    }
}

/// The telemetry engine of one cart
pub struct Engine<S: DurableStore> {
    config: EngineConfig,
    store: S,
    channels: [ChannelState; Channel::COUNT],
    leak: LeakSensorState,
    cart: EnvironmentCartState,
    devices: [EnvironmentDeviceState; Channel::COUNT],
    alert: AlertScheduler,
    warning: bool,
    cycles: u64,
    last_cycle: Timestamp,
}

impl<S: DurableStore> Engine<S> {
    /// Validate `config` and restore every accumulator from `store`
    pub fn new(config: EngineConfig, mut store: S, now: Timestamp) -> Result<Self, ConfigError> {
        config.validate()?;

        let channels = Channel::ALL.map(|channel| {
            ChannelState::new(
                channel,
                config.devices[channel.index()],
                WarmupSupervisor::new(config.line_warmup_ms, config.load_warmup_ms),
                config.persist_interval_ms,
                &mut store,
                now,
            )
        });

        log_info!("Engine started, voltage reference {}", config.reference);

        Ok(Self {
            alert: AlertScheduler::new(config.alert_repeat_ms),
            config,
            store,
            channels,
            leak: LeakSensorState::new(),
            cart: EnvironmentCartState::new(),
            devices: Channel::ALL.map(EnvironmentDeviceState::new),
            warning: false,
            cycles: 0,
            last_cycle: now,
        })
    }

    /// Run one cycle at the time given by `clock`
    pub fn run_cycle_with<T: TimeSource + ?Sized>(&mut self, input: &CycleInput, clock: &T) -> CycleReport {
        self.run_cycle(input, clock.now())
    }

    /// Run one sampling cycle
    pub fn run_cycle(&mut self, input: &CycleInput, now: Timestamp) -> CycleReport {
        let boot = self.cycles == 0;
        let mut aggregator = AlarmAggregator::new();
        let mut channel_flags = [ChannelFlags::default(); Channel::COUNT];
        let mut gates = [Gate::OFFLINE; Channel::COUNT];

        // Pass A
        for channel in Channel::ALL {
            let i = channel.index();
            let observation = self.channels[i].observe(
                input.sample(channel),
                &self.config.validator,
                now,
                &mut channel_flags[i],
            );
            gates[i] = observation.gate;
            aggregator.raise_if(observation.socket_lost, WarningSource::SocketLost(channel));
        }
        let all_offline = gates.iter().all(|gate| !gate.online);

        let plan = VoltagePlan::resolve(&self.channels, &gates, &self.config);

        // Pass B
        for channel in Channel::ALL {
            let i = channel.index();
            let intent = plan.intent(channel);
            if intent.mismatch() {
                log_warn!(
                    "{}: {:.1} V is off the reference by more than {:.1} V",
                    channel,
                    self.channels[i].measured().voltage,
                    self.config.sync_band_v
                );
                aggregator.raise(WarningSource::VoltageMismatch(channel));
            }

            let state = &mut self.channels[i];
            state.apply(
                gates[i],
                intent,
                plan.broadcast(),
                &self.config.policies,
                now,
                &mut self.store,
                &mut channel_flags[i],
            );
            aggregator.raise_if(state.alarms().any(), WarningSource::PowerAlarm(channel));
        }
        if !all_offline {
            self.log_read_failures();
        }

        let mut leak_flags = LeakFlags::default();
        let leak_ok = self.leak.observe(&input.leak, &self.config, &mut leak_flags);
        aggregator.raise_if(!leak_ok, WarningSource::LeakSensorFault);
        aggregator.raise_if(self.leak.has_alarm(), WarningSource::Leak);

        let mut cart_flags = CartFlags::default();
        let mut device_flags = [BoundFlags::default(); Channel::COUNT];
        let ambient_ok = self.cart.observe(&input.ambient, &self.config, &mut cart_flags);
        aggregator.raise_if(!ambient_ok, WarningSource::AmbientSensorFault);
        if ambient_ok {
            for channel in Channel::ALL {
                let i = channel.index();
                device_flags[i] = self.devices[i].evaluate(
                    self.config.envelope(channel),
                    self.cart.temperature(),
                    self.cart.humidity(),
                );
            }
        }
        aggregator.raise_if(self.cart.has_alarm(), WarningSource::CartEnvironment);
        for device in &self.devices {
            aggregator.raise_if(device.alarms().any(), WarningSource::DeviceEnvironment(device.channel()));
        }

        let warning = aggregator.warning(all_offline);
        let sound_alert = self.alert.poll(warning, now);
        if sound_alert {
            log_info!("Alert: {} warning source(s)", aggregator.sources().len());
        }

        self.warning = warning;
        self.cycles += 1;
        self.last_cycle = now;

        CycleReport {
            boot,
            timestamp: now,
            channels: Channel::ALL.map(|channel| self.channel_report(channel, channel_flags[channel.index()], now)),
            leak: LeakReport {
                current_ma: self.leak.current_ma(),
                soft_warning: self.leak.soft_warning(),
                strong_warning: self.leak.strong_warning(),
                flags: leak_flags,
            },
            cart: CartReport {
                temperature: self.cart.temperature(),
                humidity: self.cart.humidity(),
                room: *self.cart.room(),
                common: *self.cart.common(),
                flags: cart_flags,
            },
            devices: Channel::ALL.map(|channel| DeviceEnvironmentReport {
                channel,
                alarms: *self.devices[channel.index()].alarms(),
                flags: device_flags[channel.index()],
            }),
            all_offline,
            warning,
            warning_sources: aggregator.sources().len() as u8,
            sound_alert,
        }
    }

    /// Zero a device's operating time (maintenance)
    pub fn reset_operating_time(&mut self, channel: Channel, now: Timestamp) {
        log_info!("{}: operating time reset", channel);
        self.channels[channel.index()].reset_operating_time(now, &mut self.store);
    }

    pub fn operating_time_ms(&self, channel: Channel, now: Timestamp) -> u64 {
        self.channels[channel.index()].operating_time_ms(now)
    }

    pub fn channel(&self, channel: Channel) -> &ChannelState {
        &self.channels[channel.index()]
    }

    pub fn channels(&self) -> &[ChannelState; Channel::COUNT] {
        &self.channels
    }

    pub fn leak(&self) -> &LeakSensorState {
        &self.leak
    }

    pub fn cart(&self) -> &EnvironmentCartState {
        &self.cart
    }

    pub fn device(&self, channel: Channel) -> &EnvironmentDeviceState {
        &self.devices[channel.index()]
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Warning of the last cycle
    pub fn warning(&self) -> bool {
        self.warning
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Human-readable state dump as of the last cycle
    pub fn snapshot(&self) -> SnapshotView<'_> {
        SnapshotView::new(
            &self.channels,
            &self.leak,
            &self.cart,
            &self.devices,
            &self.config,
            self.last_cycle,
        )
    }

    pub fn log_snapshot(&self) {
        log_debug!("{}", self.snapshot());
    }

    fn channel_report(&self, channel: Channel, flags: ChannelFlags, now: Timestamp) -> ChannelReport {
        let state = &self.channels[channel.index()];
        ChannelReport {
            channel,
            values: *state.published(),
            measured: *state.measured(),
            machine_running: state.machine_running(),
            socket_present: state.socket_present(),
            alarms: *state.alarms(),
            operating_time_ms: state.operating_time_ms(now),
            flags,
        }
    }

    fn log_read_failures(&self) {
        for state in &self.channels {
            match state.read_failures() {
                READ_FAIL_NOTICE_COUNT => {
                    log_warn!("{}: no usable sample for {} cycles", state.channel(), READ_FAIL_NOTICE_COUNT);
                }
                READ_FAIL_WARN_COUNT => {
                    log_warn!(
                        "{}: no usable sample for {} cycles, check meter wiring",
                        state.channel(),
                        READ_FAIL_WARN_COUNT
                    );
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const MAINS: ElectricalSample = ElectricalSample {
        voltage: 230.0,
        current: 0.0,
        power: 0.0,
        frequency: 50.0,
        power_factor: 0.0,
        valid: true,
    };

    fn with_voltage(voltage: f32) -> ElectricalSample {
        ElectricalSample { voltage, ..MAINS }
    }

    fn engine() -> Engine<MemoryStore> {
        Engine::new(EngineConfig::default(), MemoryStore::new(), 0).unwrap()
    }

    #[test]
    fn reference_value_wins_inside_band() {
        let config = EngineConfig::default();
        let intent = resolve_voltage(Channel::Imaging1S, 231.5, Some(230.0), &config);
        assert_eq!(intent, VoltageIntent::report(230.0));
    }

    #[test]
    fn own_value_outside_band() {
        let config = EngineConfig::default();
        let intent = resolve_voltage(Channel::Imaging1S, 235.0, Some(230.0), &config);
        assert_eq!(intent.voltage_or(0.0), 235.0);
        assert!(intent.mismatch(), "band edge is exclusive");
    }

    #[test]
    fn holds_without_reference() {
        let config = EngineConfig::default();
        let intent = resolve_voltage(Channel::TricamPal, 228.0, None, &config);
        assert!(intent.is_hold());
        assert!(!intent.mismatch());
        assert_eq!(intent.voltage_or(230.0), 230.0);
    }

    #[test]
    fn lost_reference_freezes_voltages() {
        let mut engine = engine();
        let input = CycleInput::unpowered()
            .with_channel(Channel::Display, with_voltage(230.0))
            .with_channel(Channel::Xenon300, with_voltage(230.0))
            .with_ambient(AmbientSample::reading(22.0, 50.0))
            .with_leak(LeakSample::reading(0.1));
        engine.run_cycle(&input, 0);

        let drifted = input
            .with_channel(Channel::Display, ElectricalSample::invalid())
            .with_channel(Channel::Xenon300, with_voltage(236.0));
        let report = engine.run_cycle(&drifted, 500);
        let xenon = report.channel(Channel::Xenon300);
        assert_eq!(xenon.values.voltage, 230.0);
        assert!(!xenon.flags.voltage);
        assert_eq!(xenon.measured.voltage, 236.0);
        assert_eq!(report.warning_sources, 1, "only the lost reference socket");
    }

    #[test]
    fn reference_applies_offset() {
        let config = EngineConfig::default().with_reference(Channel::Display, 1.0);
        let intent = resolve_voltage(Channel::Display, 229.0, Some(230.0), &config);
        assert_eq!(intent, VoltageIntent::report(230.0));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig::default().with_sync_band(-1.0);
        assert!(Engine::new(config, MemoryStore::new(), 0).is_err());
    }

    #[test]
    fn boot_reconciles_to_reference() {
        let mut engine = engine();
        let input = CycleInput::unpowered()
            .with_channel(Channel::Display, with_voltage(230.0))
            .with_channel(Channel::Imaging1S, with_voltage(231.5));
        let report = engine.run_cycle(&input, 0);
        assert_eq!(report.channel(Channel::Imaging1S).values.voltage, 230.0);
        assert_eq!(report.channel(Channel::Imaging1S).measured.voltage, 231.5);
    }

    #[test]
    fn reference_move_is_broadcast() {
        let mut engine = engine();
        let input = CycleInput::unpowered()
            .with_channel(Channel::Display, with_voltage(230.0))
            .with_channel(Channel::Xenon300, with_voltage(230.5));
        engine.run_cycle(&input, 0);

        // Idle sockets bypass the median, so the move shows up at once
        let moved = CycleInput::unpowered()
            .with_channel(Channel::Display, with_voltage(233.0))
            .with_channel(Channel::Xenon300, with_voltage(230.5));
        let report = engine.run_cycle(&moved, 1000);
        assert!(report.channel(Channel::Display).flags.voltage);
        assert!(report.channel(Channel::Xenon300).flags.voltage, "own reading did not move");
        assert_eq!(report.channel(Channel::Xenon300).values.voltage, 233.0);

        let report = engine.run_cycle(&moved, 2000);
        assert!(!report.channel(Channel::Xenon300).flags.voltage);
    }

    #[test]
    fn pass_b_uses_plan_as_given() {
        let mut engine = engine();
        let input = CycleInput::unpowered().with_channel(Channel::Imaging1Hub, with_voltage(230.0));
        engine.run_cycle(&input, 0);

        let state = &mut engine.channels[Channel::Imaging1Hub.index()];
        let mut flags = ChannelFlags::default();
        let gate = state.observe(&with_voltage(230.0), &EngineConfig::default().validator, 1000, &mut flags).gate;

        let mut intents = [VoltageIntent::default(); Channel::COUNT];
        intents[Channel::Imaging1Hub.index()] = VoltageIntent::Report {
            voltage: 226.0,
            mismatch: true,
        };
        let plan = VoltagePlan::new(intents, true, true);

        state.apply(
            gate,
            plan.intent(Channel::Imaging1Hub),
            plan.broadcast(),
            &EngineConfig::default().policies,
            1000,
            &mut engine.store,
            &mut flags,
        );
        assert!(flags.voltage);
        assert_eq!(state.published().voltage, 226.0);
    }

    #[test]
    fn mismatch_raises_warning() {
        let mut engine = engine();
        let input = CycleInput::unpowered()
            .with_channel(Channel::Display, with_voltage(230.0))
            .with_channel(Channel::EndoflatorUi400, with_voltage(238.0))
            .with_ambient(AmbientSample::reading(22.0, 50.0))
            .with_leak(LeakSample::reading(0.1));
        let report = engine.run_cycle(&input, 0);
        assert!(report.warning);
        assert_eq!(report.warning_sources, 1);
        assert!(report.sound_alert);
        assert_eq!(report.channel(Channel::EndoflatorUi400).values.voltage, 238.0);
    }

    #[test]
    fn snapshot_uses_last_cycle() {
        let mut engine = engine();
        engine.run_cycle(&CycleInput::unpowered(), 42);
        assert_eq!(engine.snapshot().timestamp(), 42);
        assert_eq!(engine.cycles(), 1);
    }
}
