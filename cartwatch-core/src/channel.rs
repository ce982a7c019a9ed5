//! Power Channels
//!
//! Every device on the cart is plugged into its own metered socket. A
//! [`ChannelState`] owns everything the engine knows about one socket: the
//! median windows, the warm-up supervisor, the operating-time accumulator
//! and the values last handed to the transport.
//!
//! A cycle touches a channel twice:
//!
//! 1. [`ChannelState::observe`] validates and filters the raw sample and
//!    advances the warm-up gate. Offline handling is finished here.
//! 2. [`ChannelState::apply`] runs once the voltage of every channel has
//!    been resolved, compares against the published values and updates the
//!    alarms and the accumulator.

use core::fmt;

use crate::{
    config::{DeviceLimits, FieldPolicies},
    constants::time::MS_PER_SECOND,
    filter::ElectricalFilters,
    operating_time::OperatingTimeAccumulator,
    report::{ChannelFlags, PublishPhase},
    time::Timestamp,
    traits::DurableStore,
    validation::SampleValidator,
    warmup::{Gate, WarmupSupervisor},
};

/// Durable-store words reserved per channel
pub const SLOT_STRIDE: u16 = 16;

/// The six monitored devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// Surgical display (voltage reference)
    #[cfg_attr(feature = "serde", serde(rename = "display"))]
    Display,
    /// Imaging camera control unit
    #[cfg_attr(feature = "serde", serde(rename = "imaging_1s"))]
    Imaging1S,
    /// Imaging module hub
    #[cfg_attr(feature = "serde", serde(rename = "imaging_1_hub"))]
    Imaging1Hub,
    /// Tricam PAL camera unit
    #[cfg_attr(feature = "serde", serde(rename = "tricam_pal"))]
    TricamPal,
    /// Xenon 300 light source
    #[cfg_attr(feature = "serde", serde(rename = "xenon_300"))]
    Xenon300,
    /// Endoflator UI400 gas insufflator
    #[cfg_attr(feature = "serde", serde(rename = "endoflator_ui400"))]
    EndoflatorUi400,
}

impl Channel {
    /// Number of channels
    pub const COUNT: usize = 6;

    /// All channels in index order
    pub const ALL: [Channel; Self::COUNT] = [
        Channel::Display,
        Channel::Imaging1S,
        Channel::Imaging1Hub,
        Channel::TricamPal,
        Channel::Xenon300,
        Channel::EndoflatorUi400,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Display => "display",
            Channel::Imaging1S => "imaging_1s",
            Channel::Imaging1Hub => "imaging_1_hub",
            Channel::TricamPal => "tricam_pal",
            Channel::Xenon300 => "xenon_300",
            Channel::EndoflatorUi400 => "endoflator_ui400",
        }
    }

    /// Durable-store slot of this channel's operating time
    pub const fn slot(self) -> u16 {
        self as u16 * SLOT_STRIDE
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name())
    }
}

/// The five electrical quantities of a socket
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElectricalValues {
    /// RMS voltage (V)
    pub voltage: f32,
    /// RMS current (A)
    pub current: f32,
    /// Active power (W)
    pub power: f32,
    /// Line frequency (Hz)
    pub frequency: f32,
    /// Power factor (0..1)
    pub power_factor: f32,
}

impl ElectricalValues {
    pub const ZERO: ElectricalValues = ElectricalValues {
        voltage: 0.0,
        current: 0.0,
        power: 0.0,
        frequency: 0.0,
        power_factor: 0.0,
    };
}

/// One raw meter reading as delivered by the acquisition layer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElectricalSample {
    pub voltage: f32,
    pub current: f32,
    pub power: f32,
    pub frequency: f32,
    pub power_factor: f32,
    /// The driver got an answer from the meter
    pub valid: bool,
}

impl ElectricalSample {
    pub fn reading(voltage: f32, current: f32, power: f32, frequency: f32, power_factor: f32) -> Self {
        Self {
            voltage,
            current,
            power,
            frequency,
            power_factor,
            valid: true,
        }
    }

    /// A meter that did not answer
    pub fn invalid() -> Self {
        Self {
            valid: false,
            ..Self::from(ElectricalValues::ZERO)
        }
    }

    pub fn values(&self) -> ElectricalValues {
        ElectricalValues {
            voltage: self.voltage,
            current: self.current,
            power: self.power,
            frequency: self.frequency,
            power_factor: self.power_factor,
        }
    }

    /// Values of a sample that is usable this cycle
    pub fn accepted(&self, validator: &SampleValidator) -> Option<ElectricalValues> {
        if !self.valid {
            return None;
        }
        let values = self.values();
        match validator.electrical(&values) {
            Ok(()) => Some(values),
            Err(_e) => {
                log_debug!("Electrical sample rejected: {}", _e);
                None
            }
        }
    }
}

impl From<ElectricalValues> for ElectricalSample {
    fn from(values: ElectricalValues) -> Self {
        Self::reading(
            values.voltage,
            values.current,
            values.power,
            values.frequency,
            values.power_factor,
        )
    }
}

/// Threshold alarms of one socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerAlarms {
    pub over_voltage: bool,
    pub under_voltage: bool,
    pub over_current: bool,
    pub over_power: bool,
}

impl PowerAlarms {
    pub const CLEAR: PowerAlarms = PowerAlarms {
        over_voltage: false,
        under_voltage: false,
        over_current: false,
        over_power: false,
    };

    /// Evaluate every alarm against `limits`
    pub fn evaluate(limits: &DeviceLimits, values: &ElectricalValues) -> Self {
        Self {
            over_voltage: limits.voltage.above(values.voltage),
            under_voltage: limits.voltage.below(values.voltage),
            over_current: values.current > limits.max_current,
            over_power: values.power > limits.max_power,
        }
    }

    /// Re-evaluate only the alarms whose side of the gate is stable
    pub fn refresh(&self, limits: &DeviceLimits, values: &ElectricalValues, gate: Gate) -> Self {
        let fresh = Self::evaluate(limits, values);
        let mut next = *self;
        if gate.line_stable {
            next.over_voltage = fresh.over_voltage;
            next.under_voltage = fresh.under_voltage;
        }
        if gate.load_stable {
            next.over_current = fresh.over_current;
            next.over_power = fresh.over_power;
        }
        next
    }

    pub fn any(&self) -> bool {
        self.over_voltage || self.under_voltage || self.over_current || self.over_power
    }

    /// Mark the alarms that differ from `prev`
    pub fn flag_edges(&self, prev: &PowerAlarms, flags: &mut ChannelFlags) {
        flags.over_voltage |= self.over_voltage != prev.over_voltage;
        flags.under_voltage |= self.under_voltage != prev.under_voltage;
        flags.over_current |= self.over_current != prev.over_current;
        flags.over_power |= self.over_power != prev.over_power;
    }
}

/// Voltage a channel reports this cycle, decided before any comparison
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VoltageIntent {
    /// Keep the published voltage: the channel is not line-stable or the
    /// reference is not ready. Never compared and never flagged.
    #[default]
    Hold,
    Report {
        voltage: f32,
        /// Own reading is outside the sync band of the reference
        mismatch: bool,
    },
}

impl VoltageIntent {
    pub fn report(voltage: f32) -> Self {
        VoltageIntent::Report { voltage, mismatch: false }
    }

    /// Reported voltage, or `held` when holding
    pub fn voltage_or(self, held: f32) -> f32 {
        match self {
            VoltageIntent::Hold => held,
            VoltageIntent::Report { voltage, .. } => voltage,
        }
    }

    pub fn mismatch(self) -> bool {
        matches!(self, VoltageIntent::Report { mismatch: true, .. })
    }

    pub fn is_hold(self) -> bool {
        self == VoltageIntent::Hold
    }
}

/// Outcome of [`ChannelState::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub gate: Gate,
    /// The socket was present last cycle and is gone now
    pub socket_lost: bool,
}

/// Everything the engine tracks for one socket
#[derive(Debug, Clone)]
pub struct ChannelState {
    channel: Channel,
    limits: DeviceLimits,
    phase: PublishPhase,
    filters: ElectricalFilters,
    warmup: WarmupSupervisor,
    accumulator: OperatingTimeAccumulator,
    measured: ElectricalValues,
    published: ElectricalValues,
    socket_present: bool,
    machine_running: bool,
    alarms: PowerAlarms,
    published_seconds: Option<u64>,
    read_failures: u32,
}

impl ChannelState {
    /// Create the channel, restoring its operating time from `store`
    pub fn new<S: DurableStore>(
        channel: Channel,
        limits: DeviceLimits,
        warmup: WarmupSupervisor,
        persist_interval_ms: u64,
        store: &mut S,
        now: Timestamp,
    ) -> Self {
        Self {
            channel,
            limits,
            phase: PublishPhase::Fresh,
            filters: ElectricalFilters::new(),
            warmup,
            accumulator: OperatingTimeAccumulator::restore_with_interval(
                channel.slot(),
                store,
                now,
                persist_interval_ms,
            ),
            measured: ElectricalValues::ZERO,
            published: ElectricalValues::ZERO,
            socket_present: false,
            machine_running: false,
            alarms: PowerAlarms::CLEAR,
            published_seconds: None,
            read_failures: 0,
        }
    }

    /// First pass: validate, filter and gate the raw sample.
    ///
    /// An unusable sample completes the offline handling here; such a
    /// channel only needs its accumulator advanced in [`apply`](Self::apply).
    pub fn observe(
        &mut self,
        sample: &ElectricalSample,
        validator: &SampleValidator,
        now: Timestamp,
        flags: &mut ChannelFlags,
    ) -> Observation {
        let Some(values) = sample.accepted(validator) else {
            let socket_lost = self.go_offline(flags);
            return Observation { gate: Gate::OFFLINE, socket_lost };
        };

        self.read_failures = 0;
        // Below idle the windows would hold the old load for two more cycles
        self.measured = if values.current < self.limits.idle_current {
            values
        } else {
            self.filters.push(values)
        };
        let raw_running = self.measured.current > self.limits.idle_current;

        let gate = match self.phase {
            PublishPhase::Fresh => self.warmup.adopt(raw_running),
            PublishPhase::Established => {
                let gate = self.warmup.observe(raw_running, now);
                if gate.line_settled {
                    log_debug!("{}: line settled", self.channel);
                }
                if !self.socket_present {
                    flags.socket_present = true;
                }
                if gate.machine_running != self.machine_running {
                    flags.machine_running = true;
                    log_debug!("{}: machine running {}", self.channel, gate.machine_running);
                }
                gate
            }
        };

        self.socket_present = true;
        self.machine_running = gate.machine_running;
        Observation { gate, socket_lost: false }
    }

    /// Whether this channel's reported voltage moved enough to publish
    /// every line-stable voltage of the cart
    pub fn wants_broadcast(
        &self,
        gate: Gate,
        intent: VoltageIntent,
        reference_ready: bool,
        policies: &FieldPolicies,
    ) -> bool {
        let VoltageIntent::Report { voltage, .. } = intent else {
            return false;
        };
        reference_ready
            && self.phase == PublishPhase::Established
            && gate.line_stable
            && !gate.line_settled
            && policies.voltage.exceeded(voltage, self.published.voltage)
    }

    /// Second pass: compare against the published state, refresh alarms
    /// and advance the accumulator
    #[allow(clippy::too_many_arguments)]
    pub fn apply<S: DurableStore>(
        &mut self,
        gate: Gate,
        intent: VoltageIntent,
        broadcast: bool,
        policies: &FieldPolicies,
        now: Timestamp,
        store: &mut S,
        flags: &mut ChannelFlags,
    ) {
        if gate.online {
            match self.phase {
                PublishPhase::Fresh => {
                    // Nothing published yet to hold on to
                    self.published = ElectricalValues {
                        voltage: intent.voltage_or(self.measured.voltage),
                        ..self.measured
                    };
                    self.alarms = PowerAlarms::evaluate(&self.limits, &self.measured);
                    flags.set_all();
                }
                PublishPhase::Established => {
                    self.compare(gate, intent, broadcast, policies, flags);
                }
            }
        } else if self.phase == PublishPhase::Fresh {
            flags.set_all();
        }

        self.accumulator.update(self.machine_running, now, store);
        let seconds = self.accumulator.get(now) / MS_PER_SECOND;
        if self.published_seconds != Some(seconds) {
            self.published_seconds = Some(seconds);
            flags.operating_time = true;
        }

        self.phase = PublishPhase::Established;
    }

    /// Zero the operating time; the next cycle reports it
    pub fn reset_operating_time<S: DurableStore>(&mut self, now: Timestamp, store: &mut S) {
        self.accumulator.reset(now, store);
        self.published_seconds = None;
    }

    fn compare(
        &mut self,
        gate: Gate,
        intent: VoltageIntent,
        broadcast: bool,
        policies: &FieldPolicies,
        flags: &mut ChannelFlags,
    ) {
        let m = self.measured;

        if gate.line_settled {
            // Back from offline the published voltage is zero; without a
            // reference the own reading seeds it
            self.published.voltage = intent.voltage_or(m.voltage);
            self.published.frequency = m.frequency;
            flags.voltage = true;
            flags.frequency = true;
        } else if gate.line_stable {
            if let (true, VoltageIntent::Report { voltage, .. }) = (broadcast, intent) {
                self.published.voltage = voltage;
                flags.voltage = true;
            }
            if policies.frequency.exceeded(m.frequency, self.published.frequency) {
                self.published.frequency = m.frequency;
                flags.frequency = true;
            }
        }

        if gate.load_stable {
            if policies.current.exceeded(m.current, self.published.current) {
                self.published.current = m.current;
                flags.current = true;
            }
            if policies.power.exceeded(m.power, self.published.power) {
                self.published.power = m.power;
                flags.power = true;
            }
            if policies.power_factor.exceeded(m.power_factor, self.published.power_factor) {
                self.published.power_factor = m.power_factor;
                flags.power_factor = true;
            }
        }

        let next = self.alarms.refresh(&self.limits, &m, gate);
        next.flag_edges(&self.alarms, flags);
        self.alarms = next;
    }

    /// Returns true when a present socket was lost on this cycle
    fn go_offline(&mut self, flags: &mut ChannelFlags) -> bool {
        self.read_failures = self.read_failures.saturating_add(1);
        self.warmup.lose_socket();
        self.filters.clear();
        self.measured = ElectricalValues::ZERO;

        let lost = match self.phase {
            PublishPhase::Fresh => false,
            PublishPhase::Established => {
                let p = self.published;
                flags.voltage |= p.voltage != 0.0;
                flags.current |= p.current != 0.0;
                flags.power |= p.power != 0.0;
                flags.frequency |= p.frequency != 0.0;
                flags.power_factor |= p.power_factor != 0.0;
                flags.machine_running |= self.machine_running;
                flags.socket_present |= self.socket_present;
                PowerAlarms::CLEAR.flag_edges(&self.alarms, flags);
                self.socket_present
            }
        };

        self.published = ElectricalValues::ZERO;
        self.socket_present = false;
        self.machine_running = false;
        self.alarms = PowerAlarms::CLEAR;
        lost
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    pub fn phase(&self) -> PublishPhase {
        self.phase
    }

    /// Latest filtered reading (zero while offline)
    pub fn measured(&self) -> &ElectricalValues {
        &self.measured
    }

    /// Values last handed to the transport
    pub fn published(&self) -> &ElectricalValues {
        &self.published
    }

    pub fn socket_present(&self) -> bool {
        self.socket_present
    }

    pub fn machine_running(&self) -> bool {
        self.machine_running
    }

    pub fn alarms(&self) -> &PowerAlarms {
        &self.alarms
    }

    pub fn warmup(&self) -> &WarmupSupervisor {
        &self.warmup
    }

    /// Consecutive cycles without a usable sample
    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }

    pub fn operating_time_ms(&self, now: Timestamp) -> u64 {
        self.accumulator.get(now)
    }

    pub fn accumulator(&self) -> &OperatingTimeAccumulator {
        &self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::EngineConfig, store::MemoryStore};

    fn imaging() -> (ChannelState, MemoryStore) {
        let config = EngineConfig::default();
        let mut store = MemoryStore::new();
        let state = ChannelState::new(
            Channel::Imaging1S,
            config.devices[Channel::Imaging1S.index()],
            WarmupSupervisor::default(),
            config.persist_interval_ms,
            &mut store,
            0,
        );
        (state, store)
    }

    fn step(
        state: &mut ChannelState,
        store: &mut MemoryStore,
        sample: ElectricalSample,
        now: Timestamp,
    ) -> (ChannelFlags, Observation) {
        let policies = FieldPolicies::default();
        let mut flags = ChannelFlags::default();
        let obs = state.observe(&sample, &SampleValidator::default(), now, &mut flags);
        let intent = VoltageIntent::report(state.measured().voltage);
        state.apply(obs.gate, intent, false, &policies, now, store, &mut flags);
        (flags, obs)
    }

    #[test]
    fn slots_are_strided() {
        assert_eq!(Channel::Display.slot(), 0);
        assert_eq!(Channel::Imaging1S.slot(), 16);
        assert_eq!(Channel::EndoflatorUi400.slot(), 80);
        assert_eq!(Channel::from_index(4), Some(Channel::Xenon300));
        assert_eq!(Channel::from_index(6), None);
    }

    #[test]
    fn boot_flags_everything() {
        let (mut state, mut store) = imaging();
        let (flags, _) = step(&mut state, &mut store, ElectricalSample::reading(230.0, 0.3, 60.0, 50.0, 0.9), 0);
        assert!(flags.all());
        assert!(state.machine_running(), "no warm-up at boot");
        assert_eq!(state.published().voltage, 230.0);
    }

    #[test]
    fn boot_offline_is_not_a_transition() {
        let (mut state, mut store) = imaging();
        let (flags, obs) = step(&mut state, &mut store, ElectricalSample::invalid(), 0);
        assert!(flags.all());
        assert!(!obs.socket_lost);
        assert!(!state.socket_present());
    }

    #[test]
    fn unchanged_reading_stays_quiet() {
        let (mut state, mut store) = imaging();
        let sample = ElectricalSample::reading(230.0, 0.3, 60.0, 50.0, 0.9);
        step(&mut state, &mut store, sample, 0);
        for t in 1..10 {
            let (flags, _) = step(&mut state, &mut store, sample, t * 100);
            assert!(!flags.any_electrical(), "cycle {}", t);
        }
    }

    #[test]
    fn offline_flags_non_zero_fields_once() {
        let (mut state, mut store) = imaging();
        step(&mut state, &mut store, ElectricalSample::reading(230.0, 0.0, 0.0, 50.0, 0.0), 0);

        let (flags, obs) = step(&mut state, &mut store, ElectricalSample::invalid(), 500);
        assert!(obs.socket_lost);
        assert!(flags.voltage && flags.frequency && flags.socket_present);
        assert!(!flags.current && !flags.power && !flags.power_factor);
        assert!(!flags.machine_running);
        assert_eq!(*state.published(), ElectricalValues::ZERO);

        let (flags, obs) = step(&mut state, &mut store, ElectricalSample::invalid(), 1000);
        assert!(!obs.socket_lost);
        assert!(!flags.any_electrical());
        assert_eq!(state.read_failures(), 2);
    }

    #[test]
    fn out_of_range_sample_is_offline() {
        let (mut state, mut store) = imaging();
        step(&mut state, &mut store, ElectricalSample::reading(230.0, 0.3, 60.0, 50.0, 0.9), 0);
        let (_, obs) = step(&mut state, &mut store, ElectricalSample::reading(f32::NAN, 0.3, 60.0, 50.0, 0.9), 100);
        assert!(obs.socket_lost);
        assert!(!state.machine_running());
    }

    #[test]
    fn reconnect_reports_line_once_settled() {
        let (mut state, mut store) = imaging();
        step(&mut state, &mut store, ElectricalSample::invalid(), 0);

        let sample = ElectricalSample::reading(229.0, 0.0, 0.0, 50.0, 0.0);
        let (flags, _) = step(&mut state, &mut store, sample, 1000);
        assert!(flags.socket_present);
        assert!(!flags.voltage, "line still warming up");

        let (flags, _) = step(&mut state, &mut store, sample, 4000);
        assert!(flags.voltage && flags.frequency);
        assert_eq!(state.published().voltage, 229.0);
    }

    #[test]
    fn alarms_follow_stable_readings() {
        let (mut state, mut store) = imaging();
        step(&mut state, &mut store, ElectricalSample::reading(230.0, 0.3, 60.0, 50.0, 0.9), 0);

        // A sustained overload has to win the median first
        let overload = ElectricalSample::reading(230.0, 0.6, 130.0, 50.0, 0.9);
        let mut raised = None;
        for t in 1..=3 {
            let (flags, _) = step(&mut state, &mut store, overload, t * 100);
            if flags.over_current {
                raised = Some(t);
            }
        }
        assert_eq!(raised, Some(3));
        assert!(state.alarms().over_current && state.alarms().over_power);

        let (flags, _) = step(&mut state, &mut store, ElectricalSample::invalid(), 1000);
        assert!(flags.over_current && flags.over_power);
        assert!(!state.alarms().any());
    }

    #[test]
    fn reconnect_starts_a_fresh_window() {
        let (mut state, mut store) = imaging();
        let before = ElectricalSample::reading(230.0, 0.3, 60.0, 50.0, 0.9);
        step(&mut state, &mut store, before, 0);
        step(&mut state, &mut store, before, 100);
        step(&mut state, &mut store, ElectricalSample::invalid(), 200);

        let after = ElectricalSample::reading(230.0, 0.5, 100.0, 50.0, 0.9);
        step(&mut state, &mut store, after, 300);
        assert_eq!(state.measured().current, 0.5);
        assert_eq!(state.measured().power, 100.0);
    }

    #[test]
    fn idle_reading_bypasses_median() {
        let (mut state, mut store) = imaging();
        step(&mut state, &mut store, ElectricalSample::reading(230.0, 0.3, 60.0, 50.0, 0.9), 0);
        step(&mut state, &mut store, ElectricalSample::reading(230.0, 0.0, 0.0, 50.0, 0.0), 100);
        assert_eq!(state.measured().current, 0.0);
        assert!(!state.machine_running());
    }
}
