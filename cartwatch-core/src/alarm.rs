//! System Warning and Alert Rate Limiting
//!
//! [`AlarmAggregator`] folds every per-entity alarm of a cycle into one
//! boolean. [`AlertScheduler`] turns that boolean into audible alerts:
//!
//! ```text
//!           warning                 warning && elapsed >= repeat
//!  Quiet ────────────► Sounding ◄──────────────────────────────┐
//!    ▲   (fire now)        │           (fire again)            │
//!    │                     └───────────────────────────────────┘
//!    │      !warning              │
//!    └────────────────────────────┘
//! ```
//!
//! Clearing the warning re-arms the scheduler so the next onset fires
//! immediately.

use heapless::Vec;

use crate::{
    channel::Channel,
    constants::time::ALERT_REPEAT_INTERVAL_MS,
    time::{elapsed, Timestamp},
};

/// Room for every source a cycle can raise
const MAX_SOURCES: usize = 32;

/// Condition that contributed to the system warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSource {
    /// Over/under voltage, over current or over power
    PowerAlarm(Channel),
    /// Voltage outside the sync band of the reference
    VoltageMismatch(Channel),
    /// Socket went offline this cycle
    SocketLost(Channel),
    /// Soft or strong leakage warning
    Leak,
    LeakSensorFault,
    /// Room or common-device band violated
    CartEnvironment,
    /// Device envelope violated
    DeviceEnvironment(Channel),
    AmbientSensorFault,
}

/// Collects the warning sources of one cycle
#[derive(Debug, Clone, Default)]
pub struct AlarmAggregator {
    sources: Vec<WarningSource, MAX_SOURCES>,
}

impl AlarmAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, source: WarningSource) {
        // Every source kind is bounded by the channel count, so this cannot overflow
        let _ = self.sources.push(source);
    }

    /// Raise `source` when `condition` holds
    pub fn raise_if(&mut self, condition: bool, source: WarningSource) {
        if condition {
            self.raise(source);
        }
    }

    pub fn sources(&self) -> &[WarningSource] {
        &self.sources
    }

    /// Final warning of the cycle.
    ///
    /// When every socket is offline the cart itself is unpowered and
    /// nothing is reported as a fault.
    pub fn warning(&self, all_offline: bool) -> bool {
        !all_offline && !self.sources.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlertState {
    Quiet,
    Sounding { last_fire: Timestamp },
}

/// Rate limiter for the audible alert
#[derive(Debug, Clone)]
pub struct AlertScheduler {
    state: AlertState,
    repeat_ms: u64,
}

impl Default for AlertScheduler {
    fn default() -> Self {
        Self::new(ALERT_REPEAT_INTERVAL_MS)
    }
}

impl AlertScheduler {
    pub fn new(repeat_ms: u64) -> Self {
        Self {
            state: AlertState::Quiet,
            repeat_ms,
        }
    }

    /// Whether the alert should sound on this cycle
    pub fn poll(&mut self, warning: bool, now: Timestamp) -> bool {
        if !warning {
            self.state = AlertState::Quiet;
            return false;
        }

        let fire = match self.state {
            AlertState::Quiet => true,
            AlertState::Sounding { last_fire } => elapsed(last_fire, now) >= self.repeat_ms,
        };
        if fire {
            self.state = AlertState::Sounding { last_fire: now };
        }
        fire
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.state, AlertState::Sounding { .. })
    }
}
