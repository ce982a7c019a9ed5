//! Power-Up Debounce
//!
//! ## Why Two Timers?
//!
//! When a device is plugged in or switched on, the line side (voltage,
//! frequency) settles within a couple of meter refreshes, while the load side
//! (current, power, power factor) goes through inrush and supply soft-start
//! for much longer. Gating both with one timer either reports inrush as a real
//! "machine on" event or delays voltage reports for no reason, so each side
//! has its own state machine:
//!
//! ```text
//! Line:   Cold ──socket valid──► ValidWarmup ──elapsed──► StableLine
//!           ▲                                                  │
//!           └──────────────── socket lost ◄────────────────────┘
//!
//! Load:   Idle ──raw current > idle──► MachineWarmup ──elapsed──► StableLoad
//!           ▲                               │                        │
//!           └──── raw current ≤ idle ◄──────┴────────────────────────┘
//! ```
//!
//! The falling edge of the load side is not debounced: a device that stops
//! drawing current is reported off on the same cycle. Losing the socket
//! resets both machines.

use crate::{
    constants::time::{LINE_WARMUP_MS, LOAD_WARMUP_MS},
    time::{elapsed, Timestamp},
};

/// Line-side debounce state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// No socket
    Cold,
    /// Socket just appeared, readings not trusted yet
    ValidWarmup { since: Timestamp },
    /// Voltage and frequency are trustworthy
    StableLine,
}

/// Load-side debounce state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Raw current at or below the idle threshold
    Idle,
    /// Current just rose above idle, "running" is suppressed
    MachineWarmup { since: Timestamp },
    /// Device is running and its load readings are trustworthy
    StableLoad,
}

/// What the debounce allows on this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gate {
    /// Socket is present this cycle
    pub online: bool,
    /// Voltage/frequency may be compared and published
    pub line_stable: bool,
    /// Current/power/power factor may be compared and published
    pub load_stable: bool,
    /// Line warm-up completed on this very cycle
    pub line_settled: bool,
    /// Debounced "machine running"
    pub machine_running: bool,
}

impl Gate {
    /// Gate of a channel whose socket is absent
    pub const OFFLINE: Gate = Gate {
        online: false,
        line_stable: false,
        load_stable: false,
        line_settled: false,
        machine_running: false,
    };
}

/// Per-channel two-timer debounce
#[derive(Debug, Clone)]
pub struct WarmupSupervisor {
    line: LineState,
    load: LoadState,
    line_warmup_ms: u64,
    load_warmup_ms: u64,
}

impl Default for WarmupSupervisor {
    fn default() -> Self {
        Self::new(LINE_WARMUP_MS, LOAD_WARMUP_MS)
    }
}

impl WarmupSupervisor {
    pub fn new(line_warmup_ms: u64, load_warmup_ms: u64) -> Self {
        Self {
            line: LineState::Cold,
            load: LoadState::Idle,
            line_warmup_ms,
            load_warmup_ms,
        }
    }

    pub fn line(&self) -> LineState {
        self.line
    }

    pub fn load(&self) -> LoadState {
        self.load
    }

    /// Advance both machines for a cycle in which the socket is valid
    pub fn observe(&mut self, raw_running: bool, now: Timestamp) -> Gate {
        let mut line_settled = false;

        if self.line == LineState::Cold {
            self.line = LineState::ValidWarmup { since: now };
        }
        if let LineState::ValidWarmup { since } = self.line {
            if elapsed(since, now) >= self.line_warmup_ms {
                self.line = LineState::StableLine;
                line_settled = true;
            }
        }

        if raw_running {
            if self.load == LoadState::Idle {
                self.load = LoadState::MachineWarmup { since: now };
            }
            if let LoadState::MachineWarmup { since } = self.load {
                if elapsed(since, now) >= self.load_warmup_ms {
                    self.load = LoadState::StableLoad;
                }
            }
        } else {
            self.load = LoadState::Idle;
        }

        self.gate(line_settled)
    }

    /// Socket lost: both machines fall back to their initial state
    pub fn lose_socket(&mut self) {
        self.line = LineState::Cold;
        self.load = LoadState::Idle;
    }

    /// Take over a socket that was already powered at boot.
    ///
    /// No transient is in progress, so both sides start stable.
    pub fn adopt(&mut self, raw_running: bool) -> Gate {
        self.line = LineState::StableLine;
        self.load = if raw_running { LoadState::StableLoad } else { LoadState::Idle };
        self.gate(false)
    }

    fn gate(&self, line_settled: bool) -> Gate {
        let line_stable = self.line == LineState::StableLine;
        let load_warming = matches!(self.load, LoadState::MachineWarmup { .. });
        Gate {
            online: true,
            line_stable,
            load_stable: line_stable && !load_warming,
            line_settled,
            machine_running: self.load == LoadState::StableLoad,
        }
    }
}
