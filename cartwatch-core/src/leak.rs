//! Leakage Current
//!
//! A single residual-current sensor watches the cart's protective earth.
//! Two exclusive warning levels: soft covers `[soft, strong)`, strong
//! everything from `strong` upwards. Like the ambient alarms they are
//! evaluated on the published value.

use crate::{
    config::{EngineConfig, LeakThresholds},
    report::{LeakFlags, PublishPhase},
};

/// One leakage-current reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeakSample {
    /// Leakage current (mA)
    pub current_ma: f32,
    pub valid: bool,
}

impl LeakSample {
    pub fn reading(current_ma: f32) -> Self {
        Self { current_ma, valid: true }
    }

    pub fn invalid() -> Self {
        Self {
            current_ma: 0.0,
            valid: false,
        }
    }
}

/// Published state of the leakage sensor
#[derive(Debug, Clone, Default)]
pub struct LeakSensorState {
    phase: PublishPhase,
    current_ma: f32,
    soft_warning: bool,
    strong_warning: bool,
    read_failures: u32,
}

impl LeakSensorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warning levels for a current of `current_ma`
    pub fn levels(thresholds: &LeakThresholds, current_ma: f32) -> (bool, bool) {
        let strong = current_ma >= thresholds.strong_ma;
        let soft = current_ma >= thresholds.soft_ma && !strong;
        (soft, strong)
    }

    /// Process this cycle's reading; `false` when the sample was unusable
    pub fn observe(&mut self, sample: &LeakSample, config: &EngineConfig, flags: &mut LeakFlags) -> bool {
        if !sample.valid {
            self.read_failures = self.read_failures.saturating_add(1);
            return false;
        }
        if let Err(_e) = config.validator.leak(sample.current_ma) {
            log_debug!("Leak sample rejected: {}", _e);
            self.read_failures = self.read_failures.saturating_add(1);
            return false;
        }
        self.read_failures = 0;

        let value = sample.current_ma;
        match self.phase {
            PublishPhase::Fresh => {
                self.current_ma = value;
                *flags = LeakFlags::ALL;
            }
            PublishPhase::Established => {
                if config.policies.leak_current.exceeded(value, self.current_ma) {
                    self.current_ma = value;
                    flags.current = true;
                }
            }
        }

        let (soft, strong) = Self::levels(&config.leak, self.current_ma);
        if self.phase == PublishPhase::Established {
            flags.soft_warning = soft != self.soft_warning;
            flags.strong_warning = strong != self.strong_warning;
        }
        self.soft_warning = soft;
        self.strong_warning = strong;
        self.phase = PublishPhase::Established;
        true
    }

    pub fn phase(&self) -> PublishPhase {
        self.phase
    }

    /// Published leakage current (mA)
    pub fn current_ma(&self) -> f32 {
        self.current_ma
    }

    pub fn soft_warning(&self) -> bool {
        self.soft_warning
    }

    pub fn strong_warning(&self) -> bool {
        self.strong_warning
    }

    pub fn has_alarm(&self) -> bool {
        self.soft_warning || self.strong_warning
    }

    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe(state: &mut LeakSensorState, ma: f32) -> LeakFlags {
        let mut flags = LeakFlags::default();
        state.observe(&LeakSample::reading(ma), &EngineConfig::default(), &mut flags);
        flags
    }

    #[test]
    fn levels_are_exclusive() {
        let t = LeakThresholds::default();
        assert_eq!(LeakSensorState::levels(&t, 2.99), (false, false));
        assert_eq!(LeakSensorState::levels(&t, 3.0), (true, false));
        assert_eq!(LeakSensorState::levels(&t, 4.99), (true, false));
        assert_eq!(LeakSensorState::levels(&t, 5.0), (false, true));
    }

    #[test]
    fn first_reading_flags_everything() {
        let mut leak = LeakSensorState::new();
        assert_eq!(observe(&mut leak, 0.5), LeakFlags::ALL);
        assert!(!leak.has_alarm());
    }

    #[test]
    fn delta_below_floor_is_quiet() {
        let mut leak = LeakSensorState::new();
        observe(&mut leak, 0.5);
        assert!(!observe(&mut leak, 0.51).any());
        assert!(observe(&mut leak, 0.53).current);
        assert_eq!(leak.current_ma(), 0.53);
    }

    #[test]
    fn escalation_flags_both_levels() {
        let mut leak = LeakSensorState::new();
        observe(&mut leak, 1.0);

        let flags = observe(&mut leak, 3.5);
        assert!(flags.current && flags.soft_warning && !flags.strong_warning);
        assert!(leak.soft_warning());

        let flags = observe(&mut leak, 6.0);
        assert!(flags.soft_warning && flags.strong_warning);
        assert!(leak.strong_warning() && !leak.soft_warning());
    }

    #[test]
    fn invalid_sample_is_reported() {
        let mut leak = LeakSensorState::new();
        let mut flags = LeakFlags::default();
        assert!(!leak.observe(&LeakSample::invalid(), &EngineConfig::default(), &mut flags));
        assert_eq!(leak.phase(), PublishPhase::Fresh);
        assert!(!leak.observe(&LeakSample::reading(-1.0), &EngineConfig::default(), &mut flags));
        assert_eq!(leak.read_failures(), 2);
    }
}
