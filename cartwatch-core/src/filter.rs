//! Median Filtering of Raw Readings
//!
//! ## Overview
//!
//! The power meters occasionally return a single wild register read (a
//! half-updated frame, a collision on the shared bus). A short median window
//! removes those spikes without the lag a moving average would add to real
//! steps.
//!
//! ## Window Layout
//!
//! The window holds the last `N` samples, most recent first:
//!
//! ```text
//! push(x)   ┌────┬────┬────┬────┬────┐
//!   ──────► │ x  │ s1 │ s2 │ s3 │ s4 │ ──► s5 dropped
//!           └────┴────┴────┴────┴────┘
//! median = sorted(window)[N / 2]
//! ```
//!
//! On the first push the sample is replicated into every slot, so the
//! output starts at the first reading instead of being dragged toward zero
//! for `N / 2` cycles.

use crate::{channel::ElectricalValues, constants::sensors::MEDIAN_WINDOW};

/// Sliding median over the last `N` samples of one scalar field
#[derive(Debug, Clone)]
pub struct MedianFilter<const N: usize = MEDIAN_WINDOW> {
    /// Most recent sample at index 0
    window: [f32; N],
    primed: bool,
}

impl<const N: usize> MedianFilter<N> {
    pub const fn new() -> Self {
        Self {
            window: [0.0; N],
            primed: false,
        }
    }

    /// Add a sample and return the median of the window
    pub fn push(&mut self, value: f32) -> f32 {
        if !self.primed {
            self.window = [value; N];
            self.primed = true;
        } else {
            self.window.copy_within(0..N - 1, 1);
            self.window[0] = value;
        }
        self.median()
    }

    /// Median of the current window (0.0 before the first push)
    pub fn median(&self) -> f32 {
        let mut sorted = self.window;
        sorted.sort_unstable_by(f32::total_cmp);
        sorted[N / 2]
    }

    /// Whether at least one sample has been pushed
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Window contents, most recent first
    pub fn window(&self) -> &[f32; N] {
        &self.window
    }

    /// Forget all samples; the next push primes the window again
    pub fn clear(&mut self) {
        self.primed = false;
    }
}

impl<const N: usize> Default for MedianFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// One median window per electrical field of a channel
#[derive(Debug, Clone, Default)]
pub struct ElectricalFilters {
    voltage: MedianFilter,
    current: MedianFilter,
    power: MedianFilter,
    frequency: MedianFilter,
    power_factor: MedianFilter,
}

impl ElectricalFilters {
    pub const fn new() -> Self {
        Self {
            voltage: MedianFilter::new(),
            current: MedianFilter::new(),
            power: MedianFilter::new(),
            frequency: MedianFilter::new(),
            power_factor: MedianFilter::new(),
        }
    }

    /// Push every field and return the filtered values
    pub fn push(&mut self, raw: ElectricalValues) -> ElectricalValues {
        ElectricalValues {
            voltage: self.voltage.push(raw.voltage),
            current: self.current.push(raw.current),
            power: self.power.push(raw.power),
            frequency: self.frequency.push(raw.frequency),
            power_factor: self.power_factor.push(raw.power_factor),
        }
    }

    pub fn clear(&mut self) {
        self.voltage.clear();
        self.current.clear();
        self.power.clear();
        self.frequency.clear();
        self.power_factor.clear();
    }
}

/// Median windows for the shared ambient probe
#[derive(Debug, Clone, Default)]
pub struct AmbientFilters {
    temperature: MedianFilter,
    humidity: MedianFilter,
}

impl AmbientFilters {
    pub const fn new() -> Self {
        Self {
            temperature: MedianFilter::new(),
            humidity: MedianFilter::new(),
        }
    }

    /// Push both fields, returning filtered `(temperature, humidity)`
    pub fn push(&mut self, temperature: f32, humidity: f32) -> (f32, f32) {
        (self.temperature.push(temperature), self.humidity.push(humidity))
    }
}
