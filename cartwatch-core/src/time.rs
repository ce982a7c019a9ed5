//! Time management for the sampling cycle
//!
//! The core never schedules callbacks. Every timeout is a comparison between
//! a stored [`Timestamp`] and the `now` handed to the cycle, so any tick
//! source works:
//! - Hardware millisecond counter on the node
//! - [`MonotonicClock`] on a hosted build
//! - [`FixedTime`] in tests

/// Milliseconds since boot from a monotonic tick counter
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Get precision in milliseconds
    fn precision_ms(&self) -> u32;
}

/// Milliseconds elapsed from `since` to `now`.
///
/// Saturates at zero if the clock is observed going backwards.
#[inline]
pub fn elapsed(since: Timestamp, now: Timestamp) -> u64 {
    now.saturating_sub(since)
}

/// Monotonic clock backed by `std::time::Instant` (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    boot: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    pub fn new() -> Self {
        Self { boot: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.boot.elapsed().as_millis() as Timestamp
    }

    fn precision_ms(&self) -> u32 {
        1
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn precision_ms(&self) -> u32 {
        1
    }
}
