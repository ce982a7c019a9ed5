//! Error Types for the Telemetry Core
//!
//! ## Design Philosophy
//!
//! Nothing inside a sampling cycle is allowed to be fatal. Every error here
//! describes a condition the engine degrades around:
//!
//! - [`SampleError`]: a raw reading is physically impossible. The channel is
//!   processed as offline for that cycle.
//! - [`StoreError`]: the durable store misbehaved. Restores fall back to a
//!   zeroed accumulator, failed writes keep the in-memory value authoritative.
//! - [`ConfigError`]: a configuration table is inconsistent. This is the only
//!   error that reaches the caller, from [`Engine::new`](crate::Engine::new).
//!
//! Like the rest of the crate the errors are `Copy`, carry no heap data and
//! use `&'static str` for context so they can be logged from `no_std` builds.

use thiserror_no_std::Error;

/// Result type for durable-store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a [`DurableStore`](crate::traits::DurableStore)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The backing medium is not initialised or not present
    #[error("Durable store unavailable")]
    Unavailable,

    /// Reading a slot failed
    #[error("Failed to read slot {slot}")]
    ReadFailed {
        /// Slot offset that was being read
        slot: u16,
    },

    /// Writing or committing a slot failed
    #[error("Failed to write slot {slot}")]
    WriteFailed {
        /// Slot offset that was being written
        slot: u16,
    },
}

/// Raw sample rejected before filtering
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SampleError {
    /// NaN or infinite reading
    #[error("Invalid {field}: not a finite number")]
    InvalidValue {
        /// Field that carried the bad value
        field: &'static str,
    },

    /// Reading outside what the meter can physically report
    #[error("{field} {value} outside range [{min}, {max}]")]
    OutOfRange {
        /// Field that failed the check
        field: &'static str,
        /// Reported value
        value: f32,
        /// Lower meter limit
        min: f32,
        /// Upper meter limit
        max: f32,
    },
}

/// Inconsistent configuration table
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A minimum is not strictly below its maximum
    #[error("Inverted bounds for {what}")]
    InvertedBounds {
        /// Which table entry is wrong
        what: &'static str,
    },

    /// A value that must be positive is zero or negative
    #[error("{what} must be positive")]
    NonPositive {
        /// Which setting is wrong
        what: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for StoreError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Unavailable => defmt::write!(fmt, "Store unavailable"),
            Self::ReadFailed { slot } => defmt::write!(fmt, "Read failed at slot {}", slot),
            Self::WriteFailed { slot } => defmt::write!(fmt, "Write failed at slot {}", slot),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SampleError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidValue { field } => defmt::write!(fmt, "Invalid {}", field),
            Self::OutOfRange { field, value, min, max } =>
                defmt::write!(fmt, "{} {} outside [{}, {}]", field, value, min, max),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvertedBounds { what } => defmt::write!(fmt, "Inverted bounds: {}", what),
            Self::NonPositive { what } => defmt::write!(fmt, "{} must be positive", what),
        }
    }
}
