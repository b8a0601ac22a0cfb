//! Error Types for the Detection Core
//!
//! ## Design Philosophy
//!
//! Errors follow the same rules as the rest of the core:
//!
//! 1. **Small Size**: variants carry a few scalars or a `&'static str`, never a
//!    heap string, so they can be returned from the sampling loop freely.
//!
//! 2. **Copy Semantics**: every error is `Copy`.
//!
//! 3. **Degrade, don't crash**: nothing in detection returns an error. Missing
//!    data yields zero-valued features. Only storage and configuration can
//!    fail, and storage failures leave the in-memory queue fully usable.
//!
//! ## Error Categories
//!
//! ### Storage
//! - `StorageError`: the backing medium could not be read or written
//! - `QueueError::Malformed`: the persisted record exists but cannot be decoded
//!
//! ### Configuration
//! - `ConfigError`: a parameter set the filters or detector cannot run with
//!
//! ## Handling Strategy
//!
//! ```rust
//! use quakeguard_core::{QueueError, StorageError};
//!
//! fn on_persist_result(result: Result<(), QueueError>) {
//!     match result {
//!         Ok(()) => {}
//!         Err(QueueError::Storage(StorageError::WriteFailed)) => {
//!             // Event is still queued in memory, it just won't survive a reboot
//!         }
//!         Err(_) => {
//!             // Log and keep sampling
//!         }
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures of the stable-storage medium backing the event queue
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Record exists but could not be read
    #[error("Failed to read queue record")]
    ReadFailed,

    /// Record could not be written
    #[error("Failed to write queue record")]
    WriteFailed,

    /// Storage medium is not mounted or not reachable
    #[error("Storage unavailable")]
    Unavailable,
}

/// Durable queue errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Underlying storage failed
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Persisted record is not a valid queue document
    #[error("Persisted queue record is malformed")]
    Malformed,

    /// Queue could not be encoded for persistence
    #[error("Failed to encode queue record")]
    Encode,
}

impl From<StorageError> for QueueError {
    fn from(err: StorageError) -> Self {
        QueueError::Storage(err)
    }
}

/// Configuration errors - parameters the algorithms cannot run with
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Sample rate must be positive
    #[error("Sample rate must be positive")]
    InvalidSampleRate,

    /// STA/LTA windows must each hold at least one sample and STA must be shorter
    #[error("Invalid window: STA {sta_samples} samples, LTA {lta_samples} samples")]
    InvalidWindow {
        /// Short-term window length in samples
        sta_samples: usize,
        /// Long-term window length in samples
        lta_samples: usize,
    },

    /// Detrigger threshold must sit below the trigger threshold
    #[error("Detrigger {detrigger} must be below trigger {trigger}")]
    NoHysteresis {
        /// Configured trigger ratio
        trigger: f32,
        /// Configured detrigger ratio
        detrigger: f32,
    },

    /// Band edges must satisfy 0 < low < high < Nyquist
    #[error("Band [{low_hz}, {high_hz}] Hz invalid for Nyquist {nyquist_hz} Hz")]
    InvalidBand {
        /// Low cutoff
        low_hz: f32,
        /// High cutoff
        high_hz: f32,
        /// Half the sample rate
        nyquist_hz: f32,
    },

    /// Smoother variances must be positive
    #[error("Noise variances must be positive")]
    InvalidNoise,

    /// PGA thresholds must be positive and strictly increasing light→violent
    #[error("PGA alert thresholds must be positive and ascending")]
    UnorderedThresholds,

    /// Minimum event duration must not be negative
    #[error("Minimum event duration must not be negative")]
    InvalidDuration,

    /// Queue must hold at least one event
    #[error("Queue capacity must be at least 1")]
    ZeroCapacity,

    /// Device identifier does not fit the inline buffer
    #[error("Device id longer than {max} bytes")]
    DeviceIdTooLong {
        /// Maximum accepted length
        max: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for StorageError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ReadFailed => defmt::write!(fmt, "Storage read failed"),
            Self::WriteFailed => defmt::write!(fmt, "Storage write failed"),
            Self::Unavailable => defmt::write!(fmt, "Storage unavailable"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for QueueError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Storage(err) => defmt::write!(fmt, "Queue storage: {}", err),
            Self::Malformed => defmt::write!(fmt, "Queue record malformed"),
            Self::Encode => defmt::write!(fmt, "Queue encode failed"),
        }
    }
}
