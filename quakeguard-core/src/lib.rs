//! Detection core for QuakeGuard
//!
//! Turns a raw three-axis acceleration stream into classified, confirmed
//! earthquake events and keeps confirmed events on durable storage until
//! they can be delivered.
//!
//! Key constraints:
//! - Runs on ESP32-class devices (single cooperative loop)
//! - No heap allocation per sample once the detector is built
//! - Storage failures degrade durability, never detection
//!
//! ```no_run
//! use quakeguard_core::{
//!     AccelReading, AccelSample, ConditioningChain, DetectorConfig, DetectorUpdate,
//!     FilterConfig, SmootherConfig, TriggerDetector,
//! };
//!
//! let config = DetectorConfig::default();
//! let mut chain = ConditioningChain::new(
//!     config.sample_rate_hz as f32,
//!     &FilterConfig::default(),
//!     &SmootherConfig::default(),
//! )
//! .with_gravity_reference();
//! let mut detector = TriggerDetector::new(config);
//!
//! let raw = AccelReading::new(0.02, -0.01, 9.83);
//! let conditioned = chain.process(raw);
//! if let DetectorUpdate::Confirmed(event) = detector.add_sample(AccelSample::at(conditioned, 1_000)) {
//!     // hand the event to a delivery channel
//!     let _ = event;
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod config;
pub mod constants;
pub mod delivery;
pub mod detector;
pub mod errors;
pub mod event;
pub mod filters;
pub mod queue;
pub mod sensor;
pub mod station;
pub mod time;

// Public API
pub use config::{
    AlertThresholds, DetectorConfig, FilterConfig, QueueConfig, SmootherConfig, StationConfig,
};
pub use delivery::{AlertDispatcher, EventDelivery, RemoteCommand};
pub use detector::{DetectorUpdate, RollingWindow, TriggerDetector};
pub use errors::{ConfigError, ConfigResult, QueueError, QueueResult, StorageError};
pub use event::{AccelReading, AccelSample, AlertLevel, DeviceId, EarthquakeEvent};
pub use filters::{BandpassFilter, ConditioningChain, KalmanSmoother};
pub use queue::{EventQueue, MemoryStorage, QueueStats, QueueStorage, QueuedEvent};
#[cfg(feature = "std")]
pub use queue::FileStorage;
pub use sensor::{AccelerometerSource, ReplaySource};
pub use station::{Station, StationContext, TickReport};
pub use time::{FixedTime, Timestamp, TimeSource};
#[cfg(feature = "std")]
pub use time::{MonotonicClock, SystemClock};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
