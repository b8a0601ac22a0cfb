//! Samples, events and identifiers
//!
//! ## Data flow
//!
//! ```text
//! AccelReading ──condition──► AccelSample ──detector──► EarthquakeEvent ──queue──► QueuedEvent
//!  (raw x,y,z)               (x,y,z + time)             (classified episode)       (+ device id)
//! ```
//!
//! All types here are `Copy` except `DeviceId`, which is an inline string and
//! never touches the heap. Events are handed around by value: the queue
//! stores a copy, never a reference into the detector.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_DEVICE_ID_LEN;
use crate::errors::{ConfigError, ConfigResult};
use crate::time::Timestamp;

/// One three-axis accelerometer reading (m/s²), without a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelReading {
    /// X axis acceleration
    pub x: f32,
    /// Y axis acceleration
    pub y: f32,
    /// Z axis acceleration
    pub z: f32,
}

impl AccelReading {
    /// Create a reading from three axis values
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Conditioned, timestamped acceleration sample held in the rolling window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelSample {
    /// X axis acceleration (m/s²)
    pub x: f32,
    /// Y axis acceleration (m/s²)
    pub y: f32,
    /// Z axis acceleration (m/s²)
    pub z: f32,
    /// Monotonic sample time (ms)
    pub timestamp: Timestamp,
}

impl AccelSample {
    /// Create a sample from axis values
    pub const fn new(x: f32, y: f32, z: f32, timestamp: Timestamp) -> Self {
        Self { x, y, z, timestamp }
    }

    /// Stamp a reading with its sample time
    pub const fn at(reading: AccelReading, timestamp: Timestamp) -> Self {
        Self::new(reading.x, reading.y, reading.z, timestamp)
    }
}

/// Shaking severity, ordered from weakest to strongest
///
/// Serialized as the upper-case names used on the wire and in the queue
/// record (`"NEGLIGIBLE"` ... `"EXTREME"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    /// Below the light threshold
    #[default]
    Negligible,
    /// Felt indoors
    Light,
    /// Felt by all
    Moderate,
    /// Light damage possible
    Strong,
    /// Moderate damage
    Severe,
    /// Heavy damage
    Extreme,
}

impl AlertLevel {
    /// Wire name of the level
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Negligible => "NEGLIGIBLE",
            AlertLevel::Light => "LIGHT",
            AlertLevel::Moderate => "MODERATE",
            AlertLevel::Strong => "STRONG",
            AlertLevel::Severe => "SEVERE",
            AlertLevel::Extreme => "EXTREME",
        }
    }

    /// Whether the level warrants the loudest local alarm
    pub const fn is_dangerous(&self) -> bool {
        matches!(self, AlertLevel::Strong | AlertLevel::Severe | AlertLevel::Extreme)
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AlertLevel {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.as_str())
    }
}

/// One trigger episode, classified
///
/// Field names match the persisted queue record (`startTime`, `alertLevel`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthquakeEvent {
    /// Coarse single-station magnitude estimate, set on confirmation
    pub magnitude: f32,
    /// Running peak ground acceleration (g)
    pub pga: f32,
    /// Peak ground velocity, reserved
    pub pgv: f32,
    /// Cumulative absolute velocity since trigger (g·s)
    pub cav: f32,
    /// Trigger time (ms)
    pub start_time: Timestamp,
    /// Episode length (ms), set on confirmation
    pub duration: u64,
    /// Level derived from the running PGA
    pub alert_level: AlertLevel,
    /// Set once detrigger and minimum duration both hold
    pub confirmed: bool,
}

impl EarthquakeEvent {
    /// Fresh episode starting at `start_time`
    pub fn started_at(start_time: Timestamp) -> Self {
        Self {
            start_time,
            ..Self::default()
        }
    }

    /// Episode duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.duration as f32 / 1000.0
    }
}

/// Inline device identifier (at most 32 bytes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(heapless::String<MAX_DEVICE_ID_LEN>);

impl DeviceId {
    /// Wrap an identifier, rejecting ones that do not fit inline
    pub fn new(id: &str) -> ConfigResult<Self> {
        let mut inner = heapless::String::new();
        inner
            .push_str(id)
            .map_err(|_| ConfigError::DeviceIdTooLong { max: MAX_DEVICE_ID_LEN })?;
        Ok(Self(inner))
    }

    /// Build the ESP32-style id from a MAC address: `ESP32_` + hex digits
    ///
    /// Separators (`:` or `-`) are dropped.
    pub fn from_mac(mac: &str) -> ConfigResult<Self> {
        let mut inner: heapless::String<MAX_DEVICE_ID_LEN> = heapless::String::new();
        let too_long = ConfigError::DeviceIdTooLong { max: MAX_DEVICE_ID_LEN };
        inner.push_str("ESP32_").map_err(|_| too_long)?;
        for c in mac.chars().filter(|c| *c != ':' && *c != '-') {
            inner.push(c.to_ascii_uppercase()).map_err(|_| too_long)?;
        }
        Ok(Self(inner))
    }

    /// Identifier as a string slice
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
