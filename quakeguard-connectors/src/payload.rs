//! Outgoing message formats
//!
//! Three JSON documents leave the device:
//!
//! ```text
//! alert   {"device_id", "timestamp", "event": {...}, "location": {"lat", "lon"}}
//! status  {"device_id", "status", "timestamp"}
//! data    {"device_id", "timestamp", "acceleration": {"x", "y", "z"}}
//! ```
//!
//! Field names are snake_case here, unlike the queue record, because
//! dashboards already subscribe to this shape.

use quakeguard_core::{AccelReading, AlertLevel, EarthquakeEvent, Timestamp};
use serde::{Deserialize, Serialize};

use crate::ConnectorError;

/// Fixed installation coordinates attached to every alert
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl Location {
    /// Coordinates in degrees
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Event fields as published
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub magnitude: f32,
    pub pga: f32,
    pub pgv: f32,
    pub cav: f32,
    /// Episode length in milliseconds
    pub duration: u64,
    pub alert_level: AlertLevel,
    pub confirmed: bool,
}

impl From<&EarthquakeEvent> for EventSummary {
    fn from(event: &EarthquakeEvent) -> Self {
        Self {
            magnitude: event.magnitude,
            pga: event.pga,
            pgv: event.pgv,
            cav: event.cav,
            duration: event.duration,
            alert_level: event.alert_level,
            confirmed: event.confirmed,
        }
    }
}

/// Alert document published for a confirmed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub device_id: String,
    pub timestamp: Timestamp,
    pub event: EventSummary,
    pub location: Location,
}

impl AlertPayload {
    /// Build the alert for `event`, stamped at `timestamp`
    pub fn new(event: &EarthquakeEvent, device_id: &str, timestamp: Timestamp, location: Location) -> Self {
        Self {
            device_id: device_id.to_owned(),
            timestamp,
            event: EventSummary::from(event),
            location,
        }
    }

    /// Serialized JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConnectorError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Human-readable text used by the chat and push services
    pub fn message(&self) -> String {
        let e = &self.event;
        format!(
            "EARTHQUAKE DETECTED!\n\
             Magnitude: {:.2}\n\
             PGA: {:.3} g\n\
             CAV: {:.3} g*s\n\
             Alert Level: {}\n\
             Duration: {:.1} seconds",
            e.magnitude,
            e.pga,
            e.cav,
            e.alert_level,
            e.duration as f32 / 1000.0
        )
    }

    /// Push priority: emergency for the two highest levels
    pub fn priority(&self) -> i8 {
        match self.event.alert_level {
            AlertLevel::Severe | AlertLevel::Extreme => 2,
            _ => 1,
        }
    }
}

/// Short liveness message ("online", "alive", "monitoring")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub device_id: String,
    pub status: String,
    pub timestamp: Timestamp,
}

impl StatusPayload {
    pub fn new(status: &str, device_id: &str, timestamp: Timestamp) -> Self {
        Self {
            device_id: device_id.to_owned(),
            status: status.to_owned(),
            timestamp,
        }
    }

    /// Serialized JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConnectorError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Three-axis acceleration block of a data message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Raw acceleration sample for live plotting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPayload {
    pub device_id: String,
    pub timestamp: Timestamp,
    pub acceleration: Acceleration,
}

impl DataPayload {
    pub fn new(reading: AccelReading, device_id: &str, timestamp: Timestamp) -> Self {
        Self {
            device_id: device_id.to_owned(),
            timestamp,
            acceleration: Acceleration {
                x: reading.x,
                y: reading.y,
                z: reading.z,
            },
        }
    }

    /// Serialized JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConnectorError> {
        Ok(serde_json::to_vec(self)?)
    }
}
