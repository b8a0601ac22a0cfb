//! Alert Channels for Seismic Stations
//!
//! ## Overview
//!
//! The detection core decides *that* an earthquake happened. This crate
//! decides *who hears about it*. Each channel is an [`AlertSink`]; an
//! [`AlertManager`] fans out to all of them and implements the core's
//! `AlertDispatcher`, so a `Station` can drive it directly.
//!
//! ## Channels
//!
//! ### Local indicator
//!
//! Traffic-light lamps and a buzzer on the device itself. Always available,
//! works with no network at all. Hardware sits behind the [`Indicator`]
//! trait so boards, simulators and tests plug in the same way.
//!
//! ### MQTT
//!
//! **When to use:**
//! - A broker is reachable on the local network
//! - Dashboards or other stations subscribe to alerts
//! - Remote `reset`/`status` commands are needed
//!
//! **Characteristics:**
//! - Alerts and statuses are published retained, so late subscribers see the
//!   last known state
//! - The connection is polled with a short, bounded timeout once per loop
//!   pass; nothing blocks sampling for long
//! - Drained queue entries go out on the same alert topic
//!
//! ### Webhooks
//!
//! Pushover, Telegram and Discord over HTTPS. Each service is optional;
//! missing credentials simply skip it.
//!
//! ## Delivery Semantics
//!
//! ```text
//! confirmed event ─► AlertManager::broadcast ─► every available remote sink
//!                                               │
//!                         accepted by any? ─────┴─► yes: done
//!                                                   no:  Station queues it
//! ```
//!
//! A sink never panics on network failure. It returns a [`ConnectorError`]
//! and the manager reports "not delivered", which is the core's cue to queue
//! the event and retry later.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use quakeguard_connectors::{AlertManager, LocalAlert, LogIndicator, Location};
//! use quakeguard_connectors::webhook::{WebhookConfig, WebhookNotifier};
//!
//! let webhooks = WebhookNotifier::new(
//!     WebhookConfig::new().telegram("123456:bot-token", "-100200300"),
//! )?;
//!
//! let manager = AlertManager::new()
//!     .with_location(Location::new(37.77, -122.42))
//!     .with_sink(LocalAlert::new(LogIndicator))
//!     .with_sink(webhooks);
//! # let _ = manager;
//! # Ok::<(), quakeguard_connectors::ConnectorError>(())
//! ```

pub mod local;
pub mod manager;
pub mod payload;

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "http")]
pub mod webhook;

// Re-export common types
pub use local::{Indicator, Lamp, LocalAlert, LogIndicator};
pub use manager::{AlertManager, AlertSink};
pub use payload::{AlertPayload, DataPayload, Location, StatusPayload};

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttConnector};

#[cfg(feature = "http")]
pub use webhook::{WebhookConfig, WebhookNotifier};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    #[error("Missing credentials for {0}")]
    MissingCredentials(&'static str),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned status {status}")]
    HttpStatus { status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Which kind of channel a sink is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertChannel {
    /// Lamps and buzzer on the device
    Local,
    /// MQTT broker
    Mqtt,
    /// HTTP push and chat services
    Webhook,
}

impl AlertChannel {
    /// Whether the channel leaves the device
    pub const fn is_remote(&self) -> bool {
        !matches!(self, AlertChannel::Local)
    }
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Number of reconnections
    pub reconnections: u32,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    pub(crate) fn record_sent(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub(crate) fn record_failure(&mut self, err: &ConnectorError) {
        self.messages_failed += 1;
        self.last_error = Some(err.to_string());
    }
}
