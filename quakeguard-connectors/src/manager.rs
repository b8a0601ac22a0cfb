//! Fan-out over alert sinks
//!
//! [`AlertManager`] owns a list of boxed [`AlertSink`]s and implements the
//! core's `AlertDispatcher`:
//!
//! - `indicate` drives the local sinks only
//! - `broadcast` and queue drains go to every *available* remote sink and
//!   succeed if at least one accepted the alert
//! - `status` reaches every sink that is up
//! - [`AlertManager::send_data`] streams raw samples to sinks that take them
//! - `poll_command` polls each sink once, then hands out buffered commands

use std::collections::VecDeque;

use quakeguard_core::time::SystemClock;
use quakeguard_core::{
    AccelReading, AlertDispatcher, EarthquakeEvent, EventDelivery, RemoteCommand, TimeSource,
};

use crate::payload::{AlertPayload, DataPayload, Location, StatusPayload};
use crate::{AlertChannel, ConnectorError};

/// One alert channel
pub trait AlertSink {
    /// Kind of channel
    fn channel(&self) -> AlertChannel;

    /// Whether the sink can currently accept messages
    fn is_available(&self) -> bool;

    /// Deliver an alert
    fn send_alert(&mut self, alert: &AlertPayload) -> Result<(), ConnectorError>;

    /// Deliver a status message
    fn send_status(&mut self, status: &StatusPayload) -> Result<(), ConnectorError>;

    /// Deliver a raw sample; channels without a data feed ignore it
    fn send_data(&mut self, _data: &DataPayload) -> Result<(), ConnectorError> {
        Ok(())
    }

    /// Service the connection and collect pending remote commands
    fn poll(&mut self, _commands: &mut VecDeque<RemoteCommand>) {}
}

/// Alert dispatcher composed of independent sinks
pub struct AlertManager {
    sinks: Vec<Box<dyn AlertSink>>,
    clock: Box<dyn TimeSource>,
    location: Location,
    commands: VecDeque<RemoteCommand>,
}

impl AlertManager {
    /// Empty manager stamping payloads with wall-clock time
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            clock: Box::new(SystemClock),
            location: Location::default(),
            commands: VecDeque::new(),
        }
    }

    /// Add a sink
    pub fn with_sink<S: AlertSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Installation coordinates attached to alerts
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Time source for payload timestamps
    pub fn with_clock<T: TimeSource + 'static>(mut self, clock: T) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn add_sink<S: AlertSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Send `event` on every available sink of a matching channel
    ///
    /// Returns how many sinks accepted it.
    pub fn send_alert<F>(&mut self, event: &EarthquakeEvent, device_id: &str, mut channel: F) -> usize
    where
        F: FnMut(AlertChannel) -> bool,
    {
        let alert = AlertPayload::new(event, device_id, self.clock.now(), self.location);
        let mut accepted = 0;

        for sink in self.sinks.iter_mut() {
            if !channel(sink.channel()) || !sink.is_available() {
                continue;
            }
            match sink.send_alert(&alert) {
                Ok(()) => accepted += 1,
                Err(err) => log::warn!("{:?} alert failed: {}", sink.channel(), err),
            }
        }
        accepted
    }

    /// Send a status string on every available sink
    pub fn send_status(&mut self, status: &str, device_id: &str) {
        let payload = StatusPayload::new(status, device_id, self.clock.now());
        for sink in self.sinks.iter_mut().filter(|s| s.is_available()) {
            if let Err(err) = sink.send_status(&payload) {
                log::warn!("{:?} status failed: {}", sink.channel(), err);
            }
        }
    }

    /// Stream one raw reading to every available remote sink
    ///
    /// Failures are logged at debug only; live data is best effort.
    pub fn send_data(&mut self, reading: AccelReading, device_id: &str) {
        let payload = DataPayload::new(reading, device_id, self.clock.now());
        for sink in self
            .sinks
            .iter_mut()
            .filter(|s| s.channel().is_remote() && s.is_available())
        {
            if let Err(err) = sink.send_data(&payload) {
                log::debug!("{:?} data failed: {}", sink.channel(), err);
            }
        }
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDelivery for AlertManager {
    fn deliver(&mut self, event: &EarthquakeEvent, device_id: &str) -> bool {
        self.send_alert(event, device_id, |c| c.is_remote()) > 0
    }
}

impl AlertDispatcher for AlertManager {
    fn is_online(&self) -> bool {
        self.sinks
            .iter()
            .any(|s| s.channel().is_remote() && s.is_available())
    }

    fn broadcast(&mut self, event: &EarthquakeEvent, device_id: &str) -> bool {
        self.deliver(event, device_id)
    }

    fn indicate(&mut self, event: &EarthquakeEvent) {
        self.send_alert(event, "", |c| c == AlertChannel::Local);
    }

    fn status(&mut self, status: &str, device_id: &str) {
        self.send_status(status, device_id);
    }

    fn poll_command(&mut self) -> Option<RemoteCommand> {
        if self.commands.is_empty() {
            for sink in self.sinks.iter_mut() {
                sink.poll(&mut self.commands);
            }
        }
        self.commands.pop_front()
    }
}
