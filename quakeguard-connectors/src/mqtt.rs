//! MQTT connector for seismic stations
//!
//! Built on the synchronous `rumqttc` client. The connection is serviced
//! from the station loop through [`MqttConnector::poll`], which waits at
//! most `poll_timeout` per event and handles at most `max_events_per_poll`
//! events, so sampling never stalls behind the broker.
//!
//! ## Topics
//!
//! | Topic                 | Direction | Retained | Content               |
//! |-----------------------|-----------|----------|-----------------------|
//! | `<prefix>/alert`      | out       | yes      | alert document        |
//! | `<prefix>/status`     | out       | yes      | status document       |
//! | `<prefix>/data`       | out       | no       | raw acceleration      |
//! | `<prefix>/command`    | in        | -        | `reset` or `status`   |
//!
//! The broker publishes an `offline` status on the station's behalf if the
//! connection drops without a clean disconnect.

use std::collections::VecDeque;
use std::str::FromStr;
use std::time::{Duration, Instant};

use quakeguard_core::RemoteCommand;
use rumqttc::{Client, ConnectReturnCode, Connection, Event, LastWill, MqttOptions, Packet, QoS};

use crate::manager::AlertSink;
use crate::payload::{AlertPayload, DataPayload, StatusPayload};
use crate::{AlertChannel, ConnectionStats, ConnectorError};

/// Request channel depth between client and event loop
const REQUEST_CAPACITY: usize = 16;

/// MQTT configuration
#[derive(Clone, Debug)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Username and password; `None` connects anonymously
    pub credentials: Option<(String, String)>,
    pub keep_alive: Duration,
    pub qos: QoS,
    pub alert_topic: String,
    pub status_topic: String,
    pub data_topic: String,
    pub command_topic: String,
    /// Longest wait for a single event while connected
    pub poll_timeout: Duration,
    /// Longest wait for the broker handshake
    pub connect_timeout: Duration,
    /// Delay between reconnect attempts
    pub reconnect_interval: Duration,
    pub max_events_per_poll: usize,
}

impl MqttConfig {
    /// Broker at `host:port`, identified as `client_id`
    pub fn new(host: impl Into<String>, port: u16, client_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: client_id.into(),
            credentials: None,
            keep_alive: Duration::from_secs(60),
            qos: QoS::AtMostOnce,
            alert_topic: "earthquake/alert".into(),
            status_topic: "earthquake/status".into(),
            data_topic: "earthquake/data".into(),
            command_topic: "earthquake/command".into(),
            poll_timeout: Duration::from_millis(5),
            connect_timeout: Duration::from_secs(2),
            reconnect_interval: Duration::from_secs(5),
            max_events_per_poll: 16,
        }
    }

    /// Authenticate; an empty user name keeps the connection anonymous
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        let user = user.into();
        self.credentials = (!user.is_empty()).then(|| (user, password.into()));
        self
    }

    /// Put all four topics under `prefix`
    pub fn topic_prefix(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        self.alert_topic = format!("{}/alert", prefix);
        self.status_topic = format!("{}/status", prefix);
        self.data_topic = format!("{}/data", prefix);
        self.command_topic = format!("{}/command", prefix);
        self
    }

    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    fn validate(&self) -> Result<(), ConnectorError> {
        if self.host.is_empty() {
            return Err(ConnectorError::Config("Broker host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ConnectorError::Config("Broker port must not be zero".into()));
        }
        if self.client_id.is_empty() {
            return Err(ConnectorError::Config("Client id must not be empty".into()));
        }
        if self.keep_alive < Duration::from_secs(1) {
            return Err(ConnectorError::Config("Keep-alive must be at least one second".into()));
        }
        if self.max_events_per_poll == 0 {
            return Err(ConnectorError::Config("Must handle at least one event per poll".into()));
        }
        Ok(())
    }

    fn options(&self) -> Result<MqttOptions, ConnectorError> {
        let will = StatusPayload::new("offline", &self.client_id, 0).to_bytes()?;

        let mut options = MqttOptions::new(self.client_id.as_str(), self.host.as_str(), self.port);
        options
            .set_keep_alive(self.keep_alive)
            .set_clean_session(true)
            .set_last_will(LastWill::new(self.status_topic.as_str(), will, QoS::AtLeastOnce, true));
        if let Some((user, password)) = &self.credentials {
            options.set_credentials(user.as_str(), password.as_str());
        }
        Ok(options)
    }
}

/// MQTT alert channel and command receiver
pub struct MqttConnector {
    config: MqttConfig,
    client: Client,
    connection: Connection,
    connected: bool,
    ever_connected: bool,
    next_attempt: Option<Instant>,
    pending: VecDeque<RemoteCommand>,
    stats: ConnectionStats,
}

impl MqttConnector {
    /// Create the client; the first connection attempt happens on [`poll`](Self::poll)
    pub fn new(config: MqttConfig) -> Result<Self, ConnectorError> {
        config.validate()?;
        let (client, connection) = Client::new(config.options()?, REQUEST_CAPACITY);

        Ok(Self {
            config,
            client,
            connection,
            connected: false,
            ever_connected: false,
            next_attempt: None,
            pending: VecDeque::new(),
            stats: ConnectionStats::default(),
        })
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Whether the broker has acknowledged the current session
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Service the connection, collecting any remote commands
    pub fn poll(&mut self, commands: &mut VecDeque<RemoteCommand>) {
        self.service();
        commands.extend(self.pending.drain(..));
    }

    fn service(&mut self) {
        if !self.connected {
            if matches!(self.next_attempt, Some(at) if Instant::now() < at) {
                return;
            }
            log::info!("Connecting to MQTT broker {}:{}", self.config.host, self.config.port);
        }

        for _ in 0..self.config.max_events_per_poll {
            let timeout = if self.connected {
                self.config.poll_timeout
            } else {
                self.config.connect_timeout
            };

            match self.connection.recv_timeout(timeout) {
                Ok(Ok(event)) => self.handle_event(event),
                Ok(Err(err)) => {
                    let err = ConnectorError::Transport(err.to_string());
                    log::warn!("MQTT connection failed: {}", err);
                    self.stats.last_error = Some(err.to_string());
                    self.connected = false;
                    self.next_attempt = Some(Instant::now() + self.config.reconnect_interval);
                    return;
                }
                // Nothing pending within the timeout
                Err(_) => {
                    if !self.connected {
                        self.next_attempt = Some(Instant::now() + self.config.reconnect_interval);
                    }
                    return;
                }
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code != ConnectReturnCode::Success {
                    log::warn!("MQTT broker refused connection: {:?}", ack.code);
                    self.connected = false;
                    return;
                }
                if self.ever_connected {
                    self.stats.reconnections += 1;
                }
                self.connected = true;
                self.ever_connected = true;
                self.next_attempt = None;
                log::info!("MQTT connected");

                // Clean sessions forget subscriptions
                if let Err(err) = self.client.try_subscribe(self.config.command_topic.as_str(), QoS::AtLeastOnce) {
                    log::warn!("Command subscription failed: {}", err);
                }
            }
            Event::Incoming(Packet::Publish(publish)) => {
                let text = String::from_utf8_lossy(&publish.payload);
                log::info!("MQTT message received: {} -> {}", publish.topic, text);

                if publish.topic == self.config.command_topic {
                    match RemoteCommand::from_str(&text) {
                        Ok(command) => self.pending.push_back(command),
                        Err(()) => log::debug!("Ignoring unknown command {:?}", text),
                    }
                }
            }
            Event::Incoming(Packet::Disconnect) => {
                self.connected = false;
            }
            _ => {}
        }
    }

    /// Queue a publish and give the event loop a chance to send it
    fn publish(&mut self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<(), ConnectorError> {
        if !self.connected {
            let err = ConnectorError::NotConnected;
            self.stats.record_failure(&err);
            return Err(err);
        }

        let len = payload.len();
        if let Err(err) = self.client.try_publish(topic, self.config.qos, retain, payload) {
            let err = ConnectorError::Transport(err.to_string());
            self.stats.record_failure(&err);
            return Err(err);
        }
        self.stats.record_sent(len);

        // Commands seen while flushing stay pending for the next poll
        self.service();
        Ok(())
    }

    /// Publish a retained alert document
    pub fn publish_alert(&mut self, alert: &AlertPayload) -> Result<(), ConnectorError> {
        let topic = self.config.alert_topic.clone();
        self.publish(&topic, alert.to_bytes()?, true)
    }

    /// Publish a retained status document
    pub fn publish_status(&mut self, status: &StatusPayload) -> Result<(), ConnectorError> {
        let topic = self.config.status_topic.clone();
        self.publish(&topic, status.to_bytes()?, true)
    }

    /// Publish one raw sample for live plotting
    pub fn publish_data(&mut self, data: &DataPayload) -> Result<(), ConnectorError> {
        let topic = self.config.data_topic.clone();
        self.publish(&topic, data.to_bytes()?, false)
    }
}

impl AlertSink for MqttConnector {
    fn channel(&self) -> AlertChannel {
        AlertChannel::Mqtt
    }

    fn is_available(&self) -> bool {
        self.connected
    }

    fn send_alert(&mut self, alert: &AlertPayload) -> Result<(), ConnectorError> {
        self.publish_alert(alert)
    }

    fn send_status(&mut self, status: &StatusPayload) -> Result<(), ConnectorError> {
        self.publish_status(status)
    }

    fn send_data(&mut self, data: &DataPayload) -> Result<(), ConnectorError> {
        self.publish_data(data)
    }

    fn poll(&mut self, commands: &mut VecDeque<RemoteCommand>) {
        MqttConnector::poll(self, commands)
    }
}
