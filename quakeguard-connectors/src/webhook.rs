//! Push and chat notifications over HTTPS
//!
//! ## Services
//!
//! | Service  | Request                                   | Success      |
//! |----------|-------------------------------------------|--------------|
//! | Pushover | form post, priority 1 or 2, `siren` sound | 200          |
//! | Telegram | JSON `sendMessage`, Markdown              | 200          |
//! | Discord  | JSON with one red embed                   | 200 or 204   |
//!
//! Each service is optional. A service without credentials is skipped, and
//! the notifier counts as delivered when any configured service accepted
//! the alert.
//!
//! ## Retries
//!
//! Transport failures, 5xx and 429 are retried with exponential backoff
//! (`backoff * 2^attempt`). Other statuses fail immediately. Retries block
//! the calling thread, so keep `max_retries` small on a sampling loop.
//!
//! When an alert reaches none of the configured services the notifier
//! reports itself unavailable for `cooldown`, so an alert manager stops
//! routing alerts into a dead link.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use quakeguard_connectors::webhook::{WebhookConfig, WebhookNotifier};
//!
//! let config = WebhookConfig::new()
//!     .pushover("app-token", "user-key")
//!     .discord("https://discord.com/api/webhooks/1/abc")
//!     .timeout_secs(5)
//!     .max_retries(1);
//!
//! let mut notifier = WebhookNotifier::new(config)?;
//! notifier.send_discord("Test alert")?;
//! # Ok::<(), quakeguard_connectors::ConnectorError>(())
//! ```

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::manager::AlertSink;
use crate::payload::{AlertPayload, StatusPayload};
use crate::{AlertChannel, ConnectionStats, ConnectorError};

const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";
const TELEGRAM_API: &str = "https://api.telegram.org";
const ALERT_TITLE: &str = "Earthquake Alert";
const DISCORD_USERNAME: &str = "Earthquake Alert Bot";
const DISCORD_EMBED_TITLE: &str = "Earthquake Detected!";
const DISCORD_EMBED_COLOR: u32 = 0xFF0000;

/// Pushover application token and user key
#[derive(Clone, Debug)]
pub struct PushoverCredentials {
    pub token: String,
    pub user: String,
}

/// Telegram bot token and target chat
#[derive(Clone, Debug)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

/// Webhook configuration
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub pushover: Option<PushoverCredentials>,
    pub telegram: Option<TelegramCredentials>,
    pub discord_url: Option<String>,
    /// Pushover messages endpoint
    pub pushover_endpoint: String,
    /// Telegram Bot API base URL
    pub telegram_api: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub backoff: Duration,
    /// How long the sink stays unavailable after an undelivered alert
    pub cooldown: Duration,
    /// User agent string
    pub user_agent: String,
}

impl WebhookConfig {
    /// No services configured
    pub fn new() -> Self {
        Self {
            pushover: None,
            telegram: None,
            discord_url: None,
            pushover_endpoint: PUSHOVER_ENDPOINT.to_string(),
            telegram_api: TELEGRAM_API.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff: Duration::from_millis(100),
            cooldown: Duration::from_secs(30),
            user_agent: format!("QuakeGuard/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Enable Pushover; empty values leave it disabled
    pub fn pushover(mut self, token: impl Into<String>, user: impl Into<String>) -> Self {
        let (token, user) = (token.into(), user.into());
        self.pushover = (!token.is_empty() && !user.is_empty())
            .then_some(PushoverCredentials { token, user });
        self
    }

    /// Enable Telegram; empty values leave it disabled
    pub fn telegram(mut self, bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let (bot_token, chat_id) = (bot_token.into(), chat_id.into());
        self.telegram = (!bot_token.is_empty() && !chat_id.is_empty())
            .then_some(TelegramCredentials { bot_token, chat_id });
        self
    }

    /// Enable Discord; an empty URL leaves it disabled
    pub fn discord(mut self, webhook_url: impl Into<String>) -> Self {
        let url = webhook_url.into();
        self.discord_url = (!url.is_empty()).then_some(url);
        self
    }

    pub fn pushover_endpoint(mut self, url: impl Into<String>) -> Self {
        self.pushover_endpoint = url.into();
        self
    }

    pub fn telegram_api(mut self, url: impl Into<String>) -> Self {
        self.telegram_api = url.into();
        self
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn backoff(mut self, base: Duration) -> Self {
        self.backoff = base;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Whether any service has credentials
    pub fn has_services(&self) -> bool {
        self.pushover.is_some() || self.telegram.is_some() || self.discord_url.is_some()
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_url(url: &str) -> Result<(), ConnectorError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConnectorError::Config(format!(
            "URL must start with http:// or https://: {}",
            url
        )))
    }
}

/// Form fields for a Pushover message
pub fn pushover_form<'a>(
    credentials: &'a PushoverCredentials,
    title: &'a str,
    message: &'a str,
    priority: &'a str,
) -> [(&'static str, &'a str); 6] {
    [
        ("token", credentials.token.as_str()),
        ("user", credentials.user.as_str()),
        ("title", title),
        ("message", message),
        ("priority", priority),
        ("sound", "siren"),
    ]
}

/// JSON body for Telegram `sendMessage`
pub fn telegram_body(credentials: &TelegramCredentials, message: &str) -> Value {
    json!({
        "chat_id": credentials.chat_id,
        "text": message,
        "parse_mode": "Markdown",
    })
}

/// JSON body for a Discord webhook
pub fn discord_body(message: &str) -> Value {
    json!({
        "content": message,
        "username": DISCORD_USERNAME,
        "embeds": [{
            "title": DISCORD_EMBED_TITLE,
            "description": message,
            "color": DISCORD_EMBED_COLOR,
        }],
    })
}

/// Webhook notifier using the lightweight ureq client
pub struct WebhookNotifier {
    config: WebhookConfig,
    agent: ureq::Agent,
    stats: Arc<Mutex<ConnectionStats>>,
    suspended_until: Option<Instant>,
}

impl WebhookNotifier {
    /// Create a notifier; rejects malformed endpoint URLs
    pub fn new(config: WebhookConfig) -> Result<Self, ConnectorError> {
        validate_url(&config.pushover_endpoint)?;
        validate_url(&config.telegram_api)?;
        if let Some(url) = &config.discord_url {
            validate_url(url)?;
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: Arc::new(Mutex::new(ConnectionStats::default())),
            suspended_until: None,
        })
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Snapshot of delivery counters
    pub fn stats(&self) -> ConnectionStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Send a Pushover notification
    pub fn send_pushover(&self, title: &str, message: &str, priority: i8) -> Result<(), ConnectorError> {
        let credentials = self
            .config
            .pushover
            .as_ref()
            .ok_or(ConnectorError::MissingCredentials("pushover"))?;

        let priority = priority.to_string();
        let form = pushover_form(credentials, title, message, &priority);
        let bytes = form.iter().map(|(k, v)| k.len() + v.len() + 2).sum();

        self.execute_with_retry("pushover", &[200], bytes, || {
            self.agent.post(&self.config.pushover_endpoint).send_form(&form)
        })
    }

    /// Send a Telegram message to the configured chat
    pub fn send_telegram(&self, message: &str) -> Result<(), ConnectorError> {
        let credentials = self
            .config
            .telegram
            .as_ref()
            .ok_or(ConnectorError::MissingCredentials("telegram"))?;

        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.telegram_api.trim_end_matches('/'),
            credentials.bot_token
        );
        let json = serde_json::to_string(&telegram_body(credentials, message))?;

        self.execute_with_retry("telegram", &[200], json.len(), || {
            self.agent
                .post(&url)
                .set("Content-Type", "application/json")
                .send_string(&json)
        })
    }

    /// Post to the configured Discord webhook
    pub fn send_discord(&self, message: &str) -> Result<(), ConnectorError> {
        let url = self
            .config
            .discord_url
            .as_ref()
            .ok_or(ConnectorError::MissingCredentials("discord"))?;

        let json = serde_json::to_string(&discord_body(message))?;

        self.execute_with_retry("discord", &[200, 204], json.len(), || {
            self.agent
                .post(url)
                .set("Content-Type", "application/json")
                .send_string(&json)
        })
    }

    /// Whether alerts are paused after a delivery that reached no service
    pub fn is_suspended(&self) -> bool {
        self.suspended_until.map_or(false, |until| Instant::now() < until)
    }

    /// Send `alert` on every configured service; returns how many accepted it
    pub fn broadcast_alert(&self, alert: &AlertPayload) -> usize {
        let message = alert.message();
        let results = [
            ("pushover", self.send_pushover(ALERT_TITLE, &message, alert.priority())),
            ("telegram", self.send_telegram(&message)),
            ("discord", self.send_discord(&message)),
        ];

        let mut accepted = 0;
        for (service, result) in results {
            match result {
                Ok(()) => accepted += 1,
                Err(ConnectorError::MissingCredentials(_)) => {}
                Err(err) => log::warn!("{} notification failed: {}", service, err),
            }
        }
        accepted
    }

    /// Execute a request with retry logic
    fn execute_with_retry<F>(
        &self,
        service: &str,
        accepted: &[u16],
        bytes: usize,
        send: F,
    ) -> Result<(), ConnectorError>
    where
        F: Fn() -> Result<ureq::Response, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff
                thread::sleep(self.config.backoff * (1 << attempt.min(16)));
            }

            match send() {
                Ok(resp) if accepted.contains(&resp.status()) => {
                    if let Ok(mut stats) = self.stats.lock() {
                        stats.record_sent(bytes);
                    }
                    log::debug!("{} accepted notification", service);
                    return Ok(());
                }
                Ok(resp) => {
                    // Unexpected success code, the service did not take the message
                    last_error = Some(ConnectorError::HttpStatus { status: resp.status() });
                    break;
                }
                Err(ureq::Error::Status(code, _)) => {
                    last_error = Some(ConnectorError::HttpStatus { status: code });
                    if code >= 500 || code == 429 {
                        // Server error or rate limit - retry
                        continue;
                    }
                    break;
                }
                Err(ureq::Error::Transport(e)) => {
                    // Network error - retry
                    last_error = Some(ConnectorError::Transport(e.to_string()));
                }
            }
        }

        let err = last_error.unwrap_or_else(|| ConnectorError::Transport("no attempt made".into()));
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_failure(&err);
        }
        Err(err)
    }
}

impl AlertSink for WebhookNotifier {
    fn channel(&self) -> AlertChannel {
        AlertChannel::Webhook
    }

    fn is_available(&self) -> bool {
        self.config.has_services() && !self.is_suspended()
    }

    fn send_alert(&mut self, alert: &AlertPayload) -> Result<(), ConnectorError> {
        if !self.config.has_services() {
            return Err(ConnectorError::MissingCredentials("webhook"));
        }
        match self.broadcast_alert(alert) {
            0 => {
                log::warn!("No webhook accepted the alert, pausing for {:?}", self.config.cooldown);
                self.suspended_until = Some(Instant::now() + self.config.cooldown);
                Err(ConnectorError::Transport("no service accepted the alert".into()))
            }
            _ => {
                self.suspended_until = None;
                Ok(())
            }
        }
    }

    fn send_status(&mut self, _status: &StatusPayload) -> Result<(), ConnectorError> {
        // Statuses are for dashboards, not for people's phones
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = WebhookConfig::new()
            .pushover("tok", "usr")
            .telegram("bot", "chat")
            .discord("https://discord.com/api/webhooks/1/x")
            .timeout_secs(3)
            .max_retries(0);

        assert!(config.has_services());
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.cooldown, Duration::from_secs(30));
        assert_eq!(config.pushover.unwrap().user, "usr");
        assert!(config.user_agent.starts_with("QuakeGuard/"));
    }

    #[test]
    fn empty_credentials_leave_service_disabled() {
        let config = WebhookConfig::new().pushover("", "usr").telegram("bot", "").discord("");
        assert!(config.pushover.is_none());
        assert!(config.telegram.is_none());
        assert!(config.discord_url.is_none());
        assert!(!config.has_services());
    }

    #[test]
    fn url_validation() {
        assert!(WebhookNotifier::new(WebhookConfig::new().discord("ftp://example.com")).is_err());
        assert!(WebhookNotifier::new(WebhookConfig::new().telegram_api("api.telegram.org")).is_err());
        assert!(WebhookNotifier::new(WebhookConfig::new().discord("https://example.com/hook")).is_ok());
    }

    #[test]
    fn unconfigured_services_are_skipped_without_network() {
        let notifier = WebhookNotifier::new(WebhookConfig::new()).unwrap();

        assert!(matches!(
            notifier.send_pushover("t", "m", 1),
            Err(ConnectorError::MissingCredentials("pushover"))
        ));
        assert!(matches!(
            notifier.send_telegram("m"),
            Err(ConnectorError::MissingCredentials("telegram"))
        ));
        assert!(matches!(
            notifier.send_discord("m"),
            Err(ConnectorError::MissingCredentials("discord"))
        ));
        assert!(!notifier.is_available());
        assert_eq!(notifier.stats().messages_failed, 0);
    }

    #[test]
    fn request_bodies() {
        let creds = PushoverCredentials {
            token: "tok".into(),
            user: "usr".into(),
        };
        let form = pushover_form(&creds, "Earthquake Alert", "shaking", "2");
        assert!(form.contains(&("priority", "2")));
        assert!(form.contains(&("sound", "siren")));

        let telegram = telegram_body(
            &TelegramCredentials {
                bot_token: "bot".into(),
                chat_id: "-100".into(),
            },
            "*shaking*",
        );
        assert_eq!(telegram["chat_id"], "-100");
        assert_eq!(telegram["parse_mode"], "Markdown");

        let discord = discord_body("shaking");
        assert_eq!(discord["username"], "Earthquake Alert Bot");
        assert_eq!(discord["embeds"][0]["color"], 16_711_680);
        assert_eq!(discord["embeds"][0]["description"], "shaking");
    }
}
