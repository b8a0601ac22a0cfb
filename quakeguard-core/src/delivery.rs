//! Delivery capabilities
//!
//! The core never talks to a network. It needs exactly one thing from the
//! outside world when draining the queue: "try to deliver this event, tell me
//! whether it worked". That is [`EventDelivery`].
//!
//! The station loop needs a little more (local indication, status reports,
//! remote commands), collected in [`AlertDispatcher`]. Concrete channels
//! (MQTT, webhooks, lamps and buzzers) live in `quakeguard-connectors`.
//!
//! ```rust
//! use quakeguard_core::{EarthquakeEvent, EventDelivery};
//!
//! let mut delivered = 0;
//! let mut count = |_: &EarthquakeEvent, _: &str| {
//!     delivered += 1;
//!     true
//! };
//! assert!(count.deliver(&EarthquakeEvent::default(), "ESP32_TEST"));
//! ```

use core::str::FromStr;

use crate::event::EarthquakeEvent;

/// A single-method "attempt delivery" capability
///
/// Returning `false` means "not delivered, retry later". It is not an error:
/// the queue simply stops draining for this cycle.
pub trait EventDelivery {
    /// Attempt to deliver one event on behalf of `device_id`
    fn deliver(&mut self, event: &EarthquakeEvent, device_id: &str) -> bool;
}

impl<F> EventDelivery for F
where
    F: FnMut(&EarthquakeEvent, &str) -> bool,
{
    fn deliver(&mut self, event: &EarthquakeEvent, device_id: &str) -> bool {
        self(event, device_id)
    }
}

/// Commands accepted from the remote command channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Reset the detector
    Reset,
    /// Reply with an "alive" status
    Status,
}

impl RemoteCommand {
    /// Wire name of the command
    pub const fn as_str(&self) -> &'static str {
        match self {
            RemoteCommand::Reset => "reset",
            RemoteCommand::Status => "status",
        }
    }
}

impl FromStr for RemoteCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "reset" => Ok(RemoteCommand::Reset),
            "status" => Ok(RemoteCommand::Status),
            _ => Err(()),
        }
    }
}

/// Everything the station loop asks of its alert channels
pub trait AlertDispatcher: EventDelivery {
    /// Whether any remote channel is currently reachable
    fn is_online(&self) -> bool;

    /// Send a confirmed event on every remote channel; `true` if any accepted it
    fn broadcast(&mut self, event: &EarthquakeEvent, device_id: &str) -> bool;

    /// Drive the local indicator (lamps, buzzer) for the event's alert level
    fn indicate(&mut self, event: &EarthquakeEvent);

    /// Publish a short status string
    fn status(&mut self, status: &str, device_id: &str);

    /// Next pending remote command, if any
    fn poll_command(&mut self) -> Option<RemoteCommand> {
        None
    }
}
