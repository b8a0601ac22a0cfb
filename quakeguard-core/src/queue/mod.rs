//! Durable Store-and-Forward Event Queue
//!
//! ## Overview
//!
//! Confirmed events that cannot be delivered right away wait here until a
//! remote channel is reachable again. The queue is the only thing between a
//! detected event and its loss during an outage, so every mutation is
//! written through to stable storage before the call returns.
//!
//! ## Retention
//!
//! At most `capacity` entries (100 by default). On overflow the oldest entry
//! is evicted whatever its delivery state:
//!
//! ```text
//! capacity 3, add E4:
//!   [E1 ✓] [E2 ✗] [E3 ✗]  ──►  [E2 ✗] [E3 ✗] [E4 ✗]
//! ```
//!
//! ## Delivery Order
//!
//! `process_queue` walks entries oldest first and stops at the first
//! delivery failure, so entry N+1 is never attempted before entry N has
//! succeeded. Delivery is at-least-once: a crash after delivery but before
//! the persist means the entry is sent again after reboot.
//!
//! ## Record Format
//!
//! ```json
//! {"events": [
//!   {"deviceId": "ESP32_246F28A1B2C3", "sent": false,
//!    "event": {"magnitude": 4.2, "pga": 0.12, "pgv": 0.0, "cav": 0.3,
//!              "startTime": 1000, "duration": 4500,
//!              "alertLevel": "STRONG", "confirmed": true}}
//! ]}
//! ```
//!
//! ## Failure Handling
//!
//! Storage failures never touch the in-memory queue: the event is queued and
//! delivery keeps working, it just would not survive a reboot. A malformed
//! record on `load` leaves the queue as it was (empty at boot) instead of
//! partially populated.

pub mod storage;

pub use storage::{MemoryStorage, QueueStorage};
#[cfg(feature = "std")]
pub use storage::FileStorage;

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::config::QueueConfig;
use crate::delivery::EventDelivery;
use crate::errors::{QueueError, QueueResult};
use crate::event::{DeviceId, EarthquakeEvent};

/// One queued event with its delivery state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedEvent {
    /// Event as confirmed by the detector
    pub event: EarthquakeEvent,
    /// Station that detected it
    pub device_id: DeviceId,
    /// Set once delivered; never cleared
    pub sent: bool,
}

impl QueuedEvent {
    /// New unsent entry
    pub fn new(event: EarthquakeEvent, device_id: DeviceId) -> Self {
        Self {
            event,
            device_id,
            sent: false,
        }
    }
}

#[derive(Serialize)]
struct RecordRef<'a> {
    events: &'a VecDeque<QueuedEvent>,
}

#[derive(Deserialize)]
struct Record {
    events: Vec<QueuedEvent>,
}

/// Queue counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Entries added
    pub enqueued: u32,
    /// Entries dropped by the capacity bound
    pub evicted: u32,
    /// Entries marked sent
    pub delivered: u32,
    /// Writes that did not reach storage
    pub persist_failures: u32,
}

/// Bounded, write-through event queue
#[derive(Debug)]
pub struct EventQueue<S: QueueStorage> {
    entries: VecDeque<QueuedEvent>,
    capacity: usize,
    storage: S,
    stats: QueueStats,
}

impl<S: QueueStorage> EventQueue<S> {
    /// Empty queue over `storage`; call [`EventQueue::load`] to restore
    ///
    /// A capacity of zero is raised to one.
    pub fn new(storage: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            storage,
            stats: QueueStats::default(),
        }
    }

    /// Empty queue sized from configuration
    pub fn with_config(storage: S, config: &QueueConfig) -> Self {
        Self::new(storage, config.capacity)
    }

    /// Rebuild the in-memory queue from storage
    ///
    /// Returns the number of entries restored. A missing record is an empty
    /// queue. On a read failure or a malformed record the queue is left
    /// untouched. If the record holds more than `capacity` entries only the
    /// newest are kept.
    pub fn load(&mut self) -> QueueResult<usize> {
        let bytes = match self.storage.load() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log_info!("No persisted queue, starting empty");
                return Ok(0);
            }
            Err(err) => {
                log_warn!("Failed to read queue record: {}", err);
                return Err(err.into());
            }
        };

        let record: Record = serde_json::from_slice(&bytes).map_err(|_| {
            log_warn!("Persisted queue record is malformed, ignoring it");
            QueueError::Malformed
        })?;

        let mut entries: VecDeque<QueuedEvent> = record.events.into();
        while entries.len() > self.capacity {
            entries.pop_front();
        }

        self.entries = entries;
        log_info!("Restored {} queued events", self.entries.len());
        Ok(self.entries.len())
    }

    /// Append an unsent entry, evicting the oldest on overflow, then persist
    ///
    /// The entry is queued in memory even when the persist fails.
    pub fn add_event(&mut self, event: EarthquakeEvent, device_id: &DeviceId) -> QueueResult<()> {
        self.entries.push_back(QueuedEvent::new(event, device_id.clone()));
        self.stats.enqueued = self.stats.enqueued.saturating_add(1);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.stats.evicted = self.stats.evicted.saturating_add(1);
            log_warn!("Queue full, oldest event evicted");
        }

        self.persist()
    }

    /// Try to deliver unsent entries in order; stop at the first failure
    ///
    /// Returns whether any entry was delivered. Persists once at the end if
    /// anything changed; a failed persist is counted and logged.
    pub fn process_queue<D: EventDelivery + ?Sized>(&mut self, delivery: &mut D) -> bool {
        let mut processed = false;

        for entry in self.entries.iter_mut().filter(|e| !e.sent) {
            if !delivery.deliver(&entry.event, entry.device_id.as_str()) {
                log_debug!("Delivery failed, keeping remaining events queued");
                break;
            }
            entry.sent = true;
            processed = true;
            self.stats.delivered = self.stats.delivered.saturating_add(1);
        }

        if processed {
            // Already counted in persist()
            let _ = self.persist();
        }
        processed
    }

    /// Number of entries, sent or not
    pub fn queue_size(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries still awaiting delivery
    pub fn unsent_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.sent).count()
    }

    /// Whether the queue holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop delivered entries, keep the rest in order, persist
    pub fn clear_sent_events(&mut self) -> QueueResult<()> {
        self.entries.retain(|e| !e.sent);
        self.persist()
    }

    /// Drop every entry, persist
    pub fn clear_all(&mut self) -> QueueResult<()> {
        self.entries.clear();
        self.persist()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &QueuedEvent> + '_ {
        self.entries.iter()
    }

    /// Maximum retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Counters
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Backing storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Backing storage, mutably
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn persist(&mut self) -> QueueResult<()> {
        let record = serde_json::to_vec(&RecordRef { events: &self.entries }).map_err(|_| {
            self.stats.persist_failures = self.stats.persist_failures.saturating_add(1);
            QueueError::Encode
        })?;

        self.storage.store(&record).map_err(|err| {
            self.stats.persist_failures = self.stats.persist_failures.saturating_add(1);
            log_warn!("Queue persist failed: {}", err);
            QueueError::from(err)
        })
    }
}
