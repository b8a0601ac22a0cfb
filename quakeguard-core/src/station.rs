//! Station loop driver
//!
//! Ties the pieces together for one device. Everything that used to be
//! global loop state (device id, last alert level, timers) lives in an
//! explicit [`StationContext`], so the core types stay free of it.
//!
//! One call to [`Station::tick`] does, in order:
//!
//! ```text
//! 1. remote commands      reset → detector reset, status → "alive"
//! 2. sampling             when the sample period has elapsed and the source has data:
//!                         read ─► bandpass ─► smoother ─► detector
//! 3. local indication     whenever the alert level changes during an episode
//! 4. confirmed event      indicate locally; broadcast if online, queue if offline or
//!                         the broadcast failed; reset the detector
//! 5. queue drain          when online, unsent entries exist and the retry pause since
//!                         the last incomplete drain has passed; drop sent entries
//! 6. status               "online" once when a channel first comes up,
//!                         "monitoring" every status interval while online
//! ```
//!
//! A tick never blocks on its own; the dispatcher's network calls bound how
//! long it takes. A drain that leaves entries unsent is not retried until
//! `drain_retry_interval_ms` later, so a dead link costs one delivery
//! attempt per interval instead of one per tick.

use crate::config::StationConfig;
use crate::delivery::{AlertDispatcher, RemoteCommand};
use crate::detector::{DetectorUpdate, TriggerDetector};
use crate::errors::{ConfigResult, QueueResult};
use crate::event::{AccelSample, AlertLevel, DeviceId, EarthquakeEvent};
use crate::filters::ConditioningChain;
use crate::queue::{EventQueue, QueueStorage};
use crate::sensor::AccelerometerSource;
use crate::time::{elapsed_ms, Timestamp};

/// Per-device loop state
#[derive(Debug, Clone)]
pub struct StationContext {
    /// Identifier attached to every event and status
    pub device_id: DeviceId,
    /// Level last shown on the local indicator
    pub last_alert_level: AlertLevel,
    /// Time of the last consumed sample slot
    pub last_sample_at: Option<Timestamp>,
    /// Time of the last periodic status
    pub last_status_at: Timestamp,
    /// Whether the one-off "online" status has gone out
    pub online_announced: bool,
    /// Earliest time for the next drain after an incomplete one
    pub next_drain_at: Option<Timestamp>,
}

impl StationContext {
    /// Fresh context for `device_id`
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            last_alert_level: AlertLevel::Negligible,
            last_sample_at: None,
            last_status_at: 0,
            online_announced: false,
            next_drain_at: None,
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Remote command handled this tick
    pub command: Option<RemoteCommand>,
    /// Detector outcome, if a sample was taken
    pub update: Option<DetectorUpdate>,
    /// The sample slot was due but the source had no data
    pub sample_pending: bool,
    /// The source reported a fault
    pub sensor_fault: bool,
    /// Local indicator was driven
    pub indicated: bool,
    /// Confirmed event accepted by a remote channel
    pub broadcast: bool,
    /// Confirmed event put on the durable queue
    pub enqueued: bool,
    /// At least one queued event was delivered
    pub drained: bool,
    /// A status message went out
    pub status_sent: bool,
}

impl TickReport {
    /// Confirmed event produced this tick
    pub fn confirmed(&self) -> Option<&EarthquakeEvent> {
        match &self.update {
            Some(DetectorUpdate::Confirmed(event)) => Some(event),
            _ => None,
        }
    }
}

/// One seismic station: source, conditioning, detector, queue, alert channels
pub struct Station<S, D, Q>
where
    S: AccelerometerSource,
    D: AlertDispatcher,
    Q: QueueStorage,
{
    config: StationConfig,
    sample_period_ms: u64,
    source: S,
    dispatcher: D,
    chain: ConditioningChain,
    detector: TriggerDetector,
    queue: EventQueue<Q>,
    context: StationContext,
}

impl<S, D, Q> Station<S, D, Q>
where
    S: AccelerometerSource,
    D: AlertDispatcher,
    Q: QueueStorage,
{
    /// Assemble a station; rejects configurations the algorithms cannot run with
    ///
    /// The queue starts empty. Call [`Station::restore_queue`] to reload
    /// events persisted before a reboot.
    pub fn new(
        config: StationConfig,
        source: S,
        dispatcher: D,
        storage: Q,
        device_id: DeviceId,
    ) -> ConfigResult<Self> {
        config.validate()?;

        let chain = ConditioningChain::new(
            config.detector.sample_rate_hz as f32,
            &config.filter,
            &config.smoother,
        )
        .with_gravity_reference();

        Ok(Self {
            sample_period_ms: config.sample_period_ms(),
            source,
            dispatcher,
            chain,
            detector: TriggerDetector::new(config.detector),
            queue: EventQueue::with_config(storage, &config.queue),
            context: StationContext::new(device_id),
            config,
        })
    }

    /// Reload persisted events
    pub fn restore_queue(&mut self) -> QueueResult<usize> {
        self.queue.load()
    }

    /// Run one pass of the loop at time `now`
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        let mut report = TickReport::default();

        self.handle_commands(&mut report);
        self.sample(now, &mut report);

        if let Some(update) = report.update {
            self.handle_update(update, &mut report);
        }

        let online = self.dispatcher.is_online();
        if online && self.queue.unsent_count() > 0 && self.drain_due(now) {
            self.drain_queue(now, &mut report);
        }

        self.report_status(now, online, &mut report);
        report
    }

    fn drain_due(&self, now: Timestamp) -> bool {
        self.context.next_drain_at.map_or(true, |at| now >= at)
    }

    fn drain_queue(&mut self, now: Timestamp, report: &mut TickReport) {
        report.drained = self.queue.process_queue(&mut self.dispatcher);
        if report.drained {
            if let Err(_err) = self.queue.clear_sent_events() {
                log_warn!("Failed to persist queue after drain: {}", _err);
            }
        }

        let unsent = self.queue.unsent_count();
        if unsent == 0 {
            self.context.next_drain_at = None;
        } else {
            let retry_in = self.config.drain_retry_interval_ms;
            self.context.next_drain_at = Some(now.saturating_add(retry_in));
            log_debug!("{} events still queued, next drain in {} ms", unsent, retry_in);
        }
    }

    fn handle_commands(&mut self, report: &mut TickReport) {
        while let Some(command) = self.dispatcher.poll_command() {
            log_info!("Remote command: {}", command.as_str());
            match command {
                RemoteCommand::Reset => {
                    self.detector.reset();
                    self.context.last_alert_level = AlertLevel::Negligible;
                }
                RemoteCommand::Status => {
                    self.dispatcher.status("alive", self.context.device_id.as_str());
                    report.status_sent = true;
                }
            }
            report.command = Some(command);
        }
    }

    fn sample(&mut self, now: Timestamp, report: &mut TickReport) {
        let due = match self.context.last_sample_at {
            Some(last) => elapsed_ms(last, now) >= self.sample_period_ms,
            None => true,
        };
        if !due {
            return;
        }

        match self.source.read() {
            Ok(raw) => {
                self.context.last_sample_at = Some(now);
                let conditioned = self.chain.process(raw);
                report.update = Some(self.detector.add_sample(AccelSample::at(conditioned, now)));
            }
            Err(nb::Error::WouldBlock) => report.sample_pending = true,
            Err(nb::Error::Other(_err)) => {
                // Skip this slot rather than retry a faulting bus every tick
                self.context.last_sample_at = Some(now);
                report.sensor_fault = true;
                log_warn!("Accelerometer read failed: {:?}", _err);
            }
        }
    }

    fn handle_update(&mut self, update: DetectorUpdate, report: &mut TickReport) {
        match update {
            DetectorUpdate::Triggered(event) | DetectorUpdate::Shaking(event) => {
                if event.alert_level != self.context.last_alert_level {
                    self.context.last_alert_level = event.alert_level;
                    self.dispatcher.indicate(&event);
                    report.indicated = true;
                    log_info!(
                        "Alert level {}, PGA {:.4} g, STA/LTA {:.2}",
                        event.alert_level,
                        event.pga,
                        self.detector.sta_lta_ratio()
                    );
                }
            }
            DetectorUpdate::Confirmed(event) => {
                self.dispatcher.indicate(&event);
                report.indicated = true;
                self.dispatch_confirmed(&event, report);
                self.detector.reset();
                self.context.last_alert_level = AlertLevel::Negligible;
            }
            DetectorUpdate::Discarded(_) => {
                if self.context.last_alert_level != AlertLevel::Negligible {
                    self.dispatcher.indicate(&EarthquakeEvent::default());
                    report.indicated = true;
                }
                self.context.last_alert_level = AlertLevel::Negligible;
            }
            DetectorUpdate::Buffering | DetectorUpdate::Quiet => {}
        }
    }

    fn dispatch_confirmed(&mut self, event: &EarthquakeEvent, report: &mut TickReport) {
        let device_id = self.context.device_id.as_str();

        if self.dispatcher.is_online() {
            report.broadcast = self.dispatcher.broadcast(event, device_id);
        }

        if !report.broadcast {
            log_info!("Event not delivered, queueing for retry");
            if let Err(_err) = self.queue.add_event(*event, &self.context.device_id) {
                log_warn!("Event queued in memory only: {}", _err);
            }
            report.enqueued = true;
        }
    }

    fn report_status(&mut self, now: Timestamp, online: bool, report: &mut TickReport) {
        let device_id = self.context.device_id.as_str();

        if online && !self.context.online_announced {
            self.dispatcher.status("online", device_id);
            self.context.online_announced = true;
            report.status_sent = true;
        }

        if elapsed_ms(self.context.last_status_at, now) >= self.config.status_interval_ms {
            self.context.last_status_at = now;
            log_info!(
                "Status: STA/LTA {:.2}, PGA {:.6} g, {} unsent",
                self.detector.sta_lta_ratio(),
                self.detector.current_pga(),
                self.queue.unsent_count()
            );
            if online {
                self.dispatcher.status("monitoring", device_id);
                report.status_sent = true;
            }
        }
    }

    /// Loop state
    pub fn context(&self) -> &StationContext {
        &self.context
    }

    /// Active configuration
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Trigger detector
    pub fn detector(&self) -> &TriggerDetector {
        &self.detector
    }

    /// Durable queue
    pub fn queue(&self) -> &EventQueue<Q> {
        &self.queue
    }

    /// Alert channels
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Alert channels, mutably
    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    /// Accelerometer, mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::EventDelivery;
    use crate::event::AccelReading;
    use crate::constants::DRAIN_RETRY_INTERVAL_MS;
    use crate::queue::MemoryStorage;
    use alloc::string::{String, ToString};
    use alloc::{vec, vec::Vec};

    #[derive(Default)]
    struct Recorder {
        online: bool,
        reject: bool,
        deliveries: usize,
        statuses: Vec<String>,
        commands: Vec<RemoteCommand>,
    }

    impl EventDelivery for Recorder {
        fn deliver(&mut self, _event: &EarthquakeEvent, _device_id: &str) -> bool {
            self.deliveries += 1;
            self.online && !self.reject
        }
    }

    impl AlertDispatcher for Recorder {
        fn is_online(&self) -> bool {
            self.online
        }

        fn broadcast(&mut self, _event: &EarthquakeEvent, _device_id: &str) -> bool {
            self.online
        }

        fn indicate(&mut self, _event: &EarthquakeEvent) {}

        fn status(&mut self, status: &str, _device_id: &str) {
            self.statuses.push(status.to_string());
        }

        fn poll_command(&mut self) -> Option<RemoteCommand> {
            self.commands.pop()
        }
    }

    struct Steady;

    impl AccelerometerSource for Steady {
        type Error = ();

        fn read(&mut self) -> nb::Result<AccelReading, ()> {
            Ok(AccelReading::new(0.0, 0.0, 9.81))
        }
    }

    struct NotReady;

    impl AccelerometerSource for NotReady {
        type Error = ();

        fn read(&mut self) -> nb::Result<AccelReading, ()> {
            Err(nb::Error::WouldBlock)
        }
    }

    fn station<S: AccelerometerSource>(source: S, online: bool) -> Station<S, Recorder, MemoryStorage> {
        let dispatcher = Recorder {
            online,
            ..Recorder::default()
        };
        Station::new(
            StationConfig::default(),
            source,
            dispatcher,
            MemoryStorage::new(),
            DeviceId::new("ESP32_UNIT").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn samples_once_per_period() {
        let mut station = station(Steady, false);
        assert!(station.tick(0).update.is_some());
        assert!(station.tick(5).update.is_none());
        assert!(station.tick(10).update.is_some());
        assert_eq!(station.detector().window_len(), 2);
    }

    #[test]
    fn pending_data_does_not_consume_slot() {
        let mut station = station(NotReady, false);
        let report = station.tick(0);
        assert!(report.sample_pending);
        assert!(report.update.is_none());
        assert!(station.context().last_sample_at.is_none());
    }

    #[test]
    fn announces_online_once_then_periodically() {
        let mut station = station(Steady, true);
        station.tick(0);
        station.tick(10);
        assert_eq!(station.dispatcher().statuses, vec!["online".to_string()]);

        station.tick(60_000);
        assert_eq!(station.dispatcher().statuses.last().map(String::as_str), Some("monitoring"));
    }

    #[test]
    fn status_command_replies_alive() {
        let mut station = station(Steady, false);
        station.dispatcher_mut().commands.push(RemoteCommand::Status);
        let report = station.tick(0);
        assert_eq!(report.command, Some(RemoteCommand::Status));
        assert_eq!(station.dispatcher().statuses, vec!["alive".to_string()]);
    }

    /// Online station whose storage already holds one unsent event
    fn station_with_backlog(
        config: StationConfig,
        dispatcher: Recorder,
    ) -> Station<Steady, Recorder, MemoryStorage> {
        let device = DeviceId::new("ESP32_UNIT").unwrap();
        let mut backlog = EventQueue::new(MemoryStorage::new(), 10);
        backlog.add_event(EarthquakeEvent::default(), &device).unwrap();
        let record = backlog.storage().contents().unwrap().to_vec();

        let mut station = Station::new(
            config,
            Steady,
            dispatcher,
            MemoryStorage::with_contents(&record),
            device,
        )
        .unwrap();
        assert_eq!(station.restore_queue(), Ok(1));
        station
    }

    #[test]
    fn failed_drain_waits_for_retry_interval() {
        let mut station = station_with_backlog(StationConfig::default(), Recorder {
            online: true,
            reject: true,
            ..Recorder::default()
        });

        // One second of ticks at the sample rate
        for n in 0..100 {
            assert!(!station.tick(n * 10).drained);
        }
        assert_eq!(station.dispatcher().deliveries, 1);
        assert_eq!(station.context().next_drain_at, Some(DRAIN_RETRY_INTERVAL_MS));

        station.tick(DRAIN_RETRY_INTERVAL_MS);
        assert_eq!(station.dispatcher().deliveries, 2);
        assert_eq!(station.queue().unsent_count(), 1);

        station.dispatcher_mut().reject = false;
        assert!(station.tick(2 * DRAIN_RETRY_INTERVAL_MS).drained);
        assert!(station.queue().is_empty());
        assert_eq!(station.context().next_drain_at, None);
    }

    #[test]
    fn failed_drain_leaves_storage_alone() {
        let config = StationConfig::default().with_drain_retry_interval_ms(0);
        let mut station = station_with_backlog(config, Recorder {
            online: true,
            reject: true,
            ..Recorder::default()
        });
        let writes = station.queue().storage().write_count();

        for n in 0..100 {
            station.tick(n * 10);
        }
        // Every tick retried, none of them rewrote the record
        assert_eq!(station.dispatcher().deliveries, 100);
        assert_eq!(station.queue().storage().write_count(), writes);

        station.dispatcher_mut().reject = false;
        assert!(station.tick(1_000).drained);
        // Marked sent, then cleared
        assert_eq!(station.queue().storage().write_count(), writes + 2);
    }

    #[test]
    fn invalid_config_rejected() {
        let result = Station::new(
            StationConfig::default().with_queue_capacity(0),
            Steady,
            Recorder::default(),
            MemoryStorage::new(),
            DeviceId::new("ESP32_UNIT").unwrap(),
        );
        assert!(result.is_err());
    }
}
