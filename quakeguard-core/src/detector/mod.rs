//! STA/LTA Trigger Detector
//!
//! ## Overview
//!
//! Classic short-term/long-term average trigger, the standard first stage of
//! automatic earthquake detection. The detector owns a rolling window of
//! conditioned samples and a single in-progress event slot.
//!
//! ## State Machine
//!
//! ```text
//!                 ratio > trigger
//!        ┌──────┐ ─────────────────► ┌───────────┐
//!        │ IDLE │                    │ TRIGGERED │ ◄─┐ every sample:
//!        └──────┘ ◄───────────────── └───────────┘ ──┘ PGA = max(PGA, now)
//!                 ratio < detrigger                     CAV, alert level
//!
//!   on detrigger:  duration ≥ minimum ─► Confirmed(event)  (+ magnitude)
//!                  duration < minimum ─► Discarded(event)
//! ```
//!
//! The ratio test only runs once the window holds `lta_window_samples`
//! entries; before that every sample reports `Buffering`.
//!
//! Hysteresis between trigger and detrigger keeps the detector from
//! oscillating when the ratio hovers near a single threshold.
//!
//! ## Episodes
//!
//! Each trigger starts a fresh `EarthquakeEvent`. Nothing from a previous
//! episode (confirmed flag, duration, magnitude) carries over. The finished
//! event is returned by value from `add_sample`; the detector keeps its own
//! copy until the next trigger or `reset()`.
//!
//! ## Cost
//!
//! The window is allocated once. Each sample is O(window) for the LTA sum,
//! which at the default 100 Hz / 30 s is ~3 100 multiply-adds.

mod features;
mod window;

pub use features::{
    cumulative_absolute_velocity, instantaneous_magnitude, long_term_average,
    magnitude_estimate, peak_ground_acceleration, short_term_average, sta_lta_ratio,
};
pub use window::RollingWindow;

use crate::config::DetectorConfig;
use crate::errors::ConfigResult;
use crate::event::{AccelSample, AlertLevel, EarthquakeEvent};
use crate::time::Timestamp;

/// What a single sample did to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorUpdate {
    /// Window still filling; no ratio test yet
    Buffering,
    /// Idle, ratio below trigger
    Quiet,
    /// This sample started an episode
    Triggered(EarthquakeEvent),
    /// Episode in progress
    Shaking(EarthquakeEvent),
    /// Episode ended and lasted long enough
    Confirmed(EarthquakeEvent),
    /// Episode ended too early to count
    Discarded(EarthquakeEvent),
}

impl DetectorUpdate {
    /// Event attached to this update, if any
    pub fn event(&self) -> Option<&EarthquakeEvent> {
        match self {
            DetectorUpdate::Buffering | DetectorUpdate::Quiet => None,
            DetectorUpdate::Triggered(e)
            | DetectorUpdate::Shaking(e)
            | DetectorUpdate::Confirmed(e)
            | DetectorUpdate::Discarded(e) => Some(e),
        }
    }

    /// Whether the detector is in the triggered state after this update
    pub fn is_active(&self) -> bool {
        matches!(self, DetectorUpdate::Triggered(_) | DetectorUpdate::Shaking(_))
    }
}

/// STA/LTA detector with its rolling window and current event
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    config: DetectorConfig,
    window: RollingWindow,
    sta_samples: usize,
    lta_samples: usize,
    pga_samples: usize,
    min_duration_ms: u64,
    dt_sec: f32,
    triggered: bool,
    trigger_time: Option<Timestamp>,
    current_event: EarthquakeEvent,
}

impl TriggerDetector {
    /// Build a detector; window sizes are derived once from `config`
    ///
    /// Parameters are taken as given. Use [`TriggerDetector::try_new`] to
    /// reject configurations the detector cannot run with.
    pub fn new(config: DetectorConfig) -> Self {
        let sta_samples = config.sta_window_samples();
        let lta_samples = config.lta_window_samples();

        Self {
            window: RollingWindow::with_capacity(config.window_capacity()),
            sta_samples,
            lta_samples,
            pga_samples: config.pga_window_samples(),
            min_duration_ms: config.min_event_duration_ms(),
            dt_sec: config.sample_interval_sec(),
            triggered: false,
            trigger_time: None,
            current_event: EarthquakeEvent::default(),
            config,
        }
    }

    /// Validate `config`, then build
    pub fn try_new(config: DetectorConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Feed one conditioned sample
    pub fn add_sample(&mut self, sample: AccelSample) -> DetectorUpdate {
        self.window.push(sample);

        if self.window.len() < self.lta_samples {
            return DetectorUpdate::Buffering;
        }

        let ratio = self.sta_lta_ratio();
        let mut started = false;

        if !self.triggered && ratio > self.config.trigger_threshold {
            self.triggered = true;
            self.trigger_time = Some(sample.timestamp);
            self.current_event = EarthquakeEvent::started_at(sample.timestamp);
            started = true;
            log_info!("Trigger at {} ms, STA/LTA {:.2}", sample.timestamp, ratio);
        }

        if !self.triggered {
            return DetectorUpdate::Quiet;
        }

        let pga = self.calculate_pga();
        if pga > self.current_event.pga {
            self.current_event.pga = pga;
        }
        self.current_event.cav = self.calculate_cav();
        self.current_event.alert_level = self.determine_alert_level(self.current_event.pga);

        if started {
            return DetectorUpdate::Triggered(self.current_event);
        }

        if ratio >= self.config.detrigger_threshold {
            return DetectorUpdate::Shaking(self.current_event);
        }

        let trigger_time = self.trigger_time.unwrap_or(sample.timestamp);
        let duration = sample.timestamp.saturating_sub(trigger_time);
        self.triggered = false;
        self.trigger_time = None;

        if duration >= self.min_duration_ms {
            self.current_event.duration = duration;
            self.current_event.confirmed = true;
            self.current_event.magnitude = self.calculate_magnitude_estimate(self.current_event.pga);
            log_info!(
                "Event confirmed: {} PGA {:.3} g, M{:.1}, {} ms",
                self.current_event.alert_level,
                self.current_event.pga,
                self.current_event.magnitude,
                duration
            );
            DetectorUpdate::Confirmed(self.current_event)
        } else {
            log_debug!("Detrigger after {} ms, below minimum duration", duration);
            DetectorUpdate::Discarded(self.current_event)
        }
    }

    /// Whether an episode is in progress
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Time the current episode started
    pub fn trigger_time(&self) -> Option<Timestamp> {
        self.trigger_time
    }

    /// The in-progress (or most recently finished) event
    pub fn current_event(&self) -> &EarthquakeEvent {
        &self.current_event
    }

    /// Running PGA of the current event (g)
    pub fn current_pga(&self) -> f32 {
        self.current_event.pga
    }

    /// CAV of the current event (g·s)
    pub fn current_cav(&self) -> f32 {
        self.current_event.cav
    }

    /// Short-term average over the current window
    pub fn calculate_sta(&self) -> f32 {
        short_term_average(&self.window, self.sta_samples)
    }

    /// Long-term average over the current window
    pub fn calculate_lta(&self) -> f32 {
        long_term_average(&self.window, self.sta_samples, self.lta_samples)
    }

    /// Current STA/LTA ratio; 0 until `lta_window_samples` are buffered
    pub fn sta_lta_ratio(&self) -> f32 {
        if self.window.len() < self.lta_samples {
            return 0.0;
        }
        sta_lta_ratio(self.calculate_sta(), self.calculate_lta())
    }

    /// Peak ground acceleration over the last 3 s of samples (g)
    pub fn calculate_pga(&self) -> f32 {
        peak_ground_acceleration(&self.window, self.pga_samples)
    }

    /// Cumulative absolute velocity since the trigger (g·s); 0 when idle
    pub fn calculate_cav(&self) -> f32 {
        cumulative_absolute_velocity(&self.window, self.trigger_time, self.dt_sec)
    }

    /// Magnitude estimate for a PGA (g) at the configured distance
    pub fn calculate_magnitude_estimate(&self, pga: f32) -> f32 {
        magnitude_estimate(pga, self.config.assumed_distance_km)
    }

    /// Alert level for a PGA (g)
    pub fn determine_alert_level(&self, pga: f32) -> AlertLevel {
        self.config.alert_thresholds.classify(pga)
    }

    /// Clear the window, return to idle, drop the in-progress event
    pub fn reset(&mut self) {
        self.window.clear();
        self.triggered = false;
        self.trigger_time = None;
        self.current_event = EarthquakeEvent::default();
    }

    /// Buffered sample count
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Window capacity (`lta + sta` samples)
    pub fn window_capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Active configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
