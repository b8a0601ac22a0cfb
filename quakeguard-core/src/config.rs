//! Detector, filter and queue configuration
//!
//! The core never parses files or environment variables. These structs are
//! filled in by whatever bootstraps the device (compiled-in defaults, a JSON
//! blob from flash, a provisioning message) and handed to constructors.
//!
//! Every struct implements `Default` with the values the device ships with
//! and deserializes with `#[serde(default)]`, so a partial document only
//! overrides what it names.
//!
//! ```rust
//! use quakeguard_core::config::{DetectorConfig, StationConfig};
//!
//! let config = StationConfig::default()
//!     .with_detector(DetectorConfig::default().with_thresholds(3.5, 1.2));
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{
    seismic::{
        ASSUMED_EPICENTRAL_DISTANCE_KM, PGA_THRESHOLD_LIGHT_G, PGA_THRESHOLD_MODERATE_G,
        PGA_THRESHOLD_SEVERE_G, PGA_THRESHOLD_STRONG_G, PGA_THRESHOLD_VIOLENT_G,
    },
    time::{
        DEFAULT_LTA_WINDOW_SEC, DEFAULT_MIN_EVENT_DURATION_SEC, DEFAULT_SAMPLE_RATE_HZ,
        DEFAULT_STA_WINDOW_SEC, DRAIN_RETRY_INTERVAL_MS, MS_PER_SECOND, PGA_WINDOW_SEC,
        STATUS_INTERVAL_MS,
    },
    buffers::MAX_QUEUE_SIZE,
};
use crate::errors::{ConfigError, ConfigResult};
use crate::event::AlertLevel;
use crate::time::sample_period_ms;

/// PGA thresholds (g) separating the six alert levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Lower bound of LIGHT
    pub light: f32,
    /// Lower bound of MODERATE
    pub moderate: f32,
    /// Lower bound of STRONG
    pub strong: f32,
    /// Lower bound of SEVERE
    pub severe: f32,
    /// Lower bound of EXTREME
    pub violent: f32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            light: PGA_THRESHOLD_LIGHT_G,
            moderate: PGA_THRESHOLD_MODERATE_G,
            strong: PGA_THRESHOLD_STRONG_G,
            severe: PGA_THRESHOLD_SEVERE_G,
            violent: PGA_THRESHOLD_VIOLENT_G,
        }
    }
}

impl AlertThresholds {
    /// Map a PGA (g) to its alert level; the highest matching threshold wins
    pub fn classify(&self, pga: f32) -> AlertLevel {
        if pga >= self.violent {
            AlertLevel::Extreme
        } else if pga >= self.severe {
            AlertLevel::Severe
        } else if pga >= self.strong {
            AlertLevel::Strong
        } else if pga >= self.moderate {
            AlertLevel::Moderate
        } else if pga >= self.light {
            AlertLevel::Light
        } else {
            AlertLevel::Negligible
        }
    }

    /// Thresholds must be positive and strictly ascending
    pub fn validate(&self) -> ConfigResult<()> {
        let ordered = self.light > 0.0
            && self.light < self.moderate
            && self.moderate < self.strong
            && self.strong < self.severe
            && self.severe < self.violent;
        if ordered {
            Ok(())
        } else {
            Err(ConfigError::UnorderedThresholds)
        }
    }
}

/// Bandpass conditioning filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Low band edge (Hz)
    pub low_cutoff_hz: f32,
    /// High band edge (Hz)
    pub high_cutoff_hz: f32,
    /// Nominal filter order
    pub order: u8,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            // Below 0.1 Hz is tilt and thermal drift
            low_cutoff_hz: 0.1,
            // Above 10 Hz is machinery and footsteps
            high_cutoff_hz: 10.0,
            order: 2,
        }
    }
}

impl FilterConfig {
    /// Set the band edges
    pub fn with_band(mut self, low_hz: f32, high_hz: f32) -> Self {
        self.low_cutoff_hz = low_hz;
        self.high_cutoff_hz = high_hz;
        self
    }

    /// Band must sit strictly inside (0, Nyquist)
    pub fn validate(&self, sample_rate_hz: u32) -> ConfigResult<()> {
        let nyquist_hz = sample_rate_hz as f32 / 2.0;
        let valid = self.low_cutoff_hz > 0.0
            && self.low_cutoff_hz < self.high_cutoff_hz
            && self.high_cutoff_hz < nyquist_hz;
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidBand {
                low_hz: self.low_cutoff_hz,
                high_hz: self.high_cutoff_hz,
                nyquist_hz,
            })
        }
    }
}

/// Scalar smoother noise variances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// Process noise variance (Q), higher = follows the signal faster
    pub process_noise: f32,
    /// Measurement noise variance (R), higher = smooths harder
    pub measurement_noise: f32,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 0.1,
        }
    }
}

impl SmootherConfig {
    /// Both variances must be positive
    pub fn validate(&self) -> ConfigResult<()> {
        if self.process_noise > 0.0 && self.measurement_noise > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidNoise)
        }
    }
}

/// STA/LTA trigger detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Accelerometer sampling rate (Hz)
    pub sample_rate_hz: u32,
    /// Short-term window (s)
    pub sta_window_sec: f32,
    /// Long-term window (s)
    pub lta_window_sec: f32,
    /// STA/LTA ratio that starts an episode
    pub trigger_threshold: f32,
    /// STA/LTA ratio that ends an episode
    pub detrigger_threshold: f32,
    /// Shortest episode that is confirmed as an event (s)
    pub min_event_duration_sec: f32,
    /// Distance used by the magnitude estimate (km)
    pub assumed_distance_km: f32,
    /// PGA alert bands
    pub alert_thresholds: AlertThresholds,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            sta_window_sec: DEFAULT_STA_WINDOW_SEC,
            lta_window_sec: DEFAULT_LTA_WINDOW_SEC,
            trigger_threshold: 4.0,
            detrigger_threshold: 1.5,
            min_event_duration_sec: DEFAULT_MIN_EVENT_DURATION_SEC,
            assumed_distance_km: ASSUMED_EPICENTRAL_DISTANCE_KM,
            alert_thresholds: AlertThresholds::default(),
        }
    }
}

impl DetectorConfig {
    /// Set sample rate and window lengths
    pub fn with_windows(mut self, sample_rate_hz: u32, sta_sec: f32, lta_sec: f32) -> Self {
        self.sample_rate_hz = sample_rate_hz;
        self.sta_window_sec = sta_sec;
        self.lta_window_sec = lta_sec;
        self
    }

    /// Set trigger and detrigger ratios
    pub fn with_thresholds(mut self, trigger: f32, detrigger: f32) -> Self {
        self.trigger_threshold = trigger;
        self.detrigger_threshold = detrigger;
        self
    }

    /// Set minimum confirmed event duration
    pub fn with_min_event_duration(mut self, secs: f32) -> Self {
        self.min_event_duration_sec = secs;
        self
    }

    /// Set PGA alert bands
    pub fn with_alert_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.alert_thresholds = thresholds;
        self
    }

    /// Short-term window length in samples
    pub fn sta_window_samples(&self) -> usize {
        (self.sta_window_sec * self.sample_rate_hz as f32) as usize
    }

    /// Long-term window length in samples
    pub fn lta_window_samples(&self) -> usize {
        (self.lta_window_sec * self.sample_rate_hz as f32) as usize
    }

    /// Rolling window capacity: LTA span plus the STA span it excludes
    pub fn window_capacity(&self) -> usize {
        self.lta_window_samples() + self.sta_window_samples()
    }

    /// Samples covered by the PGA look-back
    pub fn pga_window_samples(&self) -> usize {
        (PGA_WINDOW_SEC * self.sample_rate_hz) as usize
    }

    /// Minimum event duration in milliseconds
    pub fn min_event_duration_ms(&self) -> u64 {
        (self.min_event_duration_sec * MS_PER_SECOND as f32) as u64
    }

    /// Integration step for CAV (s)
    pub fn sample_interval_sec(&self) -> f32 {
        1.0 / self.sample_rate_hz as f32
    }

    /// Check everything the detector depends on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }

        let sta_samples = self.sta_window_samples();
        let lta_samples = self.lta_window_samples();
        if sta_samples == 0 || lta_samples <= sta_samples {
            return Err(ConfigError::InvalidWindow { sta_samples, lta_samples });
        }

        if !(self.detrigger_threshold < self.trigger_threshold) {
            return Err(ConfigError::NoHysteresis {
                trigger: self.trigger_threshold,
                detrigger: self.detrigger_threshold,
            });
        }

        if !(self.min_event_duration_sec >= 0.0) {
            return Err(ConfigError::InvalidDuration);
        }

        self.alert_thresholds.validate()
    }
}

/// Durable queue parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum retained entries
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_QUEUE_SIZE,
        }
    }
}

/// Everything the station loop needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Trigger detector
    pub detector: DetectorConfig,
    /// Per-axis bandpass
    pub filter: FilterConfig,
    /// Per-axis smoother
    pub smoother: SmootherConfig,
    /// Durable queue
    pub queue: QueueConfig,
    /// Status report interval (ms)
    pub status_interval_ms: u64,
    /// Pause after a drain that left entries unsent (ms)
    pub drain_retry_interval_ms: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            filter: FilterConfig::default(),
            smoother: SmootherConfig::default(),
            queue: QueueConfig::default(),
            status_interval_ms: STATUS_INTERVAL_MS,
            drain_retry_interval_ms: DRAIN_RETRY_INTERVAL_MS,
        }
    }
}

impl StationConfig {
    /// Replace detector parameters
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    /// Replace filter parameters
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Replace queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue.capacity = capacity;
        self
    }

    /// Replace the pause between failed queue drains
    pub fn with_drain_retry_interval_ms(mut self, interval_ms: u64) -> Self {
        self.drain_retry_interval_ms = interval_ms;
        self
    }

    /// Sampling period (ms)
    pub fn sample_period_ms(&self) -> u64 {
        sample_period_ms(self.detector.sample_rate_hz)
    }

    /// Validate all sections
    pub fn validate(&self) -> ConfigResult<()> {
        self.detector.validate()?;
        self.filter.validate(self.detector.sample_rate_hz)?;
        self.smoother.validate()?;
        if self.queue.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}
