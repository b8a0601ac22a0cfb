//! Shared fixtures for integration tests
//!
//! - Synthetic ground motion: a 5 Hz vertical sinusoid on top of gravity
//!   whose amplitude follows a piecewise envelope
//! - Scripted delivery and dispatcher doubles

#![allow(dead_code)]

use std::collections::VecDeque;
use std::f32::consts::PI;

use quakeguard_core::{
    AccelReading, AccelSample, AlertDispatcher, AlertLevel, DetectorConfig, EarthquakeEvent,
    EventDelivery, RemoteCommand,
};

pub const GRAVITY: f32 = 9.81;

/// Background noise amplitude (m/s²); keeps the LTA above its noise floor
pub const QUIET: f32 = 0.05;

/// Roughly 0.1 g peak: STRONG
pub const STRONG: f32 = 1.0;

/// Detector tuned for short tests: 100 Hz, STA 0.5 s, LTA 5 s, 2 s minimum
pub fn fast_config() -> DetectorConfig {
    DetectorConfig::default()
        .with_windows(100, 0.5, 5.0)
        .with_thresholds(4.0, 1.5)
        .with_min_event_duration(2.0)
}

/// Amplitude segment: `samples` long at `amplitude`
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub samples: usize,
    pub amplitude: f32,
}

pub fn segment(seconds: f32, amplitude: f32, rate_hz: u32) -> Segment {
    Segment {
        samples: (seconds * rate_hz as f32) as usize,
        amplitude,
    }
}

/// Deterministic shaking generator
pub struct ShakeGenerator {
    rate_hz: u32,
    frequency_hz: f32,
    n: usize,
    start_ms: u64,
}

impl ShakeGenerator {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            frequency_hz: 5.0,
            n: 0,
            start_ms: 0,
        }
    }

    /// Shaking frequency; the default 5 Hz sits outside the conditioning
    /// band, 1 Hz sits at its center
    pub fn with_frequency(mut self, frequency_hz: f32) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    pub fn starting_at(mut self, start_ms: u64) -> Self {
        self.start_ms = start_ms;
        self
    }

    pub fn period_ms(&self) -> u64 {
        1000 / self.rate_hz as u64
    }

    /// Next raw reading at `amplitude`
    pub fn reading(&mut self, amplitude: f32) -> AccelReading {
        let t = self.n as f32 / self.rate_hz as f32;
        self.n += 1;
        AccelReading::new(0.0, 0.0, GRAVITY + amplitude * (2.0 * PI * self.frequency_hz * t).sin())
    }

    /// Next timestamped sample at `amplitude`
    pub fn sample(&mut self, amplitude: f32) -> AccelSample {
        let timestamp = self.start_ms + self.n as u64 * self.period_ms();
        AccelSample::at(self.reading(amplitude), timestamp)
    }

    /// Samples for a whole envelope
    pub fn samples(&mut self, envelope: &[Segment]) -> Vec<AccelSample> {
        envelope
            .iter()
            .flat_map(|seg| std::iter::repeat(seg.amplitude).take(seg.samples))
            .map(|amplitude| self.sample(amplitude))
            .collect()
    }

    /// Raw readings for a whole envelope
    pub fn readings(&mut self, envelope: &[Segment]) -> Vec<AccelReading> {
        envelope
            .iter()
            .flat_map(|seg| std::iter::repeat(seg.amplitude).take(seg.samples))
            .map(|amplitude| self.reading(amplitude))
            .collect()
    }
}

pub fn event_at(start_time: u64) -> EarthquakeEvent {
    EarthquakeEvent {
        magnitude: 2.4,
        pga: 0.06,
        cav: 0.12,
        duration: 3_000,
        alert_level: AlertLevel::Moderate,
        confirmed: true,
        ..EarthquakeEvent::started_at(start_time)
    }
}

/// Delivery double answering from a script; `true` once the script runs out
pub struct ScriptedDelivery {
    script: VecDeque<bool>,
    pub attempts: Vec<u64>,
}

impl ScriptedDelivery {
    pub fn new(script: &[bool]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            attempts: Vec::new(),
        }
    }

    /// Fails on the `n`th attempt (1-based), succeeds otherwise
    pub fn failing_on(n: usize) -> Self {
        let script: Vec<bool> = (1..=n).map(|i| i != n).collect();
        Self::new(&script)
    }
}

impl EventDelivery for ScriptedDelivery {
    fn deliver(&mut self, event: &EarthquakeEvent, _device_id: &str) -> bool {
        self.attempts.push(event.start_time);
        self.script.pop_front().unwrap_or(true)
    }
}

/// Dispatcher double that records everything it is asked to do
#[derive(Default)]
pub struct RecordingDispatcher {
    pub online: bool,
    pub accept_broadcasts: bool,
    pub broadcasts: Vec<EarthquakeEvent>,
    pub delivered: Vec<EarthquakeEvent>,
    pub indicated: Vec<AlertLevel>,
    pub statuses: Vec<String>,
    pub commands: VecDeque<RemoteCommand>,
}

impl RecordingDispatcher {
    pub fn online() -> Self {
        Self {
            online: true,
            accept_broadcasts: true,
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }
}

impl EventDelivery for RecordingDispatcher {
    fn deliver(&mut self, event: &EarthquakeEvent, _device_id: &str) -> bool {
        if self.online {
            self.delivered.push(*event);
        }
        self.online
    }
}

impl AlertDispatcher for RecordingDispatcher {
    fn is_online(&self) -> bool {
        self.online
    }

    fn broadcast(&mut self, event: &EarthquakeEvent, _device_id: &str) -> bool {
        if self.online && self.accept_broadcasts {
            self.broadcasts.push(*event);
            true
        } else {
            false
        }
    }

    fn indicate(&mut self, event: &EarthquakeEvent) {
        self.indicated.push(event.alert_level);
    }

    fn status(&mut self, status: &str, _device_id: &str) {
        self.statuses.push(status.to_string());
    }

    fn poll_command(&mut self) -> Option<RemoteCommand> {
        self.commands.pop_front()
    }
}
