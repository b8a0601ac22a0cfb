//! Time-Related Constants
//!
//! Sampling defaults, detector window lengths and loop intervals.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

// ===== SAMPLING =====

/// Default accelerometer sampling rate (Hz).
///
/// 100 Hz comfortably covers the 0.1-10 Hz band of strong ground motion
/// and matches the MPU6050 21 Hz digital low-pass setting.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 100;

// ===== DETECTOR WINDOWS =====

/// Short-term average window (seconds).
///
/// Source: classic STA/LTA practice (0.5-1 s for local events)
pub const DEFAULT_STA_WINDOW_SEC: f32 = 1.0;

/// Long-term average window (seconds).
///
/// Source: classic STA/LTA practice (30-60 s background estimate)
pub const DEFAULT_LTA_WINDOW_SEC: f32 = 30.0;

/// Look-back span for peak ground acceleration (seconds).
pub const PGA_WINDOW_SEC: u32 = 3;

/// Minimum episode length before an event is confirmed (seconds).
///
/// Shorter excursions are door slams, footsteps and trucks.
pub const DEFAULT_MIN_EVENT_DURATION_SEC: f32 = 2.0;

// ===== LOOP INTERVALS =====

/// Interval between periodic status reports (milliseconds).
pub const STATUS_INTERVAL_MS: u64 = 60_000;

/// Wait after an incomplete queue drain before offering the backlog again (milliseconds).
pub const DRAIN_RETRY_INTERVAL_MS: u64 = 5_000;
