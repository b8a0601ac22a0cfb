//! Constants for QuakeGuard Core
//!
//! Centralized numeric values used by the filters, the detector and the
//! queue. Each constant documents its unit and where the value comes from.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Seismic**: gravity, attenuation-relation calibration, alert thresholds
//! - **Time**: sampling defaults and loop intervals
//! - **Buffers**: queue and identifier bounds
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include the unit in the name (`_HZ`, `_SEC`, `_MS`, `_G`)
//! 3. Reference the source of a value where one exists

/// Physical constants, attenuation calibration and shaking thresholds.
pub mod seismic;

/// Sampling rates, window lengths and loop intervals.
pub mod time;

/// Queue and identifier bounds.
pub mod buffers;

// Re-export commonly used constants for convenience
pub use seismic::{
    STANDARD_GRAVITY_MS2, LTA_NOISE_FLOOR, ASSUMED_EPICENTRAL_DISTANCE_KM,
    PGA_THRESHOLD_LIGHT_G, PGA_THRESHOLD_MODERATE_G, PGA_THRESHOLD_STRONG_G,
    PGA_THRESHOLD_SEVERE_G, PGA_THRESHOLD_VIOLENT_G,
};

pub use time::{
    MS_PER_SECOND, DEFAULT_SAMPLE_RATE_HZ, DEFAULT_STA_WINDOW_SEC, DEFAULT_LTA_WINDOW_SEC,
    PGA_WINDOW_SEC, STATUS_INTERVAL_MS, DRAIN_RETRY_INTERVAL_MS,
};

pub use buffers::{MAX_QUEUE_SIZE, MAX_DEVICE_ID_LEN};
