//! Time management for the sampling loop
//!
//! Everything in the core runs on millisecond timestamps from a monotonic
//! counter. Sources:
//! - Monotonic counter since boot (sampling cadence, event timing)
//! - System clock (wall-clock timestamps in outgoing payloads)
//! - Fixed time (tests and replays)

/// Timestamp in milliseconds since device boot (or epoch for wall-clock sources)
pub type Timestamp = u64;

/// Millisecond clock driving the station loop
pub trait TimeSource {
    /// Current time in milliseconds
    fn now(&self) -> Timestamp;

    /// Whether timestamps count from the Unix epoch rather than from boot
    fn is_wall_clock(&self) -> bool;
}

/// Monotonic time source counting from construction
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Wall-clock source for payload timestamps
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing and offline replay
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Create a source frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Jump to an absolute time
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move forward by `ms` milliseconds
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Milliseconds between two timestamps, zero if the clock went backwards
pub fn elapsed_ms(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}

/// Sampling period in milliseconds for a rate in Hz
///
/// Integer division, matching a millisecond tick counter: 100 Hz → 10 ms,
/// 3 Hz → 333 ms. Never returns zero.
pub fn sample_period_ms(sample_rate_hz: u32) -> u64 {
    if sample_rate_hz == 0 {
        return 1;
    }
    (1000 / sample_rate_hz as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_only_moves_when_told() {
        let mut clock = FixedTime::new(10_000);
        assert_eq!(clock.now(), 10_000);

        clock.advance(250);
        assert_eq!(clock.now(), 10_250);
        clock.set(42);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn elapsed_saturates_on_backwards_clock() {
        assert_eq!(elapsed_ms(2000, 2500), 500);
        assert_eq!(elapsed_ms(2500, 2000), 0);
    }

    #[test]
    fn sample_period() {
        assert_eq!(sample_period_ms(100), 10);
        assert_eq!(sample_period_ms(3), 333);
        assert_eq!(sample_period_ms(5000), 1);
        assert_eq!(sample_period_ms(0), 1);
    }

    #[cfg(feature = "std")]
    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(!clock.is_wall_clock());
    }
}
