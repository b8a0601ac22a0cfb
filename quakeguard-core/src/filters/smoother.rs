//! Scalar Kalman smoother
//!
//! Single-state estimator for one acceleration axis. The state is modeled as
//! a random walk, so every update is:
//!
//! ```text
//! P⁻ = P + Q               predicted covariance
//! K  = P⁻ / (P⁻ + R)       gain
//! x  = x + K·(z − x)       estimate
//! P  = (1 − K)·P⁻          covariance
//! ```
//!
//! Q controls how fast the estimate follows real motion, R how much sensor
//! noise is suppressed. Starts (and resets) at x = 0, P = 1.

use crate::config::SmootherConfig;

const INITIAL_COVARIANCE: f32 = 1.0;

/// One-dimensional Kalman filter
#[derive(Debug, Clone)]
pub struct KalmanSmoother {
    /// Process noise variance (Q)
    process_noise: f32,
    /// Measurement noise variance (R)
    measurement_noise: f32,
    /// Error covariance (P)
    covariance: f32,
    /// Last gain (K)
    gain: f32,
    /// State estimate (x)
    estimate: f32,
}

impl KalmanSmoother {
    /// Create with process and measurement noise variances
    pub fn new(process_noise: f32, measurement_noise: f32) -> Self {
        Self {
            process_noise,
            measurement_noise,
            covariance: INITIAL_COVARIANCE,
            gain: 0.0,
            estimate: 0.0,
        }
    }

    /// Build from configuration
    pub fn from_config(config: &SmootherConfig) -> Self {
        Self::new(config.process_noise, config.measurement_noise)
    }

    /// Fold in one measurement and return the new estimate
    pub fn update(&mut self, measurement: f32) -> f32 {
        let predicted = self.covariance + self.process_noise;
        self.gain = predicted / (predicted + self.measurement_noise);
        self.estimate += self.gain * (measurement - self.estimate);
        self.covariance = (1.0 - self.gain) * predicted;
        self.estimate
    }

    /// Back to x = 0, P = 1
    pub fn reset(&mut self) {
        self.covariance = INITIAL_COVARIANCE;
        self.gain = 0.0;
        self.estimate = 0.0;
    }

    /// Current estimate
    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    /// Current error covariance
    pub fn covariance(&self) -> f32 {
        self.covariance
    }
}

impl Default for KalmanSmoother {
    fn default() -> Self {
        Self::from_config(&SmootherConfig::default())
    }
}
