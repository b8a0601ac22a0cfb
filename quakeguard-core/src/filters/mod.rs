//! Signal conditioning
//!
//! Per-axis chain applied to every raw reading before it reaches the
//! detector:
//!
//! ```text
//! raw x ──► BandpassFilter ──► KalmanSmoother ──► x
//! raw y ──► BandpassFilter ──► KalmanSmoother ──► y
//! raw z ──► BandpassFilter ──► KalmanSmoother ──► z
//! ```
//!
//! Each stage holds a few scalars of state and never allocates.
//!
//! The bandpass strips the static 1 g from the vertical axis, while the
//! detector's magnitude subtracts standard gravity from the vector norm. A
//! chain feeding the detector is therefore built
//! [`with_gravity_reference`](ConditioningChain::with_gravity_reference), which
//! adds standard gravity back onto z after conditioning.

pub mod bandpass;
pub mod smoother;

pub use bandpass::BandpassFilter;
pub use smoother::KalmanSmoother;

use crate::config::{FilterConfig, SmootherConfig};
use crate::constants::STANDARD_GRAVITY_MS2;
use crate::event::AccelReading;

/// Bandpass followed by smoother, for one axis
#[derive(Debug, Clone)]
pub struct AxisConditioner {
    bandpass: BandpassFilter,
    smoother: KalmanSmoother,
}

impl AxisConditioner {
    /// Create the two stages for one axis
    pub fn new(sample_rate_hz: f32, filter: &FilterConfig, smoother: &SmootherConfig) -> Self {
        Self {
            bandpass: BandpassFilter::from_config(sample_rate_hz, filter),
            smoother: KalmanSmoother::from_config(smoother),
        }
    }

    /// Condition one value
    pub fn process(&mut self, value: f32) -> f32 {
        self.smoother.update(self.bandpass.process(value))
    }

    /// Reset both stages
    pub fn reset(&mut self) {
        self.bandpass.reset();
        self.smoother.reset();
    }
}

/// Three independent axis conditioners
#[derive(Debug, Clone)]
pub struct ConditioningChain {
    x: AxisConditioner,
    y: AxisConditioner,
    z: AxisConditioner,
    z_offset: f32,
}

impl ConditioningChain {
    /// Build identical chains for all three axes
    pub fn new(sample_rate_hz: f32, filter: &FilterConfig, smoother: &SmootherConfig) -> Self {
        let axis = AxisConditioner::new(sample_rate_hz, filter, smoother);
        Self {
            x: axis.clone(),
            y: axis.clone(),
            z: axis,
            z_offset: 0.0,
        }
    }

    /// Add standard gravity back onto the conditioned z axis
    pub fn with_gravity_reference(mut self) -> Self {
        self.z_offset = STANDARD_GRAVITY_MS2;
        self
    }

    /// Condition one raw reading
    pub fn process(&mut self, raw: AccelReading) -> AccelReading {
        AccelReading::new(
            self.x.process(raw.x),
            self.y.process(raw.y),
            self.z.process(raw.z) + self.z_offset,
        )
    }

    /// Reset all axes
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> ConditioningChain {
        ConditioningChain::new(100.0, &FilterConfig::default(), &SmootherConfig::default())
    }

    #[test]
    fn axes_are_independent() {
        let mut chain = chain();
        let out = chain.process(AccelReading::new(1.0, 0.0, 0.0));
        assert!(out.x != 0.0);
        assert_eq!(out.y, 0.0);
        assert_eq!(out.z, 0.0);
    }

    #[test]
    fn gravity_is_removed() {
        let mut chain = chain();
        let mut out = AccelReading::default();
        for _ in 0..20_000 {
            out = chain.process(AccelReading::new(0.0, 0.0, 9.81));
        }
        assert!(out.z.abs() < 0.05, "gravity left in z: {}", out.z);
    }

    #[test]
    fn gravity_reference_restores_one_g() {
        let mut chain = chain().with_gravity_reference();
        let mut out = AccelReading::default();
        for _ in 0..20_000 {
            out = chain.process(AccelReading::new(0.0, 0.0, 9.81));
        }
        assert!((out.z - 9.81).abs() < 0.05, "z = {}", out.z);
        assert!(out.x.abs() < 1e-6);
    }

    #[test]
    fn reset_matches_fresh_chain() {
        let mut used = chain();
        for i in 0..50 {
            used.process(AccelReading::new(i as f32, 1.0, 9.81));
        }
        used.reset();

        let mut fresh = chain();
        let reading = AccelReading::new(0.3, -0.2, 9.9);
        assert_eq!(used.process(reading), fresh.process(reading));
    }
}
