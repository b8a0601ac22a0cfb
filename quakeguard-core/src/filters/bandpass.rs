//! Second-Order IIR Bandpass Section
//!
//! Removes gravity/tilt drift below the seismic band and machinery vibration
//! above it. One instance per axis.
//!
//! ## Coefficient Design
//!
//! Band edges are normalized to Nyquist and mapped through the bilinear
//! transform of an analog bandpass prototype:
//!
//! ```text
//! wl = 2·f_low / fs        wh = 2·f_high / fs
//! w0 = √(wl·wh)            bw = wh − wl            (center, bandwidth)
//! α  = sin(π·w0) · sinh(ln2/2 · bw · π·w0 / sin(π·w0))
//!
//! b = [ α, 0, −α ]         a = [ 1+α, −2·cos(π·w0), 1−α ]     then ÷ a0
//! ```
//!
//! The resulting section has unity gain at the center frequency.
//!
//! ## Recurrence
//!
//! ```text
//! y[n] = b0·x[n] + b1·x[n−1] + b2·x[n−2] − a1·y[n−1] − a2·y[n−2]
//! ```
//!
//! The section is stable whenever both poles lie inside the unit circle,
//! which holds for any band strictly inside (0, Nyquist). That is checked by
//! `FilterConfig::validate`, not here: `process` is on the per-sample path.

use core::f32::consts::{LN_2, PI};

use libm::{cosf, sinf, sinhf, sqrtf};

use crate::config::FilterConfig;

/// Stateful bandpass biquad
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    // Shift register: previous two inputs and outputs
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    order: u8,
}

impl BandpassFilter {
    /// Derive coefficients for a band at the given sample rate
    pub fn new(sample_rate_hz: f32, low_cutoff_hz: f32, high_cutoff_hz: f32, order: u8) -> Self {
        let wl = 2.0 * low_cutoff_hz / sample_rate_hz;
        let wh = 2.0 * high_cutoff_hz / sample_rate_hz;

        let bw = wh - wl;
        let w0 = sqrtf(wl * wh);

        let sin_w0 = sinf(PI * w0);
        let alpha = sin_w0 * sinhf(LN_2 / 2.0 * bw * PI * w0 / sin_w0);
        let cos_w0 = cosf(PI * w0);

        let a0 = 1.0 + alpha;

        Self {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            order,
        }
    }

    /// Build from configuration
    pub fn from_config(sample_rate_hz: f32, config: &FilterConfig) -> Self {
        Self::new(
            sample_rate_hz,
            config.low_cutoff_hz,
            config.high_cutoff_hz,
            config.order,
        )
    }

    /// Filter one sample
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Zero the shift register, keep coefficients
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Feedforward coefficients `[b0, b1, b2]`
    pub fn feedforward(&self) -> [f32; 3] {
        [self.b0, self.b1, self.b2]
    }

    /// Feedback coefficients `[1, a1, a2]`
    pub fn feedback(&self) -> [f32; 3] {
        [1.0, self.a1, self.a2]
    }

    /// Configured nominal order
    pub fn order(&self) -> u8 {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seismic_band() -> BandpassFilter {
        BandpassFilter::new(100.0, 0.1, 10.0, 2)
    }

    fn steady_state_amplitude(filter: &mut BandpassFilter, freq_hz: f32, fs: f32) -> f32 {
        let mut peak = 0.0f32;
        for n in 0..4000 {
            let t = n as f32 / fs;
            let y = filter.process(sinf(2.0 * PI * freq_hz * t));
            // Skip the transient
            if n >= 3000 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn coefficients_are_normalized() {
        let filter = seismic_band();
        let [b0, b1, b2] = filter.feedforward();
        let [a0, a1, a2] = filter.feedback();
        assert_eq!(a0, 1.0);
        assert_eq!(b1, 0.0);
        assert!((b0 + b2).abs() < 1e-6);
        assert!(b0 > 0.0);
        // Poles inside the unit circle
        assert!(a2.abs() < 1.0);
        assert!(a1.abs() < 1.0 + a2);
    }

    #[test]
    fn removes_dc_offset() {
        let mut filter = seismic_band();
        let mut last = 0.0;
        for _ in 0..20_000 {
            last = filter.process(9.81);
        }
        assert!(last.abs() < 0.05, "DC leaked through: {}", last);
    }

    #[test]
    fn passes_center_frequency() {
        // Center = √(0.1·10) = 1 Hz
        let mut filter = seismic_band();
        let amplitude = steady_state_amplitude(&mut filter, 1.0, 100.0);
        assert!(amplitude > 0.8, "center gain too low: {}", amplitude);
        assert!(amplitude < 1.1, "center gain too high: {}", amplitude);
    }

    #[test]
    fn attenuates_out_of_band() {
        let mut filter = seismic_band();
        let amplitude = steady_state_amplitude(&mut filter, 40.0, 100.0);
        assert!(amplitude < 0.5, "40 Hz not attenuated: {}", amplitude);
    }

    #[test]
    fn reset_clears_state_not_coefficients() {
        let mut filter = seismic_band();
        let before = filter.feedforward();
        filter.process(1.0);
        filter.process(-2.0);

        filter.reset();
        assert_eq!(filter.feedforward(), before);

        let mut fresh = seismic_band();
        assert_eq!(filter.process(0.5), fresh.process(0.5));
    }
}
