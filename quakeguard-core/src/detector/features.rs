//! Ground-motion features over the rolling window
//!
//! Pure functions. Each returns 0 when the window does not yet hold enough
//! samples; "not enough data" is a normal state during warm-up, not an error.
//!
//! ## Window Spans
//!
//! ```text
//!            ◄──────────── LTA span ────────────►◄── STA span ──►
//!   ┌──────┬─────────────────────────────────────┬───────────────┐
//!   │ old  │        noise floor estimate         │  recent burst │
//!   └──────┴─────────────────────────────────────┴───────────────┘
//!                                                       ◄─ PGA (3 s) ─►
//! ```
//!
//! The long-term span deliberately excludes the short-term one, so a sudden
//! burst raises STA without immediately raising its own baseline.

use libm::{fabsf, log10f, sqrtf};

use crate::constants::seismic::{
    ATTENUATION_C1, ATTENUATION_C2, ATTENUATION_C3, ATTENUATION_C4, ATTENUATION_C5,
    G_TO_CM_S2, LTA_NOISE_FLOOR, MAGNITUDE_MAX, MAGNITUDE_MIN, STANDARD_GRAVITY_MS2,
};
use crate::event::AccelSample;
use crate::time::Timestamp;

use super::window::RollingWindow;

/// Dynamic acceleration (m/s²): vector norm with gravity removed
#[inline]
pub fn instantaneous_magnitude(sample: &AccelSample) -> f32 {
    let norm = sqrtf(sample.x * sample.x + sample.y * sample.y + sample.z * sample.z);
    fabsf(norm - STANDARD_GRAVITY_MS2)
}

#[inline]
fn energy(sample: &AccelSample) -> f32 {
    let m = instantaneous_magnitude(sample);
    m * m
}

/// Short-term average of squared magnitude over the newest `sta_samples`
pub fn short_term_average(window: &RollingWindow, sta_samples: usize) -> f32 {
    if sta_samples == 0 || window.len() < sta_samples {
        return 0.0;
    }
    let sum: f32 = window.recent(sta_samples).map(energy).sum();
    sum / sta_samples as f32
}

/// Long-term average of squared magnitude over the span preceding the STA span
///
/// Until the window is full the span is shorter than `lta_samples`; the mean
/// is taken over what is actually buffered there.
pub fn long_term_average(window: &RollingWindow, sta_samples: usize, lta_samples: usize) -> f32 {
    let len = window.len();
    if lta_samples == 0 || len < lta_samples {
        return 0.0;
    }

    let end = len.saturating_sub(sta_samples);
    let start = len.saturating_sub(sta_samples + lta_samples);
    let count = end - start;
    if count == 0 {
        return 0.0;
    }

    let sum: f32 = window.range(start, end).map(energy).sum();
    sum / count as f32
}

/// STA / LTA, or 0 while the noise floor is effectively silent
#[inline]
pub fn sta_lta_ratio(sta: f32, lta: f32) -> f32 {
    if lta > LTA_NOISE_FLOOR {
        sta / lta
    } else {
        0.0
    }
}

/// Peak ground acceleration (g) over the newest `pga_samples`
pub fn peak_ground_acceleration(window: &RollingWindow, pga_samples: usize) -> f32 {
    window
        .recent(pga_samples)
        .map(|s| instantaneous_magnitude(s) / STANDARD_GRAVITY_MS2)
        .fold(0.0f32, f32::max)
}

/// Cumulative absolute velocity (g·s) from `trigger_time` onward
pub fn cumulative_absolute_velocity(
    window: &RollingWindow,
    trigger_time: Option<Timestamp>,
    dt_sec: f32,
) -> f32 {
    let Some(trigger_time) = trigger_time else {
        return 0.0;
    };

    window
        .iter()
        .skip_while(|s| s.timestamp < trigger_time)
        .map(|s| fabsf(instantaneous_magnitude(s) / STANDARD_GRAVITY_MS2) * dt_sec)
        .sum()
}

/// Moment magnitude from PGA (g) via a fixed-distance attenuation relation
///
/// Clamped to `[0, 10]`. Non-positive PGA maps to the lower clamp.
pub fn magnitude_estimate(pga_g: f32, distance_km: f32) -> f32 {
    let pga_gal = pga_g * G_TO_CM_S2;
    if !(pga_gal > 0.0) {
        return MAGNITUDE_MIN;
    }

    let mw = (log10f(pga_gal) - ATTENUATION_C1
        + ATTENUATION_C3 * log10f(distance_km + ATTENUATION_C4)
        + ATTENUATION_C5 * distance_km)
        / ATTENUATION_C2;

    mw.clamp(MAGNITUDE_MIN, MAGNITUDE_MAX)
}
