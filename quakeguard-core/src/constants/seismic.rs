//! Seismic Constants
//!
//! Gravity, the single-station attenuation relation used for the coarse
//! magnitude estimate, and the peak-ground-acceleration bands that map to
//! alert levels.

// ===== PHYSICAL CONSTANTS =====

/// Standard gravity (m/s²).
///
/// Subtracted from the vector norm of a three-axis reading to leave the
/// dynamic (shaking) component, and used to express accelerations in g.
///
/// Source: CGPM 1901 conventional value, rounded to 9.81
pub const STANDARD_GRAVITY_MS2: f32 = 9.81;

/// Conversion from g to cm/s² (gal).
///
/// Attenuation relations are calibrated in gal.
pub const G_TO_CM_S2: f32 = 981.0;

// ===== STA/LTA =====

/// LTA values at or below this are treated as "no noise floor yet" (m²/s⁴).
///
/// Guards the STA/LTA division: the ratio is reported as 0 instead of
/// exploding when the long-term window is essentially silent.
pub const LTA_NOISE_FLOOR: f32 = 1e-4;

// ===== ATTENUATION RELATION =====
//
// Mw = (log10(PGA_gal) - C1 + C3·log10(R + C4) + C5·R) / C2
//
// A generic shallow-crustal form. Coarse by construction: one station cannot
// resolve distance, so R is fixed.

/// Attenuation constant C1 (offset).
pub const ATTENUATION_C1: f32 = 2.0;

/// Attenuation constant C2 (magnitude scaling).
pub const ATTENUATION_C2: f32 = 0.6;

/// Attenuation constant C3 (geometric spreading).
pub const ATTENUATION_C3: f32 = 1.0;

/// Attenuation constant C4 (near-source saturation, km).
pub const ATTENUATION_C4: f32 = 5.0;

/// Attenuation constant C5 (anelastic attenuation, per km).
pub const ATTENUATION_C5: f32 = 0.003;

/// Epicentral distance assumed by the single-station estimate (km).
pub const ASSUMED_EPICENTRAL_DISTANCE_KM: f32 = 10.0;

/// Lower clamp for the magnitude estimate.
pub const MAGNITUDE_MIN: f32 = 0.0;

/// Upper clamp for the magnitude estimate.
pub const MAGNITUDE_MAX: f32 = 10.0;

// ===== ALERT THRESHOLDS (PGA in g) =====
//
// Instrumental-intensity bands:
// ```text
// PGA (g)     0.014   0.039   0.092   0.18    0.34
//    NEGLIGIBLE | LIGHT | MODERATE | STRONG | SEVERE | EXTREME
// ```
// Source: Wald et al. (1999) PGA/MMI relation, bands IV-VIII

/// Light shaking, felt by most people indoors (MMI IV).
pub const PGA_THRESHOLD_LIGHT_G: f32 = 0.014;

/// Moderate shaking, felt by all, dishes rattle (MMI V).
pub const PGA_THRESHOLD_MODERATE_G: f32 = 0.039;

/// Strong shaking, light damage possible (MMI VI).
pub const PGA_THRESHOLD_STRONG_G: f32 = 0.092;

/// Severe shaking, moderate damage (MMI VII).
pub const PGA_THRESHOLD_SEVERE_G: f32 = 0.18;

/// Violent shaking, heavy damage (MMI VIII+).
pub const PGA_THRESHOLD_VIOLENT_G: f32 = 0.34;
