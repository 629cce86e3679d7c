//! Gaussian beam optics
//!
//! Converts a requested spot diameter into the Z defocus that produces it,
//! and back. Only the positive branch (lens moved away from the work plane)
//! is reported.
//!
//! ```text
//! d(z) = d₀·sqrt(1 + (z/z_R)²)
//! z(d) = z_R·sqrt((d/d₀)² − 1)
//! ```

use galvokit_core::{micron_to_mm, mm_to_micron};
use galvokit_settings::BeamOpticsConfig;
use std::fmt;

/// Diameters closer than this to the waist are treated as the waist (µm)
pub const DIAMETER_EPSILON_MICRON: f64 = 0.001;

/// Target/waist ratio above which a region is flagged as strongly defocused
pub const STRONG_DEFOCUS_RATIO: f64 = 1.5;

/// Fraction of maximum power below which focus shift is ignored
pub const FOCUS_SHIFT_POWER_THRESHOLD: f64 = 0.15;

/// Non-fatal outcome of a diameter conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeamWarning {
    /// Requested diameter is smaller than the beam waist; focus is used
    ClampedBelowMinimum { requested: f64, minimum: f64 },
}

impl fmt::Display for BeamWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClampedBelowMinimum { requested, minimum } => write!(
                f,
                "requested beam diameter {:.3} µm is below the waist {:.3} µm, using focus",
                requested, minimum
            ),
        }
    }
}

/// Z offset (mm) producing `target_micron` at the work plane
///
/// Returns 0 with a warning when the target is below the waist.
pub fn diameter_to_z_offset(
    target_micron: f64,
    cfg: &BeamOpticsConfig,
) -> (f64, Option<BeamWarning>) {
    let d0 = cfg.min_beam_diameter_micron;

    if target_micron < d0 - DIAMETER_EPSILON_MICRON {
        return (
            0.0,
            Some(BeamWarning::ClampedBelowMinimum {
                requested: target_micron,
                minimum: d0,
            }),
        );
    }
    if (target_micron - d0).abs() < DIAMETER_EPSILON_MICRON {
        return (0.0, None);
    }

    let ratio = target_micron / d0;
    let z_micron = cfg.rayleigh_length_micron * (ratio * ratio - 1.0).sqrt();
    (micron_to_mm(z_micron), None)
}

/// Spot diameter (µm) at Z offset `z_mm`
pub fn z_offset_to_diameter(z_mm: f64, cfg: &BeamOpticsConfig) -> f64 {
    let t = mm_to_micron(z_mm) / cfg.rayleigh_length_micron;
    cfg.min_beam_diameter_micron * (1.0 + t * t).sqrt()
}

/// Peak intensity relative to focus, (d₀/d)²
pub fn relative_intensity(target_micron: f64, cfg: &BeamOpticsConfig) -> f64 {
    let ratio = cfg.min_beam_diameter_micron / target_micron;
    ratio * ratio
}

/// Whether `target_micron` exceeds the strong defocus ratio
pub fn is_strong_defocus(target_micron: f64, cfg: &BeamOpticsConfig) -> bool {
    target_micron > cfg.min_beam_diameter_micron * STRONG_DEFOCUS_RATIO
}

/// Theoretical Rayleigh length π·(d₀/2)²·M²/λ (µm)
pub fn theoretical_rayleigh_length_micron(cfg: &BeamOpticsConfig) -> f64 {
    cfg.theoretical_rayleigh_length_micron()
}

/// Power-dependent focus shift (µm)
///
/// The measured spot diameters are taken at evenly spaced powers from 0 to
/// `max_power_watts`. Each is converted to a Z offset and the result is
/// interpolated at `power_watts`, clamped to the end points.
pub fn focus_shift_micron(power_watts: f64, max_power_watts: f64, cfg: &BeamOpticsConfig) -> f64 {
    let diameters = &cfg.focus_shift_diameters_micron;
    if power_watts <= max_power_watts * FOCUS_SHIFT_POWER_THRESHOLD || diameters.len() < 2 {
        return 0.0;
    }

    let offsets: Vec<f64> = diameters
        .iter()
        .map(|d| mm_to_micron(diameter_to_z_offset(*d, cfg).0))
        .collect();

    let last = offsets.len() - 1;
    let position = power_watts / max_power_watts * last as f64;
    if position <= 0.0 {
        return offsets[0];
    }
    if position >= last as f64 {
        return offsets[last];
    }

    let lower = position.floor() as usize;
    let frac = position - lower as f64;
    offsets[lower] + (offsets[lower + 1] - offsets[lower]) * frac
}
