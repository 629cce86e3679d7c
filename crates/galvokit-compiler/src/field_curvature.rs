//! Field curvature correction
//!
//! The focal surface of an F-theta lens is not flat; the Z correction is a
//! quadratic in the radial distance from the field centre.

use galvokit_settings::FieldCurvatureConfig;

/// Z correction (mm) at scanner position `(x, y)`
pub fn correction(x: f64, y: f64, cfg: &FieldCurvatureConfig) -> f64 {
    let r = x.hypot(y);
    cfg.a_factor * r * r + cfg.b_factor * r + cfg.c_factor
}
