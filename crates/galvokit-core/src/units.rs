//! Unit conversion utilities
//!
//! Optics calibration is specified in micrometres while scan geometry is in
//! millimetres; these helpers keep the conversions in one place.

use serde::{Deserialize, Serialize};

/// Micrometres per millimetre
pub const MICRONS_PER_MM: f64 = 1000.0;

/// Length unit used in calibration data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Micrometres (µm)
    Micron,
    /// Millimetres (mm)
    Millimeter,
}

impl LengthUnit {
    /// Convert a value from one unit to another
    pub fn convert(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
        match (from, to) {
            (LengthUnit::Micron, LengthUnit::Millimeter) => value / MICRONS_PER_MM,
            (LengthUnit::Millimeter, LengthUnit::Micron) => value * MICRONS_PER_MM,
            _ => value,
        }
    }
}

/// Micrometres to millimetres
pub fn micron_to_mm(value: f64) -> f64 {
    LengthUnit::convert(value, LengthUnit::Micron, LengthUnit::Millimeter)
}

/// Millimetres to micrometres
pub fn mm_to_micron(value: f64) -> f64 {
    LengthUnit::convert(value, LengthUnit::Millimeter, LengthUnit::Micron)
}

/// Degrees to radians
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(micron_to_mm(1894.0), 1.894);
        assert_eq!(mm_to_micron(0.5), 500.0);
        assert_eq!(
            LengthUnit::convert(3.0, LengthUnit::Micron, LengthUnit::Micron),
            3.0
        );
        assert!((deg_to_rad(180.0) - std::f64::consts::PI).abs() < 1e-12);
    }
}
