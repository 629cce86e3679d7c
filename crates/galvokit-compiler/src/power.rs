//! Laser power correction pipeline
//!
//! Requested power is linearized through the measured calibration table,
//! offset by `k·P + c`, then clamped to the rated maximum.

use galvokit_settings::{FunctionSwitches, PowerConfig};

/// Output of the power pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedPower {
    /// Power to command (W)
    pub watts: f64,
    /// Power as a share of the rated maximum (0..=100)
    pub percent: f64,
}

/// Run the correction pipeline for `requested_watts`
pub fn correct_power(
    requested_watts: f64,
    cfg: &PowerConfig,
    flags: &FunctionSwitches,
) -> CorrectedPower {
    let max = cfg.max_power_watts;

    let mut value = if flags.enable_power_correction {
        let normalized = (requested_watts / max).clamp(0.0, 1.0);
        interpolate_table(&cfg.correction_table, normalized)
    } else {
        requested_watts
    };

    if flags.enable_power_offset {
        value += cfg.k_factor * value + cfg.c_factor;
    }

    let watts = value.clamp(0.0, max);
    CorrectedPower {
        watts,
        percent: watts / max * 100.0,
    }
}

/// Linear lookup at normalized position `t` in an evenly spaced table
///
/// Tables shorter than two entries return their only value, or 0.
pub fn interpolate_table(table: &[f64], t: f64) -> f64 {
    match table {
        [] => 0.0,
        [only] => *only,
        _ => {
            let idx = t.clamp(0.0, 1.0) * (table.len() - 1) as f64;
            let lower = idx.floor() as usize;
            let upper = idx.ceil() as usize;
            if lower == upper {
                return table[lower];
            }
            let frac = idx - lower as f64;
            table[lower] + (table[upper] - table[lower]) * frac
        }
    }
}
