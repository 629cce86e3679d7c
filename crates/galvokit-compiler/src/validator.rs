//! Post-compile checks
//!
//! Runs over compiled regions before they are placed into layers and
//! reports anything that the hardware would clip or reject.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::region::CompiledRegion;
use galvokit_core::Polyline3D;
use galvokit_settings::ScannerGeometryConfig;

/// First point outside the scanner field, if any
///
/// At most one diagnostic is produced per region.
pub fn check_field_bounds(
    region: &str,
    polylines: &[Polyline3D],
    geometry: &ScannerGeometryConfig,
) -> Option<Diagnostic> {
    let (half_x, half_y) = geometry.half_field();

    polylines
        .iter()
        .flat_map(|line| line.points.iter())
        .find(|p| (p.x as f64).abs() > half_x || (p.y as f64).abs() > half_y)
        .map(|p| {
            Diagnostic::new(
                region,
                DiagnosticKind::FieldOutOfRange {
                    x: p.x as f64,
                    y: p.y as f64,
                    half_field_x: half_x,
                    half_field_y: half_y,
                },
            )
        })
}

/// All post-compile diagnostics for one region
pub fn validate_region(compiled: &CompiledRegion, geometry: &ScannerGeometryConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if let Some(diag) = check_field_bounds(&compiled.name, &compiled.polylines, geometry) {
        diagnostics.push(diag);
    }
    if let Err(error) = compiled.parameters.validate() {
        diagnostics.push(Diagnostic::new(
            compiled.name.clone(),
            DiagnosticKind::ParameterOutOfRange(error),
        ));
    }

    diagnostics
}
