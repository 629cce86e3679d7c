//! Batch diagnostics
//!
//! Everything non-fatal that happens while compiling a batch is reported as
//! a [`Diagnostic`] tagged with the region it concerns. Region compile
//! failures are reported the same way so that a batch always completes.

use crate::error::{ParameterError, RegionError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Output was produced but may not be what was asked for.
    Warning,
    /// The region was skipped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// What went wrong
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// Requested beam diameter is below the waist; focus was used.
    BeamGeometry {
        requested_micron: f64,
        minimum_micron: f64,
    },
    /// Requested diameter is far out of focus; intensity drops sharply.
    StrongDefocus {
        requested_micron: f64,
        relative_intensity: f64,
    },
    /// A transformed point lies outside the scanner field.
    FieldOutOfRange {
        x: f64,
        y: f64,
        half_field_x: f64,
        half_field_y: f64,
    },
    /// Compiled layer parameters exceed a hardware limit.
    ParameterOutOfRange(ParameterError),
    /// The region could not be compiled and was skipped.
    RegionCompileFailure(RegionError),
}

/// A diagnostic attached to one region
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Name of the region concerned
    pub region: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(region: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            region: region.into(),
            kind,
        }
    }

    /// Failure diagnostic for a region error
    pub fn failure(error: RegionError) -> Self {
        Self::new(error.region().to_string(), DiagnosticKind::RegionCompileFailure(error))
    }

    /// Get the severity of this diagnostic
    pub fn severity(&self) -> Severity {
        match self.kind {
            DiagnosticKind::RegionCompileFailure(_) => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// Short stable identifier
    pub fn code(&self) -> &'static str {
        match self.kind {
            DiagnosticKind::BeamGeometry { .. } => "W001",
            DiagnosticKind::StrongDefocus { .. } => "W002",
            DiagnosticKind::FieldOutOfRange { .. } => "W003",
            DiagnosticKind::ParameterOutOfRange(_) => "W004",
            DiagnosticKind::RegionCompileFailure(_) => "E001",
        }
    }

    /// The offending value, where there is a single one
    pub fn value(&self) -> Option<f64> {
        match &self.kind {
            DiagnosticKind::BeamGeometry {
                requested_micron, ..
            }
            | DiagnosticKind::StrongDefocus {
                requested_micron, ..
            } => Some(*requested_micron),
            DiagnosticKind::FieldOutOfRange { x, y, .. } => Some(x.abs().max(y.abs())),
            DiagnosticKind::ParameterOutOfRange(ParameterError::OutOfRange { value, .. }) => {
                Some(*value)
            }
            DiagnosticKind::RegionCompileFailure(error) => error.value(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] region '{}': ", self.code(), self.region)?;
        match &self.kind {
            DiagnosticKind::BeamGeometry {
                requested_micron,
                minimum_micron,
            } => write!(
                f,
                "beam diameter {:.3} µm is below the waist {:.3} µm, using focus",
                requested_micron, minimum_micron
            ),
            DiagnosticKind::StrongDefocus {
                requested_micron,
                relative_intensity,
            } => write!(
                f,
                "beam diameter {:.3} µm is strongly defocused ({:.0}% of focus intensity)",
                requested_micron,
                relative_intensity * 100.0
            ),
            DiagnosticKind::FieldOutOfRange {
                x,
                y,
                half_field_x,
                half_field_y,
            } => write!(
                f,
                "point ({:.3}, {:.3}) is outside the field ±{:.3} x ±{:.3} mm",
                x, y, half_field_x, half_field_y
            ),
            DiagnosticKind::ParameterOutOfRange(error) => write!(f, "{}", error),
            DiagnosticKind::RegionCompileFailure(error) => write!(f, "{}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_and_code() {
        let warning = Diagnostic::new(
            "contour",
            DiagnosticKind::BeamGeometry {
                requested_micron: 30.0,
                minimum_micron: 48.141,
            },
        );
        assert_eq!(warning.severity(), Severity::Warning);
        assert_eq!(warning.code(), "W001");
        assert_eq!(warning.value(), Some(30.0));
        assert!(!warning.is_failure());

        let failure = Diagnostic::failure(RegionError::InvalidPower {
            region: "hatch".to_string(),
            value: -1.0,
        });
        assert_eq!(failure.region, "hatch");
        assert_eq!(failure.severity(), Severity::Error);
        assert_eq!(failure.value(), Some(-1.0));
        assert!(failure.is_failure());
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::new(
            "edge",
            DiagnosticKind::FieldOutOfRange {
                x: 210.0,
                y: 0.0,
                half_field_x: 200.0,
                half_field_y: 200.0,
            },
        );
        assert_eq!(
            diag.to_string(),
            "[W003] region 'edge': point (210.000, 0.000) is outside the field ±200.000 x ±200.000 mm"
        );
    }
}
