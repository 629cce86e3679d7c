//! Error types for the marking compiler.
//!
//! Configuration problems are fatal and stop a batch before anything is
//! compiled. Region problems are recoverable: the failing region is reported
//! as a diagnostic and its siblings still compile.

use galvokit_core::GeometryError;
use galvokit_settings::ConfigError;
use std::io;
use thiserror::Error;

/// Errors that can occur while compiling or emitting a marking job.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The laser card configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A parameter block handed to a driver is outside hardware limits.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// I/O error while writing driver output.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Errors local to one region. Sibling regions are unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    /// No polyline in the region has any points.
    #[error("region '{region}' has no polylines with points")]
    EmptyGeometry { region: String },

    /// Mark speed rounds to zero, is negative, or is not finite.
    #[error("region '{region}' has invalid mark speed {value}")]
    InvalidMarkSpeed { region: String, value: f64 },

    /// Laser power is negative or not finite.
    #[error("region '{region}' has invalid laser power {value} W")]
    InvalidPower { region: String, value: f64 },

    /// Beam diameter is negative or not finite.
    #[error("region '{region}' has invalid beam diameter {value} µm")]
    InvalidBeamDiameter { region: String, value: f64 },

    /// A coordinate is not finite.
    #[error("region '{region}': {source}")]
    Geometry {
        region: String,
        #[source]
        source: GeometryError,
    },

    /// The configuration carries no speed profile to select from.
    #[error("region '{region}': no speed profile configured")]
    NoSpeedProfile { region: String },

    /// The region targets a laser card with no configuration.
    #[error("region '{region}': no configuration for laser card {card}")]
    UnknownLaserCard { region: String, card: u32 },
}

impl RegionError {
    /// Name of the failing region
    pub fn region(&self) -> &str {
        match self {
            Self::EmptyGeometry { region }
            | Self::InvalidMarkSpeed { region, .. }
            | Self::InvalidPower { region, .. }
            | Self::InvalidBeamDiameter { region, .. }
            | Self::Geometry { region, .. }
            | Self::NoSpeedProfile { region }
            | Self::UnknownLaserCard { region, .. } => region,
        }
    }

    /// Offending numeric value, where there is one
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::InvalidMarkSpeed { value, .. }
            | Self::InvalidPower { value, .. }
            | Self::InvalidBeamDiameter { value, .. } => Some(*value),
            Self::UnknownLaserCard { card, .. } => Some(*card as f64),
            _ => None,
        }
    }
}

/// Errors related to layer parameter limits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Result type alias for per-region compilation.
pub type RegionResult<T> = Result<T, RegionError>;
