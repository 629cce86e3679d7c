//! Error handling for GalvoKit
//!
//! Provides the error types shared by every layer of the workspace:
//! - Geometry errors (malformed coordinates and polylines)
//! - The unified [`Error`] used by public APIs that cross crate boundaries
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Represents malformed geometry handed over by the slicer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Flat coordinate buffer is not made of x/y pairs
    #[error("expected interleaved x/y pairs, got {count} values")]
    OddCoordinateCount {
        /// The number of values received.
        count: usize,
    },

    /// A coordinate is NaN or infinite
    #[error("non-finite coordinate in polyline {polyline} at point {point}")]
    NonFiniteCoordinate {
        /// Index of the polyline within its region.
        polyline: usize,
        /// Index of the point within the polyline.
        point: usize,
    },
}

/// Main error type for GalvoKit
///
/// A unified error type that can represent any error from the core layer.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
