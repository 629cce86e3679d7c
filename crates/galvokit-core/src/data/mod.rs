//! Geometry models for scan-field coordinates
//!
//! This module provides:
//! - 2D input points as emitted by the slicer (millimetres, f32)
//! - 3D output points as consumed by the scanner driver (millimetres, f32)
//! - Polylines over both, with length and bounds helpers

use crate::error::{GeometryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in the scan plane, in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate (mm)
    pub x: f32,
    /// Y coordinate (mm)
    pub y: f32,
}

impl Point2D {
    /// Create a new 2D point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Distance to another point
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x as f64 - self.x as f64;
        let dy = other.y as f64 - self.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f32, f32)> for Point2D {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Y:{:.3}", self.x, self.y)
    }
}

/// A scanner coordinate with focus axis, in millimetres
///
/// Stored as f32 because that is the precision the downstream driver accepts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    /// X coordinate (mm)
    pub x: f32,
    /// Y coordinate (mm)
    pub y: f32,
    /// Z (focus) coordinate (mm)
    pub z: f32,
}

impl Point3D {
    /// Create a new 3D point
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The scanner origin
    pub fn origin() -> Self {
        Self::default()
    }

    /// Projection onto the scan plane
    pub fn xy(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point3D) -> f64 {
        let dx = other.x as f64 - self.x as f64;
        let dy = other.y as f64 - self.y as f64;
        let dz = other.z as f64 - self.z as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Y:{:.3} Z:{:.3}", self.x, self.y, self.z)
    }
}

/// An ordered sequence of scan-plane points
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline2D {
    /// Vertices in marking order
    pub points: Vec<Point2D>,
}

impl Polyline2D {
    /// Create a polyline from points
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Build a polyline from interleaved `x, y` coordinates
    ///
    /// Slicer output frequently stores hatches and contours as flat
    /// coordinate arrays; an odd number of values is rejected.
    pub fn from_flat(coords: &[f32]) -> Result<Self> {
        if coords.len() % 2 != 0 {
            return Err(GeometryError::OddCoordinateCount {
                count: coords.len(),
            }
            .into());
        }
        Ok(Self {
            points: coords
                .chunks_exact(2)
                .map(|c| Point2D::new(c[0], c[1]))
                .collect(),
        })
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polyline has no vertices
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the first vertex with a non-finite coordinate
    pub fn first_non_finite(&self) -> Option<usize> {
        self.points.iter().position(|p| !p.is_finite())
    }

    /// Total path length (mm)
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }
}

impl From<Vec<Point2D>> for Polyline2D {
    fn from(points: Vec<Point2D>) -> Self {
        Self { points }
    }
}

/// An ordered sequence of transformed scanner coordinates
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline3D {
    /// Vertices in marking order
    pub points: Vec<Point3D>,
}

impl Polyline3D {
    /// Create a polyline from points
    pub fn new(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polyline has no vertices
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First vertex, if any
    pub fn start(&self) -> Option<&Point3D> {
        self.points.first()
    }

    /// Last vertex, if any
    pub fn end(&self) -> Option<&Point3D> {
        self.points.last()
    }

    /// Total marked path length (mm)
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }
}

impl From<Vec<Point3D>> for Polyline3D {
    fn from(points: Vec<Point3D>) -> Self {
        Self { points }
    }
}
