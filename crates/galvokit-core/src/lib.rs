//! # GalvoKit Core
//!
//! Core types and utilities for GalvoKit.
//! Provides the geometry primitives exchanged between the slicer, the
//! marking compiler and the scanner driver, plus unit helpers and the
//! shared error type.

pub mod data;
pub mod error;
pub mod units;

pub use data::{Point2D, Point3D, Polyline2D, Polyline3D};

pub use error::{Error, GeometryError, Result};

pub use units::{deg_to_rad, micron_to_mm, mm_to_micron, LengthUnit, MICRONS_PER_MM};
