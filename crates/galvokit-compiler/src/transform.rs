//! Scan-plane to scanner coordinate transform
//!
//! Points are scaled, rotated about the origin, then translated. Z is the
//! beam-diameter defocus plus the field curvature at the final XY plus the
//! configured Z offset. The order matters: rotating after translation moves
//! the field centre.

use crate::field_curvature;
use galvokit_core::{deg_to_rad, Point2D, Point3D, Polyline2D, Polyline3D};
use galvokit_settings::{FieldCurvatureConfig, ScannerGeometryConfig};

/// Field transform with the rotation precomputed
#[derive(Debug, Clone, Copy)]
pub struct CoordinateTransformer<'a> {
    geometry: &'a ScannerGeometryConfig,
    curve: &'a FieldCurvatureConfig,
    sin: f64,
    cos: f64,
}

impl<'a> CoordinateTransformer<'a> {
    pub fn new(geometry: &'a ScannerGeometryConfig, curve: &'a FieldCurvatureConfig) -> Self {
        let (sin, cos) = deg_to_rad(geometry.rotate_angle_deg).sin_cos();
        Self {
            geometry,
            curve,
            sin,
            cos,
        }
    }

    /// Transform one point
    pub fn apply(&self, point: Point2D, z_diameter_mm: f64) -> Point3D {
        let g = self.geometry;

        let sx = point.x as f64 * g.scale_x;
        let sy = point.y as f64 * g.scale_y;

        let rx = sx * self.cos - sy * self.sin;
        let ry = sx * self.sin + sy * self.cos;

        let fx = rx + g.offset_x;
        let fy = ry + g.offset_y;

        let z = z_diameter_mm + field_curvature::correction(fx, fy, self.curve) + g.offset_z;

        Point3D::new(fx as f32, fy as f32, z as f32)
    }

    /// Transform every point of a polyline
    pub fn apply_polyline(&self, polyline: &Polyline2D, z_diameter_mm: f64) -> Polyline3D {
        polyline
            .points
            .iter()
            .map(|p| self.apply(*p, z_diameter_mm))
            .collect::<Vec<_>>()
            .into()
    }
}

/// Transform a single point
pub fn transform(
    point: Point2D,
    z_diameter_mm: f64,
    geometry: &ScannerGeometryConfig,
    curve: &FieldCurvatureConfig,
) -> Point3D {
    CoordinateTransformer::new(geometry, curve).apply(point, z_diameter_mm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point3D, b: Point3D) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4 && (a.z - b.z).abs() < 1e-4
    }

    #[test]
    fn test_identity() {
        let geometry = ScannerGeometryConfig::default();
        let curve = FieldCurvatureConfig::default();
        for (x, y) in [(0.0, 0.0), (12.5, -3.25), (-150.0, 199.0)] {
            let p = transform(Point2D::new(x, y), 0.0, &geometry, &curve);
            assert_eq!(p, Point3D::new(x, y, 0.0));
        }
    }

    #[test]
    fn test_rotation_before_translation() {
        let geometry = ScannerGeometryConfig {
            rotate_angle_deg: 90.0,
            offset_x: 10.0,
            ..ScannerGeometryConfig::default()
        };
        let curve = FieldCurvatureConfig::default();
        let p = transform(Point2D::new(5.0, 0.0), 0.0, &geometry, &curve);
        assert!(close(p, Point3D::new(10.0, 5.0, 0.0)), "{}", p);
    }

    #[test]
    fn test_scale_before_rotation() {
        let geometry = ScannerGeometryConfig {
            rotate_angle_deg: 90.0,
            scale_x: 2.0,
            ..ScannerGeometryConfig::default()
        };
        let curve = FieldCurvatureConfig::default();
        let p = transform(Point2D::new(1.0, 1.0), 0.0, &geometry, &curve);
        assert!(close(p, Point3D::new(-1.0, 2.0, 0.0)), "{}", p);
    }

    #[test]
    fn test_z_composition_uses_final_position() {
        let geometry = ScannerGeometryConfig {
            offset_x: 30.0,
            offset_y: 40.0,
            offset_z: 0.5,
            ..ScannerGeometryConfig::default()
        };
        let curve = FieldCurvatureConfig {
            a_factor: 0.0,
            b_factor: 0.01,
            c_factor: 0.0,
        };
        // final XY is (30, 40), r = 50
        let p = transform(Point2D::new(0.0, 0.0), 1.894, &geometry, &curve);
        assert!(close(p, Point3D::new(30.0, 40.0, 1.894 + 0.5 + 0.5)), "{}", p);
    }

    #[test]
    fn test_polyline_keeps_order() {
        let geometry = ScannerGeometryConfig::default();
        let curve = FieldCurvatureConfig::default();
        let transformer = CoordinateTransformer::new(&geometry, &curve);
        let line = Polyline2D::from_flat(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0]).unwrap();
        let out = transformer.apply_polyline(&line, 0.25);
        assert_eq!(out.len(), 3);
        assert_eq!(out.points[2], Point3D::new(1.0, 1.0, 0.25));
    }
}
