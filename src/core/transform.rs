//! Affine transforms and the planar-meters → pixel-space mapping.
//!
//! The projection pipeline is expressed as an ordered chain of affine steps
//! rather than collapsed scalar arithmetic, so additional steps (rotated or
//! custom tile grids) can be inserted without restructuring the math.

use std::f64::consts::PI;

use crate::core::geo::{LatLng, Point, EARTH_RADIUS};

/// A 2D affine transform stored as the CSS-style matrix `[a b c d e f]`:
///
/// ```text
/// | a  c  e |   | x |
/// | b  d  f | · | y |
/// | 0  0  1 |   | 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    m: [f64; 6],
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            m: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, tx, ty],
        }
    }

    /// Rotation by `theta` radians, counter-clockwise for positive values.
    pub fn rotate(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            m: [cos, sin, -sin, cos, 0.0, 0.0],
        }
    }

    /// Matrix product `self · other`: the transform that applies `other`
    /// first, then `self`.
    pub fn compose(&self, other: &Transform) -> Transform {
        let a = &self.m;
        let b = &other.m;
        Transform {
            m: [
                a[0] * b[0] + a[2] * b[1],
                a[1] * b[0] + a[3] * b[1],
                a[0] * b[2] + a[2] * b[3],
                a[1] * b[2] + a[3] * b[3],
                a[0] * b[4] + a[2] * b[5] + a[4],
                a[1] * b[4] + a[3] * b[5] + a[5],
            ],
        }
    }

    /// Folds an ordered list of steps into one transform. As with a matrix
    /// chain, the step listed last is applied to the point first.
    pub fn chain(steps: &[Transform]) -> Transform {
        steps
            .iter()
            .fold(Transform::identity(), |acc, step| acc.compose(step))
    }

    pub fn apply(&self, point: Point) -> Point {
        let m = &self.m;
        Point::new(
            m[0] * point.x + m[2] * point.y + m[4],
            m[1] * point.x + m[3] * point.y + m[5],
        )
    }
}

/// Width of the pixel plane at a zoom level: `tile_size · 2^zoom`.
pub fn scale_factor(zoom: u8, tile_size: u32) -> f64 {
    tile_size as f64 * (1u64 << zoom) as f64
}

/// Ratio used to rescale pixel extents between zoom levels.
pub fn zoom_scale(to: u8, from: u8, tile_size: u32) -> f64 {
    scale_factor(to, tile_size) / scale_factor(from, tile_size)
}

/// The planar-meters → pixel transform for a zoom level:
/// normalize ±π·R into [-0.5, 0.5] (Y flipped for a downward pixel axis),
/// shift into [0, 1], then scale up to the pixel plane.
pub fn pixel_transform(zoom: u8, tile_size: u32) -> Transform {
    let s = scale_factor(zoom, tile_size);
    let norm = 0.5 / (PI * EARTH_RADIUS);
    Transform::chain(&[
        Transform::scale(s, s),
        Transform::translate(0.5, 0.5),
        Transform::scale(norm, -norm),
    ])
}

/// WGS84 → pixel coordinate for a zoom level, range `[0, tile_size · 2^zoom]`.
pub fn project_to_pixel(latlng: &LatLng, zoom: u8, tile_size: u32) -> Point {
    pixel_transform(zoom, tile_size).apply(latlng.to_mercator())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_applies_last_step_first() {
        // translate(10, 10) after scale(2, 2): (4, -1) -> (8, -2) -> (18, 8)
        let t = Transform::chain(&[Transform::translate(10.0, 10.0), Transform::scale(2.0, 2.0)]);
        assert_eq!(t.apply(Point::new(4.0, -1.0)), Point::new(18.0, 8.0));
        // opposite order scales the translation too
        let t = Transform::chain(&[Transform::scale(2.0, 2.0), Transform::translate(10.0, 10.0)]);
        assert_eq!(t.apply(Point::new(4.0, -1.0)), Point::new(28.0, 18.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let t = Transform::rotate(std::f64::consts::FRAC_PI_2);
        let p = t.apply(Point::new(1.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_factor_doubles_per_zoom() {
        assert_eq!(scale_factor(0, 256), 256.0);
        assert_eq!(scale_factor(7, 256), 32768.0);
        assert_eq!(zoom_scale(9, 7, 256), 4.0);
        assert_eq!(zoom_scale(7, 9, 256), 0.25);
    }

    #[test]
    fn test_origin_projects_to_plane_center() {
        let p = project_to_pixel(&LatLng::new(0.0, 0.0), 7, 256);
        assert!((p.x - 16384.0).abs() < 1e-6);
        assert!((p.y - 16384.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_corners() {
        // north-west corner of the projected square is pixel (0, 0)
        let nw = project_to_pixel(&LatLng::new(crate::core::geo::MAX_LATITUDE, -180.0), 3, 256);
        assert!(nw.x.abs() < 1e-6);
        assert!(nw.y.abs() < 1e-6);
        let se = project_to_pixel(&LatLng::new(-crate::core::geo::MAX_LATITUDE, 180.0), 3, 256);
        assert!((se.x - 2048.0).abs() < 1e-6);
        assert!((se.y - 2048.0).abs() < 1e-6);
    }

    #[test]
    fn test_chicago_pixel_center() {
        let p = project_to_pixel(&LatLng::new(41.85, -87.65), 7, 256);
        assert!((p.x - 8405.9).abs() < 0.1);
        assert!((p.y - 12182.4).abs() < 0.1);
    }
}
