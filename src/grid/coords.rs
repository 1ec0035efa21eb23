//! Tile addressing: integer tile coordinates, canonical keys and viewport
//! tile ranges.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::bounds::Bounds;
use crate::core::geo::Point;
use crate::{GridError, Result};

/// A tile coordinate in the slippy-map pyramid.
///
/// `x` and `y` are signed: coordinates produced by range enumeration may lie
/// outside `[0, 2^z)` before wrap-around normalization. `z` is the discrete
/// zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: i32, y: i32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Number of tiles per axis at this coordinate's zoom level.
    pub fn world_size(&self) -> i32 {
        1i32 << self.z
    }

    /// Reduces `x` modulo `2^z` into `[0, 2^z)` to support horizontal world
    /// wrap. `y` and `z` are unchanged; the vertical axis does not wrap.
    pub fn normalized(&self) -> TileCoord {
        let n = self.world_size();
        TileCoord::new(((self.x % n) + n) % n, self.y, self.z)
    }

    /// Canonical key for the tile slot this coordinate addresses, derived
    /// post-normalization so repeated world wrappings share one slot.
    pub fn key(&self) -> TileKey {
        let norm = self.normalized();
        debug_assert!(
            norm.y >= 0 && norm.y < norm.world_size(),
            "keying an out-of-world coordinate {norm}"
        );
        TileKey {
            x: norm.x as u32,
            y: norm.y as u32,
            z: norm.z,
        }
    }

    /// Whether this coordinate addresses a real tile: zoom within the
    /// configured bounds and `y` inside the non-wrapping vertical extent.
    pub fn is_valid(&self, min_zoom: u8, max_zoom: u8) -> bool {
        self.z >= min_zoom && self.z <= max_zoom && self.y >= 0 && self.y < self.world_size()
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.z)
    }
}

/// Canonical identifier for a normalized tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.z)
    }
}

/// Axis-aligned inclusive integer tile bounds at a fixed zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub zoom: u8,
}

impl TileRange {
    /// Converts pixel bounds into the inclusive tile range exactly covering
    /// them: floor the min corner, ceil the max corner and subtract one so a
    /// max edge landing exactly on a tile boundary does not drag in the next
    /// column or row.
    ///
    /// Fails fast with [`GridError::DegenerateRange`] when any bound
    /// coordinate is non-finite: an unbounded range is a programming or
    /// input error, never something to truncate silently.
    pub fn from_pixel_bounds(bounds: &Bounds, tile_size: u32, zoom: u8) -> Result<TileRange> {
        if !bounds.is_finite() {
            return Err(GridError::DegenerateRange);
        }
        let ts = tile_size as f64;
        Ok(TileRange {
            min_x: (bounds.min.x / ts).floor() as i32,
            min_y: (bounds.min.y / ts).floor() as i32,
            max_x: (bounds.max.x / ts).ceil() as i32 - 1,
            max_y: (bounds.max.y / ts).ceil() as i32 - 1,
            zoom,
        })
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Range grown by `buffer` tiles on every side (the keep-buffer margin).
    pub fn expanded(&self, buffer: i32) -> TileRange {
        TileRange {
            min_x: self.min_x - buffer,
            min_y: self.min_y - buffer,
            max_x: self.max_x + buffer,
            max_y: self.max_y + buffer,
            zoom: self.zoom,
        }
    }

    /// Center of the range in tile units, used for center-out load ordering.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) as f64 / 2.0,
            (self.min_y + self.max_y) as f64 / 2.0,
        )
    }

    pub fn count(&self) -> usize {
        if self.max_x < self.min_x || self.max_y < self.min_y {
            return 0;
        }
        (self.max_x - self.min_x + 1) as usize * (self.max_y - self.min_y + 1) as usize
    }

    /// Lazily enumerates the cartesian product of the x and y intervals,
    /// each tagged with the range's zoom. Coordinates come out un-normalized;
    /// validity filtering and wrapping happen downstream.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> {
        let (min_x, max_x, zoom) = (self.min_x, self.max_x, self.zoom);
        (self.min_y..=self.max_y)
            .flat_map(move |y| (min_x..=max_x).map(move |x| TileCoord::new(x, y, zoom)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_bounds(zoom: u8) -> Bounds {
        let extent = 256.0 * (1u64 << zoom) as f64;
        Bounds::new(Point::new(0.0, 0.0), Point::new(extent, extent))
    }

    #[test]
    fn test_world_bounds_cover_full_pyramid_level() {
        for zoom in [0u8, 1, 3, 7] {
            let range = TileRange::from_pixel_bounds(&world_bounds(zoom), 256, zoom).unwrap();
            let per_axis = 1usize << zoom;
            assert_eq!(range.min_x, 0);
            assert_eq!(range.max_x, per_axis as i32 - 1);
            assert_eq!(range.count(), per_axis * per_axis);
            assert_eq!(range.coords().count(), per_axis * per_axis);
        }
    }

    #[test]
    fn test_exact_boundary_excludes_next_tile() {
        // max edge exactly on a tile boundary: tile 2 only touches, stays out
        let bounds = Bounds::new(Point::new(10.0, 10.0), Point::new(512.0, 512.0));
        let range = TileRange::from_pixel_bounds(&bounds, 256, 3).unwrap();
        assert_eq!((range.min_x, range.max_x), (0, 1));
        assert_eq!((range.min_y, range.max_y), (0, 1));
    }

    #[test]
    fn test_non_finite_bounds_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let bounds = Bounds::new(Point::new(0.0, 0.0), Point::new(bad, 256.0));
            assert_eq!(
                TileRange::from_pixel_bounds(&bounds, 256, 5),
                Err(GridError::DegenerateRange)
            );
        }
    }

    #[test]
    fn test_range_cells_intersect_source_bounds() {
        let bounds = Bounds::new(Point::new(300.0, 520.0), Point::new(900.0, 777.0));
        let range = TileRange::from_pixel_bounds(&bounds, 256, 4).unwrap();
        for coord in range.coords() {
            let cell = Bounds::new(
                Point::new(coord.x as f64 * 256.0, coord.y as f64 * 256.0),
                Point::new((coord.x + 1) as f64 * 256.0, (coord.y + 1) as f64 * 256.0),
            );
            assert!(cell.intersects(&bounds), "cell {coord} misses the bounds");
        }
    }

    #[test]
    fn test_normalize_wraps_x_only() {
        assert_eq!(TileCoord::new(-1, 1, 2).normalized(), TileCoord::new(3, 1, 2));
        assert_eq!(TileCoord::new(5, 1, 2).normalized(), TileCoord::new(1, 1, 2));
        assert_eq!(TileCoord::new(-9, 2, 2).normalized(), TileCoord::new(3, 2, 2));
        // y is untouched even when out of world
        assert_eq!(TileCoord::new(0, -1, 2).normalized().y, -1);
    }

    #[test]
    fn test_wrapped_coords_share_key() {
        let west = TileCoord::new(-1, 0, 1);
        let east = TileCoord::new(1, 0, 1);
        assert_eq!(west.key(), east.key());
        assert_eq!(west.key().to_string(), "1:0:1");
    }

    #[test]
    fn test_validity_filter() {
        assert!(TileCoord::new(0, 0, 5).is_valid(0, 18));
        assert!(TileCoord::new(-3, 0, 5).is_valid(0, 18)); // x wraps, still valid
        assert!(!TileCoord::new(0, -1, 5).is_valid(0, 18));
        assert!(!TileCoord::new(0, 32, 5).is_valid(0, 18));
        assert!(!TileCoord::new(0, 0, 2).is_valid(3, 18));
        assert!(!TileCoord::new(0, 0, 19).is_valid(0, 18));
    }

    #[test]
    fn test_expanded_and_center() {
        let range = TileRange {
            min_x: 2,
            min_y: 4,
            max_x: 4,
            max_y: 6,
            zoom: 5,
        };
        let grown = range.expanded(2);
        assert_eq!((grown.min_x, grown.max_x), (0, 6));
        assert_eq!(range.center(), Point::new(3.0, 5.0));
        assert!(grown.contains(0, 2));
        assert!(!range.contains(0, 2));
    }
}
