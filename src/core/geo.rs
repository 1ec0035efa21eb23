use serde::{Deserialize, Serialize};

/// Web Mercator projection constants
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the Mercator Y coordinate diverges: arctan(sinh(π)).
/// Latitudes are clamped here, never rejected.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Represents a geographical coordinate with latitude and longitude (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = lng % 360.0;
        if wrapped > 180.0 {
            wrapped - 360.0
        } else if wrapped < -180.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }

    /// Clamps latitude to the projectable range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Converts to Web Mercator / EPSG:3857 projected meters.
    ///
    /// Latitude is clamped to ±[`MAX_LATITUDE`] first, so any valid longitude
    /// maps to finite coordinates within ±π·R on both axes.
    pub fn to_mercator(&self) -> Point {
        let lat = Self::clamp_lat(self.lat).to_radians();
        let sin = lat.sin();
        let x = EARTH_RADIUS * self.lng.to_radians();
        let y = EARTH_RADIUS * ((1.0 + sin) / (1.0 - sin)).ln() / 2.0;
        Point::new(x, y)
    }

    /// Creates LatLng from Web Mercator coordinates
    pub fn from_mercator(point: Point) -> Self {
        let lng = (point.x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (point.y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        Self::new(lat, lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in pixel or projected-meter coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_mercator_x_linear_in_longitude() {
        let lat = 37.5;
        let a = LatLng::new(lat, 10.0).to_mercator().x;
        let b = LatLng::new(lat, 20.0).to_mercator().x;
        let c = LatLng::new(lat, 30.0).to_mercator().x;
        assert!((b - a - (c - b)).abs() < 1e-6);
        // and proportional to the radian longitude
        assert!((a - EARTH_RADIUS * 10f64.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_mercator_is_deterministic() {
        let p = LatLng::new(48.210033, 16.363449);
        assert_eq!(p.to_mercator(), p.to_mercator());
    }

    #[test]
    fn test_latitude_clamped_at_poles() {
        let pole = LatLng::new(90.0, -73.0).to_mercator();
        let limit = LatLng::new(MAX_LATITUDE, -73.0).to_mercator();
        assert!(pole.y.is_finite());
        assert!((pole.y - limit.y).abs() < 1e-6);
        // the clamped Y lands on the projection's square bound
        assert!((pole.y - PI * EARTH_RADIUS).abs() < 1.0);
    }

    #[test]
    fn test_mercator_known_point() {
        // Vienna, cross-checked against proj4 EPSG:4326 -> EPSG:3857
        let vienna = LatLng::new(48.210033, 16.363449).to_mercator();
        assert!((vienna.x - 1_821_567.0).abs() < 100.0);
        assert!((vienna.y - 6_141_868.0).abs() < 100.0);
    }

    #[test]
    fn test_mercator_roundtrip() {
        let original = LatLng::new(41.85, -87.65);
        let back = LatLng::from_mercator(original.to_mercator());
        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lng - original.lng).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_lng() {
        assert_eq!(LatLng::wrap_lng(190.0), -170.0);
        assert_eq!(LatLng::wrap_lng(-190.0), 170.0);
        assert_eq!(LatLng::wrap_lng(540.0), 180.0);
        assert_eq!(LatLng::wrap_lng(45.0), 45.0);
    }
}
