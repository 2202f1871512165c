//! Geographic coordinates and their projection onto a sphere
//!
//! Latitude is measured from the equatorial plane and longitude around the
//! polar (Y) axis. Longitude 0 faces +Z, which is where the default camera
//! sits, so a point at (0°, 0°) lands in the middle of the first frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f32,
    longitude: f32,
}

impl GeoPoint {
    /// Create a point from radians
    pub fn new(latitude: f32, longitude: f32) -> Self {
        Self { latitude, longitude }
    }

    /// Create a point from survey coordinates in degrees
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: latitude.to_radians() as f32,
            longitude: longitude.to_radians() as f32,
        }
    }

    /// Latitude in radians
    pub fn latitude(&self) -> f32 {
        self.latitude
    }

    /// Longitude in radians
    pub fn longitude(&self) -> f32 {
        self.longitude
    }
}

/// Survey coordinates as they appear in settings files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoDegrees {
    #[serde(rename = "lat")]
    pub lat: f64,
    #[serde(rename = "lng")]
    pub lng: f64,
}

impl GeoDegrees {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn to_geo_point(self) -> GeoPoint {
        GeoPoint::from_degrees(self.lat, self.lng)
    }
}

/// A point on the surface of a sphere of some radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpherePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SpherePoint {
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Distance from the sphere's center
    pub fn radius(&self) -> f32 {
        self.as_vec3().length()
    }
}

impl From<Vec3> for SpherePoint {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

/// Project a geographic point onto a sphere of the given radius
pub fn project(point: GeoPoint, radius: f32) -> SpherePoint {
    let (sin_lat, cos_lat) = point.latitude.sin_cos();
    let (sin_lng, cos_lng) = point.longitude.sin_cos();
    SpherePoint {
        x: cos_lat * sin_lng * radius,
        y: sin_lat * radius,
        z: cos_lat * cos_lng * radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-5;

    #[test]
    fn test_origin_faces_camera() {
        let p = project(GeoPoint::new(0.0, 0.0), 2.5);
        assert_eq!(p, SpherePoint { x: 0.0, y: 0.0, z: 2.5 });
    }

    #[test]
    fn test_north_pole() {
        let p = project(GeoPoint::new(FRAC_PI_2, 0.0), 1.3);
        assert!(p.x.abs() < EPS);
        assert!((p.y - 1.3).abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn test_east_is_positive_x() {
        let p = project(GeoPoint::new(0.0, FRAC_PI_2), 1.0);
        assert!((p.x - 1.0).abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn test_distance_equals_radius() {
        for radius in [0.5_f32, 1.0, 1.3, 1.5, 10.0] {
            for lat_step in -6..=6 {
                for lng_step in -12..=12 {
                    let lat = lat_step as f32 * (FRAC_PI_2 / 6.0);
                    let lng = lng_step as f32 * (PI / 12.0);
                    let p = project(GeoPoint::new(lat, lng), radius);
                    assert!(
                        (p.radius() - radius).abs() < radius * EPS,
                        "lat={lat} lng={lng} r={radius} got {}",
                        p.radius()
                    );
                }
            }
        }
    }

    #[test]
    fn test_projection_is_reproducible() {
        let seoul = GeoPoint::from_degrees(37.56668, 126.97841);
        assert_eq!(project(seoul, 1.3), project(seoul, 1.3));
    }

    #[test]
    fn test_from_degrees() {
        let p = GeoPoint::from_degrees(90.0, -180.0);
        assert!((p.latitude() - FRAC_PI_2).abs() < EPS);
        assert!((p.longitude() + PI).abs() < EPS);
    }
}
