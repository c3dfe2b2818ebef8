//! Geographic location value object

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

/// Mean earth radius used for distance and bounding-box math
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position, e.g. the coordinates of a stop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees (-90 to 90)
    latitude: f64,
    /// Longitude in degrees (-180 to 180)
    longitude: f64,
}

impl GeoLocation {
    /// Create a new location with validation
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCoordinates` if latitude is not in [-90, 90]
    /// or longitude is not in [-180, 180]
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Create a location without validation (for trusted sources)
    #[must_use]
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Get the latitude
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Get the longitude
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to another location in meters (Haversine)
    #[must_use]
    pub fn distance_m(&self, other: &Self) -> f64 {
        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (lat1_rad.cos() * lat2_rad.cos()).mul_add(
            (delta_lon / 2.0).sin().powi(2),
            (delta_lat / 2.0).sin().powi(2),
        );
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Corners `(south_west, north_east)` of a box extending `radius_m` in every direction
    ///
    /// Used for map-area stop lookups around a hub's coordinates.
    #[must_use]
    pub fn bounding_box(&self, radius_m: f64) -> (Self, Self) {
        let delta_lat = (radius_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = self.latitude.to_radians().cos().abs().max(f64::EPSILON);
        let delta_lon = (radius_m / (EARTH_RADIUS_M * cos_lat)).to_degrees();

        let south_west = Self::new_unchecked(
            (self.latitude - delta_lat).max(-90.0),
            (self.longitude - delta_lon).max(-180.0),
        );
        let north_east = Self::new_unchecked(
            (self.latitude + delta_lat).min(90.0),
            (self.longitude + delta_lon).min(180.0),
        );
        (south_west, north_east)
    }

    /// Format as the `lat,lon` pair used in API query strings
    #[must_use]
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_coordinates() {
        let loc = GeoLocation::new(49.4521, 11.0767).unwrap();
        assert!((loc.latitude() - 49.4521).abs() < f64::EPSILON);
        assert!((loc.longitude() - 11.0767).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_latitude_rejected() {
        assert!(GeoLocation::new(90.5, 0.0).is_err());
        assert!(GeoLocation::new(-91.0, 0.0).is_err());
    }

    #[test]
    fn invalid_longitude_rejected() {
        assert!(GeoLocation::new(0.0, 180.5).is_err());
        assert!(GeoLocation::new(0.0, -181.0).is_err());
    }

    #[test]
    fn distance_between_nuremberg_stops() {
        // Nürnberg Hbf -> Plärrer, roughly 1.3 km apart
        let hbf = GeoLocation::new_unchecked(49.4459, 11.0823);
        let plaerrer = GeoLocation::new_unchecked(49.4474, 11.0650);
        let distance = hbf.distance_m(&plaerrer);
        assert!(distance > 1_000.0 && distance < 1_500.0, "got {distance}");
    }

    #[test]
    fn bounding_box_contains_center() {
        let center = GeoLocation::new_unchecked(49.4459, 11.0823);
        let (sw, ne) = center.bounding_box(250.0);
        assert!(sw.latitude() < center.latitude() && center.latitude() < ne.latitude());
        assert!(sw.longitude() < center.longitude() && center.longitude() < ne.longitude());

        let north_edge = GeoLocation::new_unchecked(ne.latitude(), center.longitude());
        assert!((center.distance_m(&north_edge) - 250.0).abs() < 1.0);
    }

    #[test]
    fn query_value_format() {
        let loc = GeoLocation::new_unchecked(49.5, 11.25);
        assert_eq!(loc.to_query_value(), "49.5,11.25");
    }

    #[test]
    fn display_format() {
        let loc = GeoLocation::new_unchecked(49.4459, 11.0823);
        assert_eq!(loc.to_string(), "49.445900, 11.082300");
    }
}
