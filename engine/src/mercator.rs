//! Web-mercator helpers.
//!
//! Mercator coordinates are normalized to [0, 1] on both axes, x growing east
//! and y growing south. Altitudes are expressed in the same units when used as
//! a z coordinate.

use std::f64::consts::PI;

/// Equatorial circumference of the WGS84 ellipsoid, in metres.
pub const EARTH_CIRCUMFERENCE: f64 = 2.0 * PI * 6_378_137.0;

pub fn mercator_x_from_lng(lng: f64) -> f64 {
    (180.0 + lng) / 360.0
}

pub fn mercator_y_from_lat(lat: f64) -> f64 {
    (180.0 - (180.0 / PI) * (PI / 4.0 + lat * PI / 360.0).tan().ln()) / 360.0
}

pub fn lat_from_mercator_y(y: f64) -> f64 {
    let y2 = 180.0 - y * 360.0;
    360.0 / PI * (y2 * PI / 180.0).exp().atan() - 90.0
}

/// Mercator units per metre at a latitude.
pub fn mercator_z_from_altitude(altitude: f64, lat: f64) -> f64 {
    altitude / (EARTH_CIRCUMFERENCE * lat.to_radians().cos())
}

/// Metres per mercator unit at a latitude.
pub fn meters_per_mercator_unit(lat: f64) -> f64 {
    EARTH_CIRCUMFERENCE * lat.to_radians().cos()
}

/// Longitude/latitude in degrees to normalized mercator.
pub fn lng_lat_to_mercator(lng: f64, lat: f64) -> [f64; 2] {
    [mercator_x_from_lng(lng), mercator_y_from_lat(lat)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_center() {
        let [x, y] = lng_lat_to_mercator(0.0, 0.0);
        assert!((x - 0.5).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_latitude_round_trip() {
        for lat in [-70.0, -12.5, 0.0, 33.3, 80.0] {
            let back = lat_from_mercator_y(mercator_y_from_lat(lat));
            assert!((back - lat).abs() < 1e-9, "{lat} -> {back}");
        }
    }

    #[test]
    fn test_north_is_up() {
        assert!(mercator_y_from_lat(60.0) < mercator_y_from_lat(10.0));
    }
}
