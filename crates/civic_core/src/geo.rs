use crate::error::{CivicError, CivicResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Rejects NaN/infinite components and out-of-range degrees.
    pub fn validate(&self, field: &str) -> CivicResult<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(CivicError::invalid_input(field, "coordinate is not finite"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CivicError::invalid_input(
                field,
                format!("latitude {} outside [-90, 90]", self.latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CivicError::invalid_input(
                field,
                format!("longitude {} outside [-180, 180]", self.longitude),
            ));
        }
        Ok(())
    }

    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        haversine_m(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Haversine great-circle distance between two lat/lon points in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1_r.cos() * lat2_r.cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push `a` a hair above 1 for antipodal points
    let c = 2.0 * a.min(1.0).sqrt().asin();
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let p = Coordinate::new(53.9872, 86.6621);
        assert!(p.distance_m(&p) < 1e-6);
    }

    #[test]
    fn barnaul_to_novokuznetsk() {
        // roughly 225 km apart by great circle
        let barnaul = Coordinate::new(53.3548, 83.7698);
        let novokuznetsk = Coordinate::new(53.7596, 87.1216);
        let dist = barnaul.distance_m(&novokuznetsk);
        assert!((dist - 225_000.0).abs() < 10_000.0, "got {dist}");
    }

    #[test]
    fn one_millidegree_latitude_is_about_111_meters() {
        let a = Coordinate::new(54.0, 86.0);
        let b = Coordinate::new(54.001, 86.0);
        let dist = a.distance_m(&b);
        assert!((dist - 111.2).abs() < 0.5, "got {dist}");
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(Coordinate::new(91.0, 0.0).validate("location").is_err());
        assert!(Coordinate::new(0.0, -180.5).validate("location").is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).validate("location").is_err());
        assert!(Coordinate::new(-90.0, 180.0).validate("location").is_ok());
    }
}
