//! Great-circle distance between two points

use std::f64::consts::PI;

use crate::constants::geo::EARTH_DIAMETER_KM;

/// Distance in kilometres between two (lat, lon) points given in degrees
///
/// Haversine in its `0.5 - cos/2` form. Clients compare results against the
/// values this exact arithmetic produces, so keep the operation order.
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p = PI / 180.0;
    let a = 0.5 - ((lat1 - lat2) * p).cos() / 2.0
        + (lat1 * p).cos() * (lat2 * p).cos() * (1.0 - ((lon1 - lon2) * p).cos()) / 2.0;

    EARTH_DIAMETER_KM * a.sqrt().asin()
}
