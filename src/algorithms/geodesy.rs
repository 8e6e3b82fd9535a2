//! Spherical-earth geodesy used by the navigation loop
//!
//! All functions are pure and take degrees. Distances are meters on a sphere
//! of radius [`EARTH_RADIUS_M`].

use crate::core::{Coordinate, EARTH_RADIUS_M};
use nalgebra::Vector3;

/// Initial forward azimuth from `from` to `to`, degrees in `[0, 360)`
///
/// Identical points yield 0.
pub fn bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    let theta = y.atan2(x).to_degrees();
    (theta + 360.0) % 360.0
}

/// Haversine great-circle distance in meters
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Destination reached by travelling `distance_m` from `origin` along the
/// great circle with initial bearing `bearing_deg`
pub fn project(origin: &Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.latitude.to_radians();
    let lambda1 = origin.longitude.to_radians();

    let sin_phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).clamp(-1.0, 1.0);
    let phi2 = sin_phi2.asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    Coordinate::new(phi2.to_degrees(), normalize_longitude(lambda2.to_degrees()))
}

/// Wrap a longitude into `(-180, 180]`
pub fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Earth-centred unit vector (n-vector) for a coordinate
pub fn to_n_vector(coordinate: &Coordinate) -> Vector3<f64> {
    let phi = coordinate.latitude.to_radians();
    let lambda = coordinate.longitude.to_radians();
    Vector3::new(phi.cos() * lambda.cos(), phi.cos() * lambda.sin(), phi.sin())
}

/// Signed distance (m) of `position` from the great circle through
/// `start` and `end`, positive to the right of the direction of travel
///
/// A degenerate leg (`start` and `end` coincide or are antipodal) has no
/// defined track, so the plain distance from `start` is returned.
pub fn cross_track_distance(start: &Coordinate, end: &Coordinate, position: &Coordinate) -> f64 {
    let normal = to_n_vector(start).cross(&to_n_vector(end));
    let norm = normal.norm();
    if norm < 1e-12 {
        return distance(start, position);
    }

    let sin_offset = (normal / norm).dot(&to_n_vector(position)).clamp(-1.0, 1.0);
    // The normal points to the left of travel
    -sin_offset.asin() * EARTH_RADIUS_M
}
