#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle distance engine.
//!
//! Straight-line (haversine) distance between two [`GeoPoint`]s, used to
//! decide whether a driver is within alert range of a hazard segment. All
//! functions are pure and safe to call from any number of threads.

use safe_drive_hazard_models::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres.
///
/// Symmetric in its arguments and exactly `0.0` for identical points. The
/// haversine term is clamped to `[0, 1]` before the inverse trigonometric
/// step, so near-antipodal inputs never produce `NaN`.
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Rounds a distance to the nearest 0.1 km (halves away from zero).
#[must_use]
pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}
