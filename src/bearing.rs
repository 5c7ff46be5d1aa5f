//! Great-circle bearing and distance on a spherical Earth

use crate::math::{DEG_TO_RAD, RAD_TO_DEG, normalize_degrees};
use crate::types::GeoPoint;

/// The Kaaba in Mecca, the fixed target of every bearing
pub const KAABA: GeoPoint = GeoPoint {
    latitude: 21.422487,
    longitude: 39.826206,
};

/// Mean Earth radius in metres
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Below this both atan2 arguments are treated as zero
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Initial bearing of the great circle from `observer` to `target`
///
/// Degrees clockwise from true north, within `[0, 360)`. When the bearing is
/// undefined (observer at the target, or at its antipode) this returns `0.0`.
///
/// # Example
/// ```
/// use qibla_compass::{GeoPoint, initial_bearing};
///
/// let origin = GeoPoint::new(0.0, 0.0).unwrap();
/// let east = GeoPoint::new(0.0, 1.0).unwrap();
/// assert!((initial_bearing(origin, east) - 90.0).abs() < 1e-9);
/// ```
pub fn initial_bearing(observer: GeoPoint, target: GeoPoint) -> f64 {
    let observer_lat = observer.latitude * DEG_TO_RAD;
    let target_lat = target.latitude * DEG_TO_RAD;
    let delta_lon = (target.longitude - observer.longitude) * DEG_TO_RAD;

    let y = delta_lon.sin() * target_lat.cos();
    let x = observer_lat.cos() * target_lat.sin()
        - observer_lat.sin() * target_lat.cos() * delta_lon.cos();

    if y.abs() < DEGENERATE_EPSILON && x.abs() < DEGENERATE_EPSILON {
        return 0.0;
    }

    normalize_degrees(y.atan2(x) * RAD_TO_DEG)
}

/// Bearing from `observer` to the Kaaba
pub fn qibla_bearing(observer: GeoPoint) -> f64 {
    initial_bearing(observer, KAABA)
}

/// Haversine distance between two points, in metres
pub fn distance_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let from_lat = from.latitude * DEG_TO_RAD;
    let to_lat = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + from_lat.cos() * to_lat.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}
