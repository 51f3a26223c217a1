use crate::constants::EARTH_RADIUS;
use num_traits::{Float, FromPrimitive};

/// Returns half of the central angle between two points, in radians.
///
/// Inputs are radians. Uses the Haversine formula, which stays well
/// conditioned for nearby points. The result is in `[0, π/2]`.
pub fn half_central_angle<T: Float>(lat1: T, long1: T, lat2: T, long2: T) -> T {
    let two = T::one() + T::one();
    let d_lat = ((lat2 - lat1) / two).sin();
    let d_long = ((long2 - long1) / two).sin();
    let h = d_lat * d_lat + lat1.cos() * lat2.cos() * d_long * d_long;
    // Rounding can push `h` a hair above 1 for antipodes.
    h.min(T::one()).sqrt().asin()
}

/// Returns the great-circle distance in meters between two WGS 84
/// coordinates given in degrees.
pub fn distance_between_wgs84_coordinates<T>(lat1: T, long1: T, lat2: T, long2: T) -> T
where
    T: Float + FromPrimitive,
{
    let two = T::one() + T::one();
    let radius = T::from_f64(EARTH_RADIUS).unwrap_or_else(T::max_value);
    two * half_central_angle(
        lat1.to_radians(),
        long1.to_radians(),
        lat2.to_radians(),
        long2.to_radians(),
    ) * radius
}
