/// WGS 84 equatorial radius (semi-major axis) in meters.
pub const EQUATORIAL_RADIUS: f64 = 6_378_137.0;

/// WGS 84 polar radius (semi-minor axis) in meters.
pub const POLAR_RADIUS: f64 = 6_356_752.3;

/// Working Earth radius in meters.
///
/// Quadratic mean of [`EQUATORIAL_RADIUS`] and [`POLAR_RADIUS`]. Every
/// distance and curvature computation in this crate uses this single
/// radius; it is not corrected for latitude.
#[allow(clippy::excessive_precision)]
pub const EARTH_RADIUS: f64 = 6_367_453.627_405_710_5;
