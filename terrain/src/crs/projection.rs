//! Forward map projections from geodetic coordinates.
//!
//! Formulas follow Snyder, _Map Projections: A Working Manual_ (USGS
//! Professional Paper 1395) and IOGP guidance note 7-2. All angles are
//! radians; outputs are meters before false easting/northing.

use std::f64::consts::FRAC_PI_2;
use std::f64::consts::FRAC_PI_4;

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in meters.
    pub a: f64,
    /// First eccentricity squared.
    pub es: f64,
}

impl Ellipsoid {
    pub const WGS84: Self = Self {
        a: 6_378_137.0,
        es: 0.006_694_379_990_141_317,
    };

    /// `inverse_flattening == 0` describes a sphere, as in WKT.
    pub fn from_inverse_flattening(a: f64, inverse_flattening: f64) -> Self {
        let es = if inverse_flattening == 0.0 {
            0.0
        } else {
            let f = 1.0 / inverse_flattening;
            f * (2.0 - f)
        };
        Self { a, es }
    }

    pub fn e(&self) -> f64 {
        self.es.sqrt()
    }
}

/// Offsets applied after projecting, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FalseOrigin {
    pub easting: f64,
    pub northing: f64,
}

/// Lambert Azimuthal Equal Area, ellipsoidal form (EPSG method 9820).
#[derive(Debug, Clone, PartialEq)]
pub struct LambertAzimuthalEqualArea {
    ellipsoid: Ellipsoid,
    lon0: f64,
    origin: FalseOrigin,
    aspect: Aspect,
    qp: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Aspect {
    North,
    South,
    Oblique { sin_b0: f64, cos_b0: f64, rq: f64, d: f64 },
}

impl LambertAzimuthalEqualArea {
    pub fn new(ellipsoid: Ellipsoid, lat0: f64, lon0: f64, origin: FalseOrigin) -> Self {
        let qp = authalic_q(&ellipsoid, FRAC_PI_2);
        let aspect = if (lat0 - FRAC_PI_2).abs() < 1e-10 {
            Aspect::North
        } else if (lat0 + FRAC_PI_2).abs() < 1e-10 {
            Aspect::South
        } else {
            let Ellipsoid { a, es } = ellipsoid;
            let b0 = (authalic_q(&ellipsoid, lat0) / qp).asin();
            let rq = a * (qp / 2.0).sqrt();
            let d = a * lat0.cos() / (1.0 - es * lat0.sin().powi(2)).sqrt() / (rq * b0.cos());
            Aspect::Oblique {
                sin_b0: b0.sin(),
                cos_b0: b0.cos(),
                rq,
                d,
            }
        };
        Self {
            ellipsoid,
            lon0,
            origin,
            aspect,
            qp,
        }
    }

    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let q = authalic_q(&self.ellipsoid, lat);
        let dlon = lon - self.lon0;
        let FalseOrigin { easting, northing } = self.origin;
        match self.aspect {
            Aspect::North => {
                let rho = self.ellipsoid.a * (self.qp - q).max(0.0).sqrt();
                (easting + rho * dlon.sin(), northing - rho * dlon.cos())
            }
            Aspect::South => {
                let rho = self.ellipsoid.a * (self.qp + q).max(0.0).sqrt();
                (easting + rho * dlon.sin(), northing + rho * dlon.cos())
            }
            Aspect::Oblique {
                sin_b0,
                cos_b0,
                rq,
                d,
            } => {
                let beta = (q / self.qp).clamp(-1.0, 1.0).asin();
                let (sin_b, cos_b) = beta.sin_cos();
                let b = rq * (2.0 / (1.0 + sin_b0 * sin_b + cos_b0 * cos_b * dlon.cos())).sqrt();
                (
                    easting + b * d * cos_b * dlon.sin(),
                    northing + (b / d) * (cos_b0 * sin_b - sin_b0 * cos_b * dlon.cos()),
                )
            }
        }
    }
}

/// Snyder's `q`, proportional to the area between the equator and
/// `lat`.
fn authalic_q(ellipsoid: &Ellipsoid, lat: f64) -> f64 {
    let es = ellipsoid.es;
    let sin = lat.sin();
    if es == 0.0 {
        return 2.0 * sin;
    }
    let e = ellipsoid.e();
    (1.0 - es)
        * (sin / (1.0 - es * sin * sin) - (1.0 / (2.0 * e)) * ((1.0 - e * sin) / (1.0 + e * sin)).ln())
}

/// Transverse Mercator (EPSG method 9807), Snyder's series. UTM zones
/// are instances of it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    k0: f64,
    origin: FalseOrigin,
    m0: f64,
}

impl TransverseMercator {
    pub fn new(ellipsoid: Ellipsoid, lat0: f64, lon0: f64, k0: f64, origin: FalseOrigin) -> Self {
        Self {
            ellipsoid,
            lon0,
            k0,
            origin,
            m0: meridian_arc(&ellipsoid, lat0),
        }
    }

    /// UTM zone `zone` of the WGS 84 ellipsoid.
    #[cfg(test)]
    pub(crate) fn utm(zone: u8, north: bool) -> Self {
        let lon0 = (f64::from(zone) * 6.0 - 183.0).to_radians();
        let origin = FalseOrigin {
            easting: 500_000.0,
            northing: if north { 0.0 } else { 10_000_000.0 },
        };
        Self::new(Ellipsoid::WGS84, 0.0, lon0, 0.9996, origin)
    }

    #[allow(clippy::many_single_char_names)]
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let Ellipsoid { a, es } = self.ellipsoid;
        let ep2 = es / (1.0 - es);
        let (sin, cos) = lat.sin_cos();
        let n = a / (1.0 - es * sin * sin).sqrt();
        let t = (sin / cos).powi(2);
        let c = ep2 * cos * cos;
        let a_ = (lon - self.lon0) * cos;
        let m = meridian_arc(&self.ellipsoid, lat);

        let x = self.k0
            * n
            * (a_
                + (1.0 - t + c) * a_.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a_.powi(5) / 120.0);
        let y = self.k0
            * (m - self.m0
                + n * (sin / cos)
                    * (a_ * a_ / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a_.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a_.powi(6)
                            / 720.0));
        (self.origin.easting + x, self.origin.northing + y)
    }
}

/// Distance along the meridian from the equator to `lat`.
fn meridian_arc(ellipsoid: &Ellipsoid, lat: f64) -> f64 {
    let Ellipsoid { a, es } = *ellipsoid;
    let e4 = es * es;
    let e6 = e4 * es;
    a * ((1.0 - es / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * es / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// Mercator, variant A (EPSG method 9804, `Mercator_1SP`).
#[derive(Debug, Clone, PartialEq)]
pub struct Mercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    k0: f64,
    origin: FalseOrigin,
}

impl Mercator {
    pub fn new(ellipsoid: Ellipsoid, lon0: f64, k0: f64, origin: FalseOrigin) -> Self {
        Self {
            ellipsoid,
            lon0,
            k0,
            origin,
        }
    }

    /// Popular Visualisation Pseudo Mercator (EPSG method 1024): the
    /// spherical formulas applied with the ellipsoid's semi-major axis.
    pub fn pseudo(ellipsoid: Ellipsoid, lon0: f64, origin: FalseOrigin) -> Self {
        Self::new(
            Ellipsoid {
                a: ellipsoid.a,
                es: 0.0,
            },
            lon0,
            1.0,
            origin,
        )
    }

    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let Ellipsoid { a, es } = self.ellipsoid;
        let e = es.sqrt();
        let sin = lat.sin();
        let conformal = ((1.0 - e * sin) / (1.0 + e * sin)).powf(e / 2.0);
        let x = a * self.k0 * (lon - self.lon0);
        let y = a * self.k0 * ((FRAC_PI_4 + lat / 2.0).tan() * conformal).ln();
        (self.origin.easting + x, self.origin.northing + y)
    }
}
