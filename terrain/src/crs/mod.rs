//! Coordinate reference systems described by WKT.
//!
//! Only the forward direction is supported: WGS 84 latitude/longitude
//! to a raster's native coordinates. Datum shifts are not applied, so
//! `TOWGS84` clauses are ignored and every datum is treated as
//! coincident with WGS 84.

mod projection;
pub mod wkt;

pub use self::projection::{
    Ellipsoid, FalseOrigin, LambertAzimuthalEqualArea, Mercator, TransverseMercator,
};
use self::wkt::Node;
use crate::TerrainError;
use log::debug;

const DEGREE: f64 = 0.017_453_292_519_943_295;

/// A parsed coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    method: Method,
    /// Prime meridian longitude in degrees east of Greenwich.
    prime_meridian: f64,
    /// Size of one output unit, in radians for geographic systems and
    /// meters for projected ones.
    unit: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Method {
    Geographic,
    LambertAzimuthalEqualArea(LambertAzimuthalEqualArea),
    TransverseMercator(TransverseMercator),
    Mercator(Mercator),
}

impl Crs {
    /// Parses `text`, a WKT1 or WKT2 geographic or projected CRS.
    pub fn from_wkt(text: &str) -> Result<Self, TerrainError> {
        let root = wkt::parse(text)?;
        let horizontal = if root.is("COMPD_CS") || root.is("COMPOUNDCRS") {
            root.child(&["PROJCS", "PROJCRS", "GEOGCS", "GEOGCRS", "GEODCRS"])
                .ok_or_else(|| cs_err("compound CRS without a horizontal part"))?
        } else {
            &root
        };
        let crs = Self::from_node(horizontal)?;
        debug!("parsed {:?} as {:?}", horizontal.name(), crs.method);
        Ok(crs)
    }

    /// WGS 84 latitude/longitude in degrees.
    #[cfg(test)]
    pub(crate) fn wgs84() -> Self {
        Self {
            method: Method::Geographic,
            prime_meridian: 0.0,
            unit: DEGREE,
        }
    }

    pub fn is_geographic(&self) -> bool {
        self.method == Method::Geographic
    }

    /// Projects a WGS 84 coordinate given in degrees.
    ///
    /// Returns `(x, y)` in this system's axis convention: `x` is the
    /// easting or longitude and `y` the northing or latitude.
    pub fn project(&self, lat: f64, long: f64) -> (f64, f64) {
        let long = long - self.prime_meridian;
        if self.is_geographic() && is_degree(self.unit) {
            return (long, lat);
        }
        let (lat, lon) = (lat.to_radians(), long.to_radians());
        let (x, y) = match &self.method {
            Method::Geographic => (lon, lat),
            Method::LambertAzimuthalEqualArea(p) => p.project(lat, lon),
            Method::TransverseMercator(p) => p.project(lat, lon),
            Method::Mercator(p) => p.project(lat, lon),
        };
        (x / self.unit, y / self.unit)
    }

    fn from_node(node: &Node) -> Result<Self, TerrainError> {
        match node.keyword.to_ascii_uppercase().as_str() {
            "GEOGCS" | "GEOGCRS" | "GEODCRS" | "BASEGEOGCRS" | "BASEGEODCRS" => {
                let angle_unit = angle_unit(node);
                Ok(Self {
                    method: Method::Geographic,
                    prime_meridian: prime_meridian(node, angle_unit),
                    unit: angle_unit,
                })
            }
            "PROJCS" | "PROJCRS" => Self::projected(node),
            other => Err(cs_err(format!("unsupported CRS type {other}"))),
        }
    }

    fn projected(node: &Node) -> Result<Self, TerrainError> {
        let base = node
            .child(&["GEOGCS", "BASEGEOGCRS", "BASEGEODCRS"])
            .ok_or_else(|| cs_err("projected CRS without a base geographic CRS"))?;
        let ellipsoid = ellipsoid(base)?;
        let angle_unit = angle_unit(base);
        let prime_meridian = prime_meridian(base, angle_unit);

        // WKT1 keeps the method and parameters directly under PROJCS,
        // WKT2 nests them in CONVERSION.
        let conversion = node.child(&["CONVERSION"]).unwrap_or(node);
        let method_name = conversion
            .child(&["PROJECTION", "METHOD"])
            .and_then(Node::name)
            .ok_or_else(|| cs_err("projected CRS without a projection method"))?;
        let unit = linear_unit(node);
        let params = Params {
            node: conversion,
            angle_unit,
            linear_unit: unit,
        };

        let origin = FalseOrigin {
            easting: params.length(&["falseeasting", "eastingatfalseorigin"])?,
            northing: params.length(&["falsenorthing", "northingatfalseorigin"])?,
        };
        let lat0 = || {
            params.angle(&[
                "latitudeofcenter",
                "latitudeoforigin",
                "latitudeofnaturalorigin",
                "latitudeofprojectioncentre",
            ])
        };
        let lon0 = || {
            params.angle(&[
                "longitudeofcenter",
                "centralmeridian",
                "longitudeofnaturalorigin",
                "longitudeoforigin",
                "longitudeofprojectioncentre",
            ])
        };
        let k0 = || params.scale(&["scalefactor", "scalefactoratnaturalorigin"]);

        let method = match normalize(method_name).as_str() {
            "lambertazimuthalequalarea" => Method::LambertAzimuthalEqualArea(
                LambertAzimuthalEqualArea::new(ellipsoid, lat0()?, lon0()?, origin),
            ),
            "transversemercator" => Method::TransverseMercator(TransverseMercator::new(
                ellipsoid,
                lat0()?,
                lon0()?,
                k0()?,
                origin,
            )),
            "popularvisualisationpseudomercator" => {
                Method::Mercator(Mercator::pseudo(ellipsoid, lon0()?, origin))
            }
            "mercator1sp" | "mercatorvarianta" if is_pseudo_mercator(node) => {
                Method::Mercator(Mercator::pseudo(ellipsoid, lon0()?, origin))
            }
            "mercator1sp" | "mercatorvarianta" => {
                Method::Mercator(Mercator::new(ellipsoid, lon0()?, k0()?, origin))
            }
            _ => return Err(cs_err(format!("unsupported projection {method_name}"))),
        };

        Ok(Self {
            method,
            prime_meridian,
            unit,
        })
    }
}

fn cs_err(msg: impl Into<String>) -> TerrainError {
    TerrainError::CoordinateSystem(msg.into())
}

/// Lowercases `name` and drops everything but letters and digits, so
/// that `Lambert_Azimuthal_Equal_Area` matches `Lambert Azimuthal Equal
/// Area`.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn ellipsoid(base: &Node) -> Result<Ellipsoid, TerrainError> {
    let node = base
        .find(&["SPHEROID", "ELLIPSOID"])
        .ok_or_else(|| cs_err("geographic CRS without an ellipsoid"))?;
    match (node.num(0), node.num(1)) {
        (Some(a), Some(rf)) if a > 0.0 => {
            // WKT2 may give the semi-major axis in a unit other than
            // meters.
            let to_meters = node
                .child(&["LENGTHUNIT"])
                .and_then(|u| u.num(0))
                .unwrap_or(1.0);
            Ok(Ellipsoid::from_inverse_flattening(a * to_meters, rf))
        }
        _ => Err(cs_err(format!("invalid ellipsoid {:?}", node.name()))),
    }
}

/// Radians per angular unit of a geographic CRS, degrees when
/// unspecified.
fn angle_unit(geog: &Node) -> f64 {
    geog.child(&["UNIT", "ANGLEUNIT"])
        .or_else(|| geog.find(&["ANGLEUNIT"]))
        .and_then(|unit| unit.num(0))
        .filter(|factor| *factor > 0.0)
        .unwrap_or(DEGREE)
}

/// WKT rounds the degree to `0.0174532925199433`; anything that close
/// is taken as exactly one degree so geographic coordinates pass through
/// unchanged.
fn is_degree(unit: f64) -> bool {
    ((unit - DEGREE) / DEGREE).abs() < 1e-12
}

/// Prime meridian in degrees east of Greenwich.
fn prime_meridian(geog: &Node, angle_unit: f64) -> f64 {
    geog.child(&["PRIMEM", "PRIMEMERIDIAN"])
        .and_then(|pm| {
            let value = pm.num(0)?;
            let factor = pm
                .child(&["ANGLEUNIT"])
                .and_then(|u| u.num(0))
                .unwrap_or(angle_unit);
            Some(if is_degree(factor) {
                value
            } else {
                (value * factor).to_degrees()
            })
        })
        .unwrap_or(0.0)
}

/// Meters per linear unit of a projected CRS, meters when unspecified.
fn linear_unit(proj: &Node) -> f64 {
    proj.child(&["UNIT", "LENGTHUNIT"])
        .or_else(|| {
            proj.children()
                .filter(|n| n.is("AXIS"))
                .find_map(|axis| axis.child(&["LENGTHUNIT"]))
        })
        .and_then(|unit| unit.num(0))
        .filter(|factor| *factor > 0.0)
        .unwrap_or(1.0)
}

/// GDAL describes EPSG:3857 in WKT1 as `Mercator_1SP` on the WGS 84
/// ellipsoid, flagged by its EPSG code or a spherical PROJ4 extension.
fn is_pseudo_mercator(proj: &Node) -> bool {
    let by_code = proj.child(&["AUTHORITY", "ID"]).is_some_and(|id| {
        let code = match id.args.get(1) {
            Some(wkt::Value::Str(code)) => code.parse().ok(),
            Some(wkt::Value::Num(code)) => Some(*code),
            _ => None,
        };
        matches!(code, Some(c) if c == 3857.0 || c == 900_913.0)
    });
    let by_proj4 = proj.child(&["EXTENSION"]).is_some_and(|ext| {
        ext.args.iter().any(|arg| {
            matches!(arg, wkt::Value::Str(s) if s.contains("+proj=merc") && s.contains("+b=6378137"))
        })
    });
    by_code || by_proj4
}

/// Looks up projection parameters by normalized name.
struct Params<'a> {
    node: &'a Node,
    angle_unit: f64,
    linear_unit: f64,
}

impl<'a> Params<'a> {
    fn get(&self, names: &[&str]) -> Option<&'a Node> {
        self.node
            .children()
            .filter(|n| n.is("PARAMETER"))
            .find(|n| n.name().is_some_and(|name| names.contains(&normalize(name).as_str())))
    }

    fn value(&self, names: &[&str], unit_keyword: &str, default_unit: f64) -> Option<f64> {
        let param = self.get(names)?;
        let value = param.num(0)?;
        let factor = param
            .child(&[unit_keyword])
            .and_then(|u| u.num(0))
            .unwrap_or(default_unit);
        Some(value * factor)
    }

    /// Angle in radians; a missing parameter is an error.
    fn angle(&self, names: &[&str]) -> Result<f64, TerrainError> {
        self.value(names, "ANGLEUNIT", self.angle_unit)
            .ok_or_else(|| cs_err(format!("missing parameter {}", names[0])))
    }

    /// Length in meters; a missing parameter is 0.
    fn length(&self, names: &[&str]) -> Result<f64, TerrainError> {
        Ok(self
            .value(names, "LENGTHUNIT", self.linear_unit)
            .unwrap_or(0.0))
    }

    /// Scale factor; a missing parameter is 1.
    fn scale(&self, names: &[&str]) -> Result<f64, TerrainError> {
        Ok(self.value(names, "SCALEUNIT", 1.0).unwrap_or(1.0))
    }
}
