//! Digital elevation model raster sources.
//!
//! Every source in this crate implements [`Raster`]: a single numeric
//! band addressed by integer `(col, row)` offsets, georeferenced by a
//! north-up affine [`GeoTransform`] in the coordinate reference system
//! described by [`Raster::projection`] (Well-Known-Text).
//!
//! Coordinate handling (reprojection, pixel offsets, no-data
//! detection) lives in the `terrain` crate; rasters here only know how
//! to describe themselves and read cells.

mod ascii;
mod error;
#[cfg(feature = "gdal")]
mod gdal;
mod grid;
mod hgt;
mod mosaic;
mod transform;

#[cfg(feature = "gdal")]
pub use crate::gdal::GdalRaster;
pub use crate::{
    ascii::AsciiGrid,
    error::DemError,
    grid::Grid,
    hgt::{Tile, TileMode, VOID},
    mosaic::Mosaic,
    transform::GeoTransform,
};
use std::{borrow::Cow, path::Path};

/// WKT of the WGS 84 geographic coordinate system (EPSG:4326).
pub const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;

/// A single-band georeferenced raster.
pub trait Raster {
    /// Coordinate reference system as Well-Known-Text.
    fn projection(&self) -> Cow<'_, str>;

    /// Affine transform from pixel offsets to projected coordinates.
    fn geo_transform(&self) -> GeoTransform;

    /// Number of (columns, rows).
    fn size(&self) -> (usize, usize);

    /// No-data sentinel of the band, if it declares one.
    fn no_data(&self) -> Option<f64>;

    /// Reads the raw cell value at `(col, row)`.
    fn read(&self, col: usize, row: usize) -> Result<f64, DemError>;

    /// Reads the raw cell values at each of `offsets`, in order.
    fn read_batch(&self, offsets: &[(usize, usize)]) -> Result<Vec<f64>, DemError> {
        offsets.iter().map(|&(col, row)| self.read(col, row)).collect()
    }
}

impl<R: Raster + ?Sized> Raster for Box<R> {
    fn projection(&self) -> Cow<'_, str> {
        (**self).projection()
    }

    fn geo_transform(&self) -> GeoTransform {
        (**self).geo_transform()
    }

    fn size(&self) -> (usize, usize) {
        (**self).size()
    }

    fn no_data(&self) -> Option<f64> {
        (**self).no_data()
    }

    fn read(&self, col: usize, row: usize) -> Result<f64, DemError> {
        (**self).read(col, row)
    }

    fn read_batch(&self, offsets: &[(usize, usize)]) -> Result<Vec<f64>, DemError> {
        (**self).read_batch(offsets)
    }
}

/// Opens the raster at `path`, picking a source from its shape.
///
/// - a directory is a [`Mosaic`] of `.hgt` tiles
/// - `*.hgt` is a single memory-mapped [`Tile`]
/// - `*.asc` is an [`AsciiGrid`]
/// - anything else is handed to GDAL when built with the `gdal`
///   feature
pub fn open<P: AsRef<Path>>(path: P) -> Result<Box<dyn Raster + Send>, DemError> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(Box::new(Mosaic::new(path.to_owned(), TileMode::MemMap)?));
    }
    let ext = path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("hgt") => Ok(Box::new(Tile::memmap(path)?)),
        Some("asc") => Ok(Box::new(AsciiGrid::load(path)?)),
        #[cfg(feature = "gdal")]
        _ => Ok(Box::new(GdalRaster::open(path)?)),
        #[cfg(not(feature = "gdal"))]
        _ => Err(DemError::Unsupported(path.to_owned())),
    }
}
