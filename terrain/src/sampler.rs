//! WGS 84 coordinates to raster samples.
//!
//! A lookup goes through three steps: reproject the coordinate into the
//! raster's CRS ([`transform_from_wgs84`]), invert the raster's affine
//! geo-transform ([`compute_offset`]) and read the cell
//! ([`read_value`]). Each step has a batch form used by the profiler.

use crate::{crs::Crs, TerrainError};
use dem::{GeoTransform, Raster};
use log::debug;
use serde::{Deserialize, Serialize};

/// A raster cell value.
///
/// Serializes as a number, or `null` for [`Sample::NoData`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Sample {
    Value(f64),
    /// The cell holds the band's no-data sentinel.
    NoData,
}

impl Sample {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoData => None,
        }
    }

    /// Classifies raw cell value `v` against the band's `no_data`
    /// sentinel. A NaN sentinel matches NaN cells.
    pub fn classify(v: f64, no_data: Option<f64>) -> Self {
        match no_data {
            Some(nd) if v == nd || (nd.is_nan() && v.is_nan()) => Self::NoData,
            _ => Self::Value(v),
        }
    }
}

impl From<Sample> for Option<f64> {
    fn from(sample: Sample) -> Self {
        sample.value()
    }
}

impl From<Option<f64>> for Sample {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::NoData, Self::Value)
    }
}

/// Projects WGS 84 `lat`/`long` (degrees) into the CRS described by
/// `wkt`.
///
/// The result is `(x, y)`: longitude, or easting, comes first.
pub fn transform_from_wgs84(wkt: &str, lat: f64, long: f64) -> Result<(f64, f64), TerrainError> {
    Projector::new(wkt)?
        .project(&[lat], &[long])?
        .pop()
        .ok_or_else(|| TerrainError::InvalidRequest(format!("({lat}, {long}) has no projection")))
}

/// Batch form of [`transform_from_wgs84`], parsing `wkt` once.
pub fn transform_from_wgs84_batch(
    wkt: &str,
    lats: &[f64],
    longs: &[f64],
) -> Result<Vec<(f64, f64)>, TerrainError> {
    check_len(lats.len(), longs.len())?;
    Projector::new(wkt)?.project(lats, longs)
}

/// WGS 84 to raster CRS transformation.
///
/// With GDAL available every CRS OSR understands is supported, except
/// for geographic systems which stay on the exact built-in path.
enum Projector {
    Builtin(Crs),
    #[cfg(feature = "gdal")]
    Gdal(gdal::spatial_ref::CoordTransform),
}

impl Projector {
    fn new(wkt: &str) -> Result<Self, TerrainError> {
        let crs = Crs::from_wkt(wkt);
        #[cfg(feature = "gdal")]
        {
            if !matches!(&crs, Ok(crs) if crs.is_geographic()) {
                return gdal_transform(wkt).map(Self::Gdal);
            }
        }
        crs.map(Self::Builtin)
    }

    fn project(&self, lats: &[f64], longs: &[f64]) -> Result<Vec<(f64, f64)>, TerrainError> {
        match self {
            Self::Builtin(crs) => Ok(lats
                .iter()
                .zip(longs)
                .map(|(&lat, &long)| crs.project(lat, long))
                .collect()),
            #[cfg(feature = "gdal")]
            Self::Gdal(transform) => {
                let mut xs = longs.to_vec();
                let mut ys = lats.to_vec();
                transform
                    .transform_coords(&mut xs, &mut ys, &mut [])
                    .map_err(|e| TerrainError::CoordinateSystem(e.to_string()))?;
                Ok(xs.into_iter().zip(ys).collect())
            }
        }
    }
}

/// OSR transformation from WGS 84 to `wkt`, both sides in traditional
/// GIS order so that longitude and easting come first.
#[cfg(feature = "gdal")]
fn gdal_transform(wkt: &str) -> Result<gdal::spatial_ref::CoordTransform, TerrainError> {
    use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};

    let cs_err = |e: gdal::errors::GdalError| TerrainError::CoordinateSystem(e.to_string());
    let mut wgs84 = SpatialRef::from_epsg(4326).map_err(cs_err)?;
    wgs84.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    let mut target = SpatialRef::from_wkt(wkt).map_err(cs_err)?;
    target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    debug!("reprojecting through OSR");
    CoordTransform::new(&wgs84, &target).map_err(cs_err)
}

/// Returns the `(col, row)` of the cell containing projected `(x, y)`.
///
/// Fails with [`TerrainError::UnsupportedTransform`] for rotated
/// transforms.
pub fn compute_offset(gt: &GeoTransform, x: f64, y: f64) -> Result<(i64, i64), TerrainError> {
    if !gt.is_north_up() {
        return Err(TerrainError::UnsupportedTransform);
    }
    let col = ((x - gt.origin_x()) / gt.pixel_width()).floor();
    let row = ((y - gt.origin_y()) / gt.pixel_height()).floor();
    if !(col.is_finite() && row.is_finite()) {
        return Err(TerrainError::InvalidRequest(format!(
            "({x}, {y}) has no pixel offset"
        )));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok((col as i64, row as i64))
}

/// Batch form of [`compute_offset`].
pub fn compute_offsets(
    gt: &GeoTransform,
    points: &[(f64, f64)],
) -> Result<Vec<(i64, i64)>, TerrainError> {
    points
        .iter()
        .map(|&(x, y)| compute_offset(gt, x, y))
        .collect()
}

/// Reads the cell at `(col, row)`.
///
/// Offsets outside of the raster fail with
/// [`TerrainError::SampleOutOfRange`].
pub fn read_value<R>(raster: &R, col: i64, row: i64) -> Result<Sample, TerrainError>
where
    R: Raster + ?Sized,
{
    let (col, row) = checked_offset(raster, (col, row))?;
    let v = raster.read(col, row)?;
    Ok(Sample::classify(v, raster.no_data()))
}

/// Reads the cell containing WGS 84 `lat`/`long`.
pub fn read_value_from_wgs84<R>(raster: &R, lat: f64, long: f64) -> Result<Sample, TerrainError>
where
    R: Raster + ?Sized,
{
    let (x, y) = transform_from_wgs84(&raster.projection(), lat, long)?;
    let (col, row) = compute_offset(&raster.geo_transform(), x, y)?;
    read_value(raster, col, row)
}

/// Batch form of [`read_value_from_wgs84`].
///
/// Every offset is bounds checked before any cell is read, so a failure
/// reads nothing.
pub fn read_values_from_wgs84<R>(
    raster: &R,
    lats: &[f64],
    longs: &[f64],
) -> Result<Vec<Sample>, TerrainError>
where
    R: Raster + ?Sized,
{
    let points = transform_from_wgs84_batch(&raster.projection(), lats, longs)?;
    let offsets = compute_offsets(&raster.geo_transform(), &points)?
        .into_iter()
        .map(|offset| checked_offset(raster, offset))
        .collect::<Result<Vec<_>, _>>()?;
    if let (Some(first), Some(last)) = (offsets.first(), offsets.last()) {
        debug!("reading {} cells from {first:?} to {last:?}", offsets.len());
    }
    let no_data = raster.no_data();
    Ok(raster
        .read_batch(&offsets)?
        .into_iter()
        .map(|v| Sample::classify(v, no_data))
        .collect())
}

fn checked_offset<R>(raster: &R, (col, row): (i64, i64)) -> Result<(usize, usize), TerrainError>
where
    R: Raster + ?Sized,
{
    let (cols, rows) = raster.size();
    match (usize::try_from(col), usize::try_from(row)) {
        (Ok(c), Ok(r)) if c < cols && r < rows => Ok((c, r)),
        _ => Err(TerrainError::SampleOutOfRange {
            col,
            row,
            cols,
            rows,
        }),
    }
}

fn check_len(expected: usize, actual: usize) -> Result<(), TerrainError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TerrainError::Shape { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        compute_offset, compute_offsets, read_value, read_value_from_wgs84,
        read_values_from_wgs84, transform_from_wgs84, transform_from_wgs84_batch, Sample,
    };
    use crate::{crs::tests::ETRS89_LAEA_WKT, TerrainError};
    use approx::assert_abs_diff_eq;
    use dem::{GeoTransform, Grid, WGS84_WKT};

    const EU_DEM_TRANSFORM: GeoTransform =
        GeoTransform::north_up(3_000_000.0, 25.0, 3_000_000.0, -25.0);

    /// 1°x1° grid with 0.1° cells over 43°N..44°N, 1°E..2°E whose cell
    /// values are `row * 10 + col`, and `-9999` at (3, 2).
    fn grid() -> Grid {
        Grid::from_fn(
            WGS84_WKT,
            GeoTransform::north_up(1.0, 0.1, 44.0, -0.1),
            (10, 10),
            Some(-9999.0),
            |col, row| {
                if (col, row) == (3, 2) {
                    -9999.0
                } else {
                    (row * 10 + col) as f64
                }
            },
        )
    }

    #[test]
    fn test_transform_swaps_to_long_lat() {
        let (x, y) = transform_from_wgs84(WGS84_WKT, 43.561_725, 1.444_796).unwrap();
        assert_abs_diff_eq!(x, 1.444_796, epsilon = 1e-9);
        assert_abs_diff_eq!(y, 43.561_725, epsilon = 1e-9);
    }

    #[test]
    fn test_transform_laea() {
        let (x, y) = transform_from_wgs84(ETRS89_LAEA_WKT, 43.561_725, 1.444_796).unwrap();
        assert_abs_diff_eq!(x, 3_629_726.988, epsilon = 0.01);
        assert_abs_diff_eq!(y, 2_312_017.944, epsilon = 0.01);

        let points =
            transform_from_wgs84_batch(ETRS89_LAEA_WKT, &[43.561_725, 50.0], &[1.444_796, 5.0])
                .unwrap();
        assert_abs_diff_eq!(points[0].0, x);
        assert_abs_diff_eq!(points[1].0, 3_962_799.45, epsilon = 0.01);
    }

    /// EPSG:3035 with `AXIS` after `AUTHORITY` and the linear `UNIT`
    /// ahead of `PROJECTION`.
    const EPSG3035_WKT: &str = r#"PROJCS["ETRS89 / ETRS-LAEA",
    GEOGCS["ETRS89",
        DATUM["European_Terrestrial_Reference_System_1989",
            SPHEROID["GRS 1980",6378137,298.257222101,
                AUTHORITY["EPSG","7019"]],
            AUTHORITY["EPSG","6258"]],
        PRIMEM["Greenwich",0,
            AUTHORITY["EPSG","8901"]],
        UNIT["degree",0.01745329251994328,
            AUTHORITY["EPSG","9122"]],
        AUTHORITY["EPSG","4258"]],
    UNIT["metre",1,
        AUTHORITY["EPSG","9001"]],
    PROJECTION["Lambert_Azimuthal_Equal_Area"],
    PARAMETER["latitude_of_center",52],
    PARAMETER["longitude_of_center",10],
    PARAMETER["false_easting",4321000],
    PARAMETER["false_northing",3210000],
    AUTHORITY["EPSG","3035"],
    AXIS["X",EAST],
    AXIS["Y",NORTH]]"#;

    #[test]
    fn test_eu_dem_pixel() {
        let (x, y) = transform_from_wgs84(EPSG3035_WKT, 43.602_091, 1.441_183).unwrap();
        assert_abs_diff_eq!(x, 3_629_916.385_801, epsilon = 0.001);
        assert_abs_diff_eq!(y, 2_316_502.956_137, epsilon = 0.001);
        assert_eq!(
            compute_offset(&EU_DEM_TRANSFORM, x, y).unwrap(),
            (25_196, 27_339)
        );
    }

    #[test]
    fn test_cell_boundary_lands_in_next_cell() {
        let (x, y) = transform_from_wgs84(WGS84_WKT, 1.0, 1.0).unwrap();
        assert_eq!((x, y), (1.0, 1.0));
        let gt = GeoTransform::north_up(0.0, 1.0, 2.0, -1.0);
        assert_eq!(compute_offset(&gt, x, y).unwrap(), (1, 1));

        // Quarter degree cells, so every corner is exact.
        let grid = Grid::from_fn(
            WGS84_WKT,
            GeoTransform::north_up(1.0, 0.25, 44.0, -0.25),
            (4, 4),
            None,
            |col, row| (row * 10 + col) as f64,
        );
        assert_eq!(
            read_value_from_wgs84(&grid, 43.5, 1.25).unwrap(),
            Sample::Value(21.0)
        );
        assert_eq!(
            read_values_from_wgs84(&grid, &[43.5, 43.75, 44.0], &[1.25, 1.5, 1.0]).unwrap(),
            vec![Sample::Value(21.0), Sample::Value(12.0), Sample::Value(0.0)]
        );
    }

    #[test]
    fn test_transform_errors() {
        assert!(matches!(
            transform_from_wgs84("GEOGCS[", 0.0, 0.0),
            Err(TerrainError::CoordinateSystem(_))
        ));
        assert!(matches!(
            transform_from_wgs84_batch(WGS84_WKT, &[0.0], &[]),
            Err(TerrainError::Shape { .. })
        ));
    }

    #[test]
    fn test_compute_offset() {
        assert_eq!(
            compute_offset(&EU_DEM_TRANSFORM, 3_629_916.385_801, 2_316_502.956_137).unwrap(),
            (25_196, 27_339)
        );
        // Offsets floor, they never round.
        assert_eq!(
            compute_offsets(&EU_DEM_TRANSFORM, &[(3_000_024.9, 2_999_975.1), (2_999_999.0, 3_000_001.0)])
                .unwrap(),
            vec![(0, 0), (-1, -1)]
        );
    }

    #[test]
    fn test_compute_offset_rotated() {
        let rotated = GeoTransform([3_000_000.0, 25.0, 0.5, 3_000_000.0, 0.0, -25.0]);
        assert!(matches!(
            compute_offset(&rotated, 3_000_100.0, 2_999_900.0),
            Err(TerrainError::UnsupportedTransform)
        ));
        let rotated = GeoTransform([3_000_000.0, 25.0, 0.0, 3_000_000.0, -0.5, -25.0]);
        assert!(matches!(
            compute_offset(&rotated, 3_000_100.0, 2_999_900.0),
            Err(TerrainError::UnsupportedTransform)
        ));
    }

    #[test]
    fn test_read_value() {
        let grid = grid();
        assert_eq!(read_value(&grid, 4, 7).unwrap(), Sample::Value(74.0));
        assert_eq!(read_value(&grid, 3, 2).unwrap(), Sample::NoData);
        for (col, row) in [(-1, 0), (0, -1), (10, 0), (0, 10)] {
            assert!(matches!(
                read_value(&grid, col, row),
                Err(TerrainError::SampleOutOfRange { cols: 10, rows: 10, .. })
            ));
        }
    }

    #[test]
    fn test_nan_no_data() {
        let grid = Grid::from_fn(
            WGS84_WKT,
            GeoTransform::north_up(0.0, 1.0, 1.0, -1.0),
            (2, 1),
            Some(f64::NAN),
            |col, _| if col == 0 { f64::NAN } else { 12.5 },
        );
        assert_eq!(read_value(&grid, 0, 0).unwrap(), Sample::NoData);
        assert_eq!(read_value(&grid, 1, 0).unwrap(), Sample::Value(12.5));
    }

    #[test]
    fn test_read_value_from_wgs84() {
        let grid = grid();
        assert_eq!(
            read_value_from_wgs84(&grid, 43.25, 1.45).unwrap(),
            Sample::Value(74.0)
        );
        assert_eq!(
            read_value_from_wgs84(&grid, 43.75, 1.35).unwrap(),
            Sample::NoData
        );
        assert!(matches!(
            read_value_from_wgs84(&grid, 45.0, 1.5),
            Err(TerrainError::SampleOutOfRange { .. })
        ));
        assert_eq!(
            read_values_from_wgs84(&grid, &[43.95, 43.25, 43.75], &[1.05, 1.45, 1.35]).unwrap(),
            vec![Sample::Value(0.0), Sample::Value(74.0), Sample::NoData]
        );
    }

    #[test]
    fn test_batch_fails_whole() {
        let grid = grid();
        assert!(matches!(
            read_values_from_wgs84(&grid, &[43.5, 42.0], &[1.5, 1.5]),
            Err(TerrainError::SampleOutOfRange { .. })
        ));
    }

    #[test]
    fn test_sample_serde() {
        let json = serde_json::to_string(&[Sample::Value(1.5), Sample::NoData]).unwrap();
        assert_eq!(json, "[1.5,null]");
        let back: Vec<Sample> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Sample::Value(1.5), Sample::NoData]);
    }
}
