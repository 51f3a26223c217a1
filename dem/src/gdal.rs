//! Rasters read through GDAL (GeoTIFF and every other driver GDAL
//! ships).

use crate::{DemError, GeoTransform, Raster};
use gdal::Dataset;
use std::{borrow::Cow, path::Path};

/// First band of a GDAL dataset.
pub struct GdalRaster {
    dataset: Dataset,
    projection: String,
    geo_transform: GeoTransform,
    size: (usize, usize),
    no_data: Option<f64>,
}

impl GdalRaster {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let dataset = Dataset::open(path.as_ref())?;
        let projection = dataset.projection();
        let geo_transform = GeoTransform(dataset.geo_transform()?);
        let size = dataset.raster_size();
        let no_data = dataset.rasterband(1)?.no_data_value();
        Ok(Self {
            dataset,
            projection,
            geo_transform,
            size,
            no_data,
        })
    }
}

impl Raster for GdalRaster {
    fn projection(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.projection)
    }

    fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    fn read(&self, col: usize, row: usize) -> Result<f64, DemError> {
        let (cols, rows) = self.size;
        if col >= cols || row >= rows {
            return Err(DemError::OutOfBounds {
                col,
                row,
                cols,
                rows,
            });
        }
        let band = self.dataset.rasterband(1)?;
        #[allow(clippy::cast_possible_wrap)]
        let buf = band.read_as::<f64>((col as isize, row as isize), (1, 1), (1, 1), None)?;
        Ok(buf.data()[0])
    }
}
