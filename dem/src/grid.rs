use crate::{DemError, GeoTransform, Raster};
use std::borrow::Cow;

/// An in-memory raster.
///
/// Samples are stored row-major, starting with the row at
/// `geo_transform.origin_y()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    projection: String,
    geo_transform: GeoTransform,
    cols: usize,
    rows: usize,
    no_data: Option<f64>,
    samples: Box<[f64]>,
}

impl Grid {
    pub fn new(
        projection: impl Into<String>,
        geo_transform: GeoTransform,
        (cols, rows): (usize, usize),
        samples: Vec<f64>,
        no_data: Option<f64>,
    ) -> Result<Self, DemError> {
        let expected = cols * rows;
        if samples.len() != expected {
            return Err(DemError::GridLen {
                cols,
                rows,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            projection: projection.into(),
            geo_transform,
            cols,
            rows,
            no_data,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Returns a grid whose cells are filled by `f(col, row)`.
    pub fn from_fn<F>(
        projection: impl Into<String>,
        geo_transform: GeoTransform,
        (cols, rows): (usize, usize),
        no_data: Option<f64>,
        mut f: F,
    ) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let samples = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (col, row)))
            .map(|(col, row)| f(col, row))
            .collect();
        Self {
            projection: projection.into(),
            geo_transform,
            cols,
            rows,
            no_data,
            samples,
        }
    }
}

impl Raster for Grid {
    fn projection(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.projection)
    }

    fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    fn size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    fn read(&self, col: usize, row: usize) -> Result<f64, DemError> {
        if col < self.cols && row < self.rows {
            Ok(self.samples[row * self.cols + col])
        } else {
            Err(DemError::OutOfBounds {
                col,
                row,
                cols: self.cols,
                rows: self.rows,
            })
        }
    }
}
