//! ESRI ASCII grid (`.asc`) rasters.
//!
//! ```text
//! ncols         4
//! nrows         2
//! xllcorner     3000000
//! yllcorner     2999950
//! cellsize      25
//! NODATA_value  -9999
//! 150 151 152 -9999
//! 149 150 151 152
//! ```
//!
//! The CRS is read from a `.prj` sidecar next to the grid when there is
//! one, and defaults to WGS 84 otherwise.

use crate::{DemError, GeoTransform, Grid, Raster, WGS84_WKT};
use log::debug;
use std::{borrow::Cow, path::Path};

#[derive(Debug, Clone, PartialEq)]
pub struct AsciiGrid(Grid);

#[derive(Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<(f64, bool)>,
    yll: Option<(f64, bool)>,
    cellsize: Option<f64>,
    no_data: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
enum Key {
    NCols,
    NRows,
    XllCorner,
    XllCenter,
    YllCorner,
    YllCenter,
    CellSize,
    NoData,
}

impl Key {
    const ALL: [Self; 8] = [
        Self::NCols,
        Self::NRows,
        Self::XllCorner,
        Self::XllCenter,
        Self::YllCorner,
        Self::YllCenter,
        Self::CellSize,
        Self::NoData,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::NCols => "ncols",
            Self::NRows => "nrows",
            Self::XllCorner => "xllcorner",
            Self::XllCenter => "xllcenter",
            Self::YllCorner => "yllcorner",
            Self::YllCenter => "yllcenter",
            Self::CellSize => "cellsize",
            Self::NoData => "nodata_value",
        }
    }

    /// Header keys are case insensitive. Anything else starts the body.
    fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| token.eq_ignore_ascii_case(key.as_str()))
    }
}

impl AsciiGrid {
    /// Loads the grid at `path` and its optional `.prj` sidecar.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let prj = path.with_extension("prj");
        let projection = if prj.exists() {
            debug!("reading CRS from {prj:?}");
            std::fs::read_to_string(prj)?.trim().to_owned()
        } else {
            WGS84_WKT.to_owned()
        };
        Self::parse(&text, projection)
    }

    /// Parses grid `text` georeferenced in `projection`.
    pub fn parse(text: &str, projection: impl Into<String>) -> Result<Self, DemError> {
        let mut tokens = text.split_whitespace().peekable();
        let mut header = Header::default();

        while let Some(key) = tokens.peek().and_then(|t| Key::from_token(t)) {
            tokens.next();
            let name = key.as_str();
            let value = tokens
                .next()
                .ok_or_else(|| DemError::AsciiGrid(format!("missing value for {name}")))?;
            match key {
                Key::NCols => header.ncols = Some(parse(name, value)?),
                Key::NRows => header.nrows = Some(parse(name, value)?),
                Key::XllCorner => header.xll = Some((parse(name, value)?, false)),
                Key::XllCenter => header.xll = Some((parse(name, value)?, true)),
                Key::YllCorner => header.yll = Some((parse(name, value)?, false)),
                Key::YllCenter => header.yll = Some((parse(name, value)?, true)),
                Key::CellSize => header.cellsize = Some(parse(name, value)?),
                Key::NoData => header.no_data = Some(parse(name, value)?),
            }
        }

        let missing = |key: &str| DemError::AsciiGrid(format!("missing {key}"));
        let cols = header.ncols.ok_or_else(|| missing("ncols"))?;
        let rows = header.nrows.ok_or_else(|| missing("nrows"))?;
        let cellsize = header.cellsize.ok_or_else(|| missing("cellsize"))?;
        let (xll, x_center) = header.xll.ok_or_else(|| missing("xllcorner"))?;
        let (yll, y_center) = header.yll.ok_or_else(|| missing("yllcorner"))?;

        let half = cellsize / 2.0;
        let west = if x_center { xll - half } else { xll };
        let south = if y_center { yll - half } else { yll };
        #[allow(clippy::cast_precision_loss)]
        let north = south + rows as f64 * cellsize;
        let geo_transform = GeoTransform::north_up(west, cellsize, north, -cellsize);

        let samples = tokens
            .map(|t| parse("sample", t))
            .collect::<Result<Vec<f64>, _>>()?;

        Grid::new(projection, geo_transform, (cols, rows), samples, header.no_data).map(Self)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DemError> {
    value
        .parse()
        .map_err(|_| DemError::AsciiGrid(format!("bad {key} {value:?}")))
}

impl Raster for AsciiGrid {
    fn projection(&self) -> Cow<'_, str> {
        self.0.projection()
    }

    fn geo_transform(&self) -> GeoTransform {
        self.0.geo_transform()
    }

    fn size(&self) -> (usize, usize) {
        self.0.size()
    }

    fn no_data(&self) -> Option<f64> {
        self.0.no_data()
    }

    fn read(&self, col: usize, row: usize) -> Result<f64, DemError> {
        self.0.read(col, row)
    }
}
