use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid HGT name {0}")]
    HgtName(PathBuf),

    #[error("invalid HGT file len {0} for {1}")]
    HgtLen(u64, PathBuf),

    #[error("no height files in {0}")]
    NoTiles(PathBuf),

    #[error("invalid ASCII grid, {0}")]
    AsciiGrid(String),

    #[error("{cols}x{rows} grid needs {expected} samples, got {actual}")]
    GridLen {
        cols: usize,
        rows: usize,
        expected: usize,
        actual: usize,
    },

    #[error("cell ({col}, {row}) is outside of {cols}x{rows} raster")]
    OutOfBounds {
        col: usize,
        row: usize,
        cols: usize,
        rows: usize,
    },

    #[error("unsupported raster {0}")]
    Unsupported(PathBuf),

    #[cfg(feature = "gdal")]
    #[error("{0}")]
    Gdal(#[from] gdal::errors::GdalError),
}
