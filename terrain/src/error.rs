use dem::DemError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("missing required parameters")]
    Builder,

    #[error("coordinate system, {0}")]
    CoordinateSystem(String),

    #[error("rotated geo-transforms are not supported")]
    UnsupportedTransform,

    #[error("sample ({col}, {row}) is outside of {cols}x{rows} raster")]
    SampleOutOfRange {
        col: i64,
        row: i64,
        cols: usize,
        rows: usize,
    },

    #[error("invalid request, {0}")]
    InvalidRequest(String),

    #[error("no data at {0} endpoint, sight is undefined")]
    NoDataAtEndpoint(&'static str),

    #[error("batch operands have different lengths {expected} and {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("{0}")]
    Dem(#[from] DemError),

    #[error("plot, {0}")]
    Plot(String),

    #[error("config, {0}")]
    Config(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
