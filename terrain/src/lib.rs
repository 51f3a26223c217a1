//! Earth-curvature corrected elevation profiles.
//!
//! A [`Profile`] is an equally spaced cross-section of a DEM raster
//! between two WGS 84 points, along with the great-circle distance of
//! each sample, the height of the Earth's bulge above the chord
//! joining the endpoints and a straight line of sight.

pub mod config;
pub mod constants;
pub mod crs;
mod error;
mod format;
pub mod math;
pub mod plot;
mod profile;
pub mod sampler;

pub use crate::{
    config::Config,
    constants::EARTH_RADIUS,
    error::TerrainError,
    format::ProfileFormat,
    plot::PlotStyle,
    profile::{Altitude, Profile, ProfileBuilder, ProfilePoint, DEFAULT_SAMPLES},
    sampler::Sample,
};
pub use dem;
pub use geo;
