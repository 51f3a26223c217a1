//! Great-circle and Earth-curvature math.
//!
//! Every function here has a scalar form, generic over
//! [`num_traits::Float`], and an element-wise form in [`batch`].

pub mod batch;
mod curvature;
mod haversine;
mod linspace;

pub use self::{
    curvature::{overhead_height, quadratic_mean},
    haversine::{distance_between_wgs84_coordinates, half_central_angle},
    linspace::linspace,
};
