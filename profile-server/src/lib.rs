//! HTTP handlers and router for the profile service.
//!
//! Used by both the `profile-server` binary and the integration tests.

pub mod handlers;

use axum::{routing::get, Router};
use dem::Raster;
use std::sync::{Arc, Mutex};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use handlers::{
    DistanceQuery, DistanceResponse, ElevationQuery, ElevationResponse, ErrorResponse,
    HealthResponse, ProfileQuery,
};

/// Application state shared across handlers.
pub struct AppState {
    /// The one DEM every request samples. Held for the duration of a
    /// single lookup or profile.
    pub raster: Mutex<Box<dyn Raster + Send>>,
    /// Sample count of profiles which don't ask for one.
    pub samples: usize,
}

impl AppState {
    pub fn new<R>(raster: R, samples: usize) -> Self
    where
        R: Raster + Send + 'static,
    {
        Self {
            raster: Mutex::new(Box::new(raster)),
            samples,
        }
    }
}

/// Builds the service's router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(handlers::profile_redirect))
        .route("/profile/json", get(handlers::get_profile_json))
        .route("/profile/png", get(handlers::get_profile_png))
        .route("/elevation", get(handlers::get_elevation))
        .route("/distance", get(handlers::get_distance))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
