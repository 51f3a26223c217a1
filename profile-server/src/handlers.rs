//! HTTP request handlers for the profile service.

use axum::{
    extract::{rejection::QueryRejection, Query, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dem::DemError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use terrain::{
    geo::geometry::Coord, math::distance_between_wgs84_coordinates,
    sampler::read_value_from_wgs84, Altitude, PlotStyle, Profile, ProfileFormat, TerrainError,
};

use crate::AppState;

/// Largest sample count a single request may ask for.
pub const MAX_SAMPLES: usize = 100_000;

/// Query parameters of the profile endpoints.
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub first_lat: f64,
    pub first_long: f64,
    pub second_lat: f64,
    pub second_long: f64,
    /// Line of sight altitude at the first point, in meters. Defaults
    /// to 0.
    pub height1: Option<f64>,
    /// Line of sight altitude at the second point, in meters. Defaults
    /// to 0.
    pub height2: Option<f64>,
    /// Whether `height1` is above ground (default) or above sea level.
    #[serde(default = "above_ground")]
    pub above_ground1: bool,
    /// Whether `height2` is above ground (default) or above sea level.
    #[serde(default = "above_ground")]
    pub above_ground2: bool,
    /// Number of samples, endpoints included.
    pub samples: Option<usize>,
    /// PNG plot style.
    #[serde(default)]
    pub style: PlotStyle,
}

fn above_ground() -> bool {
    true
}

impl ProfileQuery {
    fn build(&self, raster: &dyn dem::Raster, default_samples: usize) -> Result<Profile, TerrainError> {
        let samples = self.samples.unwrap_or(default_samples);
        if samples > MAX_SAMPLES {
            return Err(TerrainError::InvalidRequest(format!(
                "at most {MAX_SAMPLES} samples may be requested"
            )));
        }
        let altitude = |height: Option<f64>, above_ground: bool| {
            let height = height.unwrap_or_default();
            if above_ground {
                Altitude::AboveGround(height)
            } else {
                Altitude::AboveSea(height)
            }
        };
        Profile::builder()
            .start(Coord {
                x: self.first_long,
                y: self.first_lat,
            })
            .start_altitude(altitude(self.height1, self.above_ground1))
            .end(Coord {
                x: self.second_long,
                y: self.second_lat,
            })
            .end_altitude(altitude(self.height2, self.above_ground2))
            .samples(samples)
            .build(raster)
    }
}

/// Query parameters of the elevation endpoint.
#[derive(Debug, Deserialize)]
pub struct ElevationQuery {
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Serialize)]
pub struct ElevationResponse {
    pub lat: f64,
    pub long: f64,
    /// Elevation in meters, `null` where the DEM has no data.
    pub elevation: Option<f64>,
}

/// Query parameters of the distance endpoint.
#[derive(Debug, Deserialize)]
pub struct DistanceQuery {
    pub first_lat: f64,
    pub first_long: f64,
    pub second_lat: f64,
    pub second_long: f64,
}

#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    /// Great-circle distance in meters.
    pub distance: f64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// A failed request, rendered as [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl From<TerrainError> for ApiError {
    fn from(e: TerrainError) -> Self {
        let status = match &e {
            TerrainError::InvalidRequest(_)
            | TerrainError::Builder
            | TerrainError::SampleOutOfRange { .. }
            | TerrainError::NoDataAtEndpoint(_)
            | TerrainError::Shape { .. }
            | TerrainError::Dem(DemError::OutOfBounds { .. }) => StatusCode::BAD_REQUEST,
            TerrainError::CoordinateSystem(_) | TerrainError::UnsupportedTransform => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Runs `f` against the shared raster on the blocking pool.
async fn with_raster<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn dem::Raster, usize) -> Result<T, TerrainError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let raster = state
            .raster
            .lock()
            .map_err(|_| ApiError::internal("raster lock poisoned"))?;
        f(&**raster, state.samples).map_err(ApiError::from)
    })
    .await
    .map_err(ApiError::internal)?
}

/// `GET /profile` redirects to the JSON profile, keeping the query.
pub async fn profile_redirect(RawQuery(query): RawQuery) -> impl IntoResponse {
    let location = match query {
        Some(query) => format!("/profile/json?{query}"),
        None => "/profile/json".to_owned(),
    };
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)])
}

/// Profile as parallel JSON arrays.
pub async fn get_profile_json(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<Json<Profile>, ApiError> {
    let Query(query) = query?;
    tracing::debug!(?query, "profile query");
    let profile = with_raster(state, move |raster, samples| query.build(raster, samples)).await?;
    tracing::info!(
        samples = profile.len(),
        distance = profile.total_distance(),
        "profile generated"
    );
    Ok(Json(profile))
}

/// Profile rendered as a PNG chart.
pub async fn get_profile_png(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    tracing::debug!(?query, "profile plot query");
    let format = ProfileFormat::Png(query.style);
    let png = with_raster(state, move |raster, samples| {
        format.to_bytes(&query.build(raster, samples)?)
    })
    .await?;
    Ok(([(header::CONTENT_TYPE, format.mime())], png).into_response())
}

/// Terrain elevation at one point.
pub async fn get_elevation(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ElevationQuery>, QueryRejection>,
) -> Result<Json<ElevationResponse>, ApiError> {
    let Query(ElevationQuery { lat, long }) = query?;
    let elevation = with_raster(state, move |raster, _| {
        read_value_from_wgs84(raster, lat, long)
    })
    .await?;
    tracing::debug!(lat, long, elevation = ?elevation, "elevation query");
    Ok(Json(ElevationResponse {
        lat,
        long,
        elevation: elevation.value(),
    }))
}

/// Great-circle distance between two points.
pub async fn get_distance(
    query: Result<Query<DistanceQuery>, QueryRejection>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let Query(q) = query?;
    let distance =
        distance_between_wgs84_coordinates(q.first_lat, q.first_long, q.second_lat, q.second_long);
    Ok(Json(DistanceResponse { distance }))
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
