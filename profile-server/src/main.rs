//! profile-server: HTTP service for terrain profiles.
//!
//! ## Endpoints
//!
//! - `GET /profile` - Redirects to `/profile/json`
//! - `GET /profile/json?first_lat=&first_long=&second_lat=&second_long=` - Profile as JSON
//! - `GET /profile/png?...&style=` - Profile plot
//! - `GET /elevation?lat=&long=` - Terrain elevation at a point
//! - `GET /distance?first_lat=&first_long=&second_lat=&second_long=` - Great-circle distance
//! - `GET /health` - Health check
//!
//! `RUST_LOG` sets the log level, `profile_server=info,tower_http=info`
//! by default.

use anyhow::{Context, Error as AnyError};
use clap::Parser;
use dem::Raster;
use profile_server::{app, AppState};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use terrain::{Config, DEFAULT_SAMPLES};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serve terrain profiles over HTTP.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// DEM raster, or directory of .hgt tiles. Defaults to `[dem]
    /// location` in config.toml.
    #[arg(short, long, env = "GEOPROFILE_DEM")]
    dem: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short, long, env = "GEOPROFILE_PORT", default_value_t = 8080)]
    port: u16,

    /// Sample count of profiles which don't ask for one.
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLES)]
    samples: usize,
}

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Cli { dem, port, samples } = Cli::parse();

    let path = match dem {
        Some(path) => path,
        None => Config::discover()?.dem_location(None)?,
    };
    let raster = dem::open(&path).with_context(|| format!("opening {}", path.display()))?;
    tracing::info!(
        dem = %path.display(),
        size = ?raster.size(),
        samples,
        port,
        "starting profile server"
    );

    let state = Arc::new(AppState {
        raster: raster.into(),
        samples,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
