mod options;

use anyhow::{Context, Error as AnyError};
use clap::Parser;
use dem::Raster;
use log::debug;
use options::{Cli, Command as CliCmd, DemArgs, Destination, LatLon, Output, ProfileArgs};
use std::io::Write;
use terrain::{
    math::distance_between_wgs84_coordinates, sampler::read_value_from_wgs84, Config, Profile,
    ProfileFormat, Sample,
};
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    let Cli { cmd } = Cli::parse();

    env_logger::init();

    match cmd {
        CliCmd::Distance { start, end } => distance(start, end),
        CliCmd::Elevation { dem, point } => elevation(&dem, point),
        CliCmd::Profile(args) => profile(&args),
    }
}

fn open_dem(args: &DemArgs) -> Result<Box<dyn Raster + Send>, AnyError> {
    let path = match &args.dem {
        Some(path) => path.clone(),
        None => Config::discover()?.dem_location(None)?,
    };
    debug!("using DEM {:?}", path);
    let raster = dem::open(&path).with_context(|| format!("opening {}", path.display()))?;
    Ok(raster)
}

fn distance(LatLon(start): LatLon, LatLon(end): LatLon) -> Result<(), AnyError> {
    let meters = distance_between_wgs84_coordinates(start.y, start.x, end.y, end.x);
    println!("{meters}");
    Ok(())
}

fn elevation(dem: &DemArgs, LatLon(point): LatLon) -> Result<(), AnyError> {
    let raster = open_dem(dem)?;
    match read_value_from_wgs84(&raster, point.y, point.x)? {
        Sample::Value(elevation) => println!("{elevation}"),
        Sample::NoData => println!("no data"),
    }
    Ok(())
}

fn profile(args: &ProfileArgs) -> Result<(), AnyError> {
    let raster = open_dem(&args.dem)?;

    let mut builder = Profile::builder()
        .start(args.start.0)
        .end(args.end.0)
        .samples(args.samples);
    if let Some(altitude) = args.start_altitude() {
        builder = builder.start_altitude(altitude);
    }
    if let Some(altitude) = args.end_altitude() {
        builder = builder.end_altitude(altitude);
    }
    let profile = builder.build(&raster)?;

    let format = match args.output {
        Output::Json => ProfileFormat::Json,
        Output::Csv => ProfileFormat::Csv,
        Output::Png => ProfileFormat::Png(args.style),
        Output::Plot => {
            plot_ascii(&profile);
            return Ok(());
        }
    };

    match args.destination(format) {
        Destination::File(path) => format.write_to_file(&profile, path)?,
        Destination::Stdout => {
            let mut stdout = std::io::stdout().lock();
            format.write_to(&profile, &mut stdout)?;
            if !matches!(format, ProfileFormat::Png(_)) {
                writeln!(stdout)?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Draws the curvature corrected terrain and the line of sight, in
/// meters over kilometers.
fn plot_ascii(profile: &Profile) {
    #[allow(clippy::cast_possible_truncation)]
    let terrain: Vec<(f32, f32)> = profile
        .points()
        .filter_map(|p| {
            p.elevation
                .value()
                .map(|e| ((p.distance / 1000.0) as f32, (e + p.overhead) as f32))
        })
        .collect();
    #[allow(clippy::cast_possible_truncation)]
    let sight: Vec<(f32, f32)> = profile
        .points()
        .map(|p| ((p.distance / 1000.0) as f32, p.sight as f32))
        .collect();
    #[allow(clippy::cast_possible_truncation)]
    let x_max = (profile.total_distance() / 1000.0) as f32;
    let terrain = Shape::Lines(&terrain);
    let sight = Shape::Lines(&sight);
    Chart::new(180, 60, 0.0, x_max.max(f32::EPSILON))
        .lineplot(&terrain)
        .lineplot(&sight)
        .display();
}
