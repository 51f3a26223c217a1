use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use geo::geometry::Coord;
use std::{path::PathBuf, str::FromStr};
use terrain::{Altitude, PlotStyle, ProfileFormat, DEFAULT_SAMPLES};

/// Earth-curvature corrected terrain profiles.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the great-circle distance between two points, in meters.
    Distance {
        /// First point "lat,lon".
        #[arg(allow_hyphen_values = true)]
        start: LatLon,

        /// Second point "lat,lon".
        #[arg(allow_hyphen_values = true)]
        end: LatLon,
    },

    /// Print the terrain elevation at a point.
    Elevation {
        #[command(flatten)]
        dem: DemArgs,

        /// Point "lat,lon".
        #[arg(allow_hyphen_values = true)]
        point: LatLon,
    },

    /// Generate a profile between two points.
    Profile(ProfileArgs),
}

#[derive(Debug, Args, Clone)]
pub struct DemArgs {
    /// DEM raster, or directory of .hgt tiles. Defaults to `[dem]
    /// location` in config.toml.
    #[arg(short, long)]
    pub dem: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub dem: DemArgs,

    /// Number of samples, endpoints included.
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLES)]
    pub samples: usize,

    /// Line of sight height above ground at the first point, in meters.
    #[arg(long, visible_alias = "og1", conflicts_with = "offset_sea1", allow_hyphen_values = true)]
    pub offset_ground1: Option<f64>,

    /// Line of sight altitude above sea level at the first point, in
    /// meters.
    #[arg(long, visible_alias = "os1", allow_hyphen_values = true)]
    pub offset_sea1: Option<f64>,

    /// Line of sight height above ground at the second point, in
    /// meters.
    #[arg(long, visible_alias = "og2", conflicts_with = "offset_sea2", allow_hyphen_values = true)]
    pub offset_ground2: Option<f64>,

    /// Line of sight altitude above sea level at the second point, in
    /// meters.
    #[arg(long, visible_alias = "os2", allow_hyphen_values = true)]
    pub offset_sea2: Option<f64>,

    #[arg(short, long, value_enum, default_value_t = Output::Json)]
    pub output: Output,

    /// PNG plot style.
    #[arg(long, default_value_t = PlotStyle::default())]
    pub style: PlotStyle,

    /// Output file, `-` for stdout. JSON and CSV go to stdout when
    /// omitted, PNG to `profile.png`.
    #[arg(short = 'f', long = "out")]
    pub out: Option<PathBuf>,

    /// First point "lat,lon".
    #[arg(allow_hyphen_values = true)]
    pub start: LatLon,

    /// Second point "lat,lon".
    #[arg(allow_hyphen_values = true)]
    pub end: LatLon,
}

impl ProfileArgs {
    pub fn start_altitude(&self) -> Option<Altitude> {
        altitude(self.offset_ground1, self.offset_sea1)
    }

    pub fn end_altitude(&self) -> Option<Altitude> {
        altitude(self.offset_ground2, self.offset_sea2)
    }

    /// Where a profile rendered as `format` is written.
    pub fn destination(&self, format: ProfileFormat) -> Destination {
        match (&self.out, format) {
            (Some(path), _) if path.as_os_str() == "-" => Destination::Stdout,
            (Some(path), _) => Destination::File(path.clone()),
            (None, ProfileFormat::Png(_)) => Destination::File(format.default_file_name().into()),
            (None, _) => Destination::Stdout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

fn altitude(ground: Option<f64>, sea: Option<f64>) -> Option<Altitude> {
    ground
        .map(Altitude::AboveGround)
        .or(sea.map(Altitude::AboveSea))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Output {
    /// Parallel arrays of the profile's sequences.
    Json,
    /// Rendered chart.
    Png,
    /// One row per sample.
    Csv,
    /// Plot to terminal.
    Plot,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon pair"))?;
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        Ok(Self(Coord { y: lat, x: lon }))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, Destination, LatLon, Output, ProfileArgs};
    use clap::Parser;
    use geo::geometry::Coord;
    use std::path::PathBuf;
    use terrain::{Altitude, PlotStyle, ProfileFormat, DEFAULT_SAMPLES};

    fn profile_args(extra: &[&str]) -> ProfileArgs {
        let args = ["geoprofile", "profile"]
            .iter()
            .chain(extra)
            .chain(&["43.2,1.2", "43.8,1.8"])
            .copied();
        let Command::Profile(args) = Cli::try_parse_from(args).unwrap().cmd else {
            panic!("expected profile command")
        };
        args
    }

    #[test]
    fn test_destination() {
        let png = ProfileFormat::Png(PlotStyle::Detailed);

        let args = profile_args(&[]);
        assert_eq!(args.destination(ProfileFormat::Json), Destination::Stdout);
        assert_eq!(args.destination(ProfileFormat::Csv), Destination::Stdout);
        assert_eq!(
            args.destination(png),
            Destination::File(PathBuf::from("profile.png"))
        );

        let args = profile_args(&["-o", "png", "--out", "-"]);
        assert_eq!(args.destination(png), Destination::Stdout);

        let args = profile_args(&["-f", "/tmp/out.csv"]);
        assert_eq!(
            args.destination(ProfileFormat::Csv),
            Destination::File(PathBuf::from("/tmp/out.csv"))
        );
    }

    #[test]
    fn test_lat_lon() {
        assert_eq!(
            "43.561725,1.444796".parse::<LatLon>().unwrap(),
            LatLon(Coord {
                x: 1.444_796,
                y: 43.561_725
            })
        );
        assert_eq!(
            "-12.5, -71".parse::<LatLon>().unwrap(),
            LatLon(Coord { x: -71.0, y: -12.5 })
        );
        assert!("43.5".parse::<LatLon>().is_err());
        assert!("north,east".parse::<LatLon>().is_err());
    }

    #[test]
    fn test_profile_defaults() {
        let cli = Cli::try_parse_from(["geoprofile", "profile", "43.2,1.2", "43.8,1.8"]).unwrap();
        let Command::Profile(args) = cli.cmd else {
            panic!("expected profile command")
        };
        assert_eq!(args.samples, DEFAULT_SAMPLES);
        assert_eq!(args.output, Output::Json);
        assert_eq!(args.style, PlotStyle::CorrectedElevation);
        assert_eq!(args.start_altitude(), None);
        assert_eq!(args.end_altitude(), None);
        assert_eq!(args.start.0, Coord { x: 1.2, y: 43.2 });
        assert!(args.dem.dem.is_none());
        assert!(args.out.is_none());
    }

    #[test]
    fn test_profile_flags() {
        let cli = Cli::try_parse_from([
            "geoprofile",
            "profile",
            "--dem",
            "dem.tif",
            "-n",
            "10",
            "--og1",
            "10",
            "--offset-sea2",
            "350",
            "-o",
            "png",
            "--style",
            "curved_sight",
            "-f",
            "out.png",
            "-33.9,-70.6",
            "-33.4,-70.1",
        ])
        .unwrap();
        let Command::Profile(args) = cli.cmd else {
            panic!("expected profile command")
        };
        assert_eq!(args.samples, 10);
        assert_eq!(args.start_altitude(), Some(Altitude::AboveGround(10.0)));
        assert_eq!(args.end_altitude(), Some(Altitude::AboveSea(350.0)));
        assert_eq!(args.output, Output::Png);
        assert_eq!(args.style, PlotStyle::CurvedSight);
        assert_eq!(args.start.0, Coord { x: -70.6, y: -33.9 });
        assert_eq!(args.dem.dem.unwrap().to_str(), Some("dem.tif"));
    }

    #[test]
    fn test_conflicting_offsets() {
        for (ground, sea) in [("--og1", "--os1"), ("--offset-ground2", "--offset-sea2")] {
            assert!(Cli::try_parse_from([
                "geoprofile",
                "profile",
                ground,
                "1",
                sea,
                "2",
                "43.2,1.2",
                "43.8,1.8",
            ])
            .is_err());
        }
    }

    #[test]
    fn test_distance_and_elevation() {
        let cli = Cli::try_parse_from(["geoprofile", "distance", "0,0", "-1,-1"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::Distance { end: LatLon(Coord { x, y }), .. } if x == -1.0 && y == -1.0
        ));

        let cli =
            Cli::try_parse_from(["geoprofile", "elevation", "-d", "tiles", "44.2,-71.3"]).unwrap();
        let Command::Elevation { dem, point } = cli.cmd else {
            panic!("expected elevation command")
        };
        assert_eq!(dem.dem.unwrap().to_str(), Some("tiles"));
        assert_eq!(point.0, Coord { x: -71.3, y: 44.2 });
    }
}
