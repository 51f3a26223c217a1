use crate::{plot, PlotStyle, Profile, TerrainError};
use std::{
    fmt,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
};

/// Serialized representations of a [`Profile`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    /// The six profile sequences as parallel JSON arrays.
    #[default]
    Json,
    /// One row per sample, with a header.
    Csv,
    /// A rendered chart.
    Png(PlotStyle),
}

impl ProfileFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
            Self::Png(_) => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Png(_) => "png",
        }
    }

    /// File written when no output path is given, `profile.<ext>`.
    pub fn default_file_name(&self) -> String {
        format!("profile.{}", self.extension())
    }

    pub fn to_bytes(&self, profile: &Profile) -> Result<Vec<u8>, TerrainError> {
        match self {
            Self::Png(style) => plot::render_png(profile, *style),
            Self::Json | Self::Csv => {
                let mut buf = Vec::new();
                self.write_to(profile, &mut buf)?;
                Ok(buf)
            }
        }
    }

    pub fn write_to<W: Write>(&self, profile: &Profile, mut writer: W) -> Result<(), TerrainError> {
        match self {
            Self::Json => serde_json::to_writer(&mut writer, profile)?,
            Self::Csv => write_csv(profile, &mut writer)?,
            Self::Png(style) => writer.write_all(&plot::render_png(profile, *style)?)?,
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, profile: &Profile, path: P) -> Result<(), TerrainError> {
        let file = File::create(path)?;
        self.write_to(profile, BufWriter::new(file))
    }
}

fn write_csv<W: Write>(profile: &Profile, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "Distance,Latitude,Longitude,Elevation,Overhead,Sight")?;
    for point in profile.points() {
        let elevation = point
            .elevation
            .value()
            .map(|e| e.to_string())
            .unwrap_or_default();
        writeln!(
            writer,
            "{},{},{},{elevation},{},{}",
            point.distance, point.latitude, point.longitude, point.overhead, point.sight
        )?;
    }
    Ok(())
}

impl fmt::Display for ProfileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parses `json`, `csv` or `png`; the latter uses the default
/// [`PlotStyle`].
impl FromStr for ProfileFormat {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "png" => Ok(Self::Png(PlotStyle::default())),
            _ => Err(TerrainError::InvalidRequest(format!(
                "unknown output format {s:?}"
            ))),
        }
    }
}
