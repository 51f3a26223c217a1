//! PNG rendering of profiles.

use crate::{Profile, TerrainError};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use plotters::{
    coord::Shift,
    prelude::{
        BitMapBackend, ChartBuilder, Color, DrawingArea, IntoDrawingArea, LineSeries, Polygon,
        RGBColor, WHITE,
    },
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Rendered image width in pixels.
pub const WIDTH: u32 = 800;

/// Rendered image height in pixels.
pub const HEIGHT: u32 = 280;

const MARGIN: u32 = 10;

const TERRAIN: RGBColor = RGBColor(179, 179, 179);
const CURVATURE: RGBColor = RGBColor(217, 217, 179);
const SIGHT: RGBColor = RGBColor(0, 128, 0);
const GRID: RGBColor = RGBColor(176, 176, 176);

/// How a profile is drawn.
///
/// Every style fills the terrain down to the bottom of the chart and
/// draws the line of sight on top of it. Distances are in kilometers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotStyle {
    /// Terrain raised by the Earth's curvature under a straight line
    /// of sight.
    #[default]
    CorrectedElevation,
    /// Raw terrain under a line of sight bent down by the curvature.
    CurvedSight,
    /// Raw terrain, the curvature band above it and the curvature band
    /// above the floor, under a straight line of sight.
    Detailed,
}

impl PlotStyle {
    pub const ALL: [Self; 3] = [Self::CorrectedElevation, Self::CurvedSight, Self::Detailed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CorrectedElevation => "corrected_elevation",
            Self::CurvedSight => "curved_sight",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for PlotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlotStyle {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| TerrainError::InvalidRequest(format!("unknown plot style {s:?}")))
    }
}

/// Returns `(min, max)` of `data` rounded outward to the power of ten
/// just below their spread.
///
/// A flat or empty series gets a one meter margin on both sides.
pub fn manual_linear_scaled_range<I>(data: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = data
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return (0.0, 1.0);
    }
    if min == max {
        return (min.floor() - 1.0, max.ceil() + 1.0);
    }
    #[allow(clippy::cast_possible_truncation)]
    let step = 10f64.powi((max - min).log10().floor() as i32);
    ((min / step).floor() * step, (max / step).ceil() * step)
}

/// A filled band between two curves. `None` on either side leaves a
/// gap.
struct Band {
    upper: Vec<Option<f64>>,
    lower: Vec<Option<f64>>,
    color: RGBColor,
}

/// Everything needed to draw one profile in one style.
struct Layout {
    xs: Vec<f64>,
    bands: Vec<Band>,
    sight: Vec<f64>,
    y_range: (f64, f64),
}

impl Layout {
    fn new(profile: &Profile, style: PlotStyle) -> Self {
        let xs: Vec<f64> = profile.distances().iter().map(|d| d / 1000.0).collect();
        let overheads = profile.overheads();
        let elevations: Vec<Option<f64>> =
            profile.elevations().iter().map(|e| e.value()).collect();
        let corrected: Vec<Option<f64>> = elevations
            .iter()
            .zip(overheads)
            .map(|(e, o)| e.map(|e| e + o))
            .collect();
        let sight: Vec<f64> = match style {
            PlotStyle::CurvedSight => profile
                .sights()
                .iter()
                .zip(overheads)
                .map(|(s, o)| s - o)
                .collect(),
            PlotStyle::CorrectedElevation | PlotStyle::Detailed => profile.sights().to_vec(),
        };
        let terrain = match style {
            PlotStyle::CurvedSight => &elevations,
            PlotStyle::CorrectedElevation | PlotStyle::Detailed => &corrected,
        };
        let y_range = manual_linear_scaled_range(
            terrain.iter().flatten().chain(sight.iter()).copied(),
        );

        let floor = vec![Some(y_range.0); xs.len()];
        let floor_plus_correction: Vec<Option<f64>> =
            overheads.iter().map(|o| Some(y_range.0 + o)).collect();
        let bands = match style {
            PlotStyle::CorrectedElevation => vec![
                Band {
                    upper: corrected,
                    lower: floor_plus_correction.clone(),
                    color: TERRAIN,
                },
                Band {
                    upper: floor_plus_correction,
                    lower: floor,
                    color: CURVATURE,
                },
            ],
            PlotStyle::CurvedSight => vec![Band {
                upper: elevations,
                lower: floor,
                color: TERRAIN,
            }],
            PlotStyle::Detailed => vec![
                Band {
                    upper: elevations.clone(),
                    lower: floor_plus_correction.clone(),
                    color: TERRAIN,
                },
                Band {
                    upper: corrected,
                    lower: elevations,
                    color: CURVATURE,
                },
                Band {
                    upper: floor_plus_correction,
                    lower: floor,
                    color: CURVATURE,
                },
            ],
        };

        Self {
            xs,
            bands,
            sight,
            y_range,
        }
    }

    fn x_range(&self) -> (f64, f64) {
        let first = self.xs.first().copied().unwrap_or_default();
        let last = self.xs.last().copied().unwrap_or_default();
        if last > first {
            (first, last)
        } else {
            (first, first + 1.0)
        }
    }
}

fn plot_err<E: std::error::Error>(e: E) -> TerrainError {
    TerrainError::Plot(e.to_string())
}

fn draw(root: &DrawingArea<BitMapBackend<'_>, Shift>, layout: &Layout) -> Result<(), TerrainError> {
    root.fill(&WHITE).map_err(plot_err)?;
    let (x_min, x_max) = layout.x_range();
    let (y_min, y_max) = layout.y_range;
    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    #[allow(clippy::cast_possible_truncation)]
    let step = 10f64.powi((y_max - y_min).log10().floor() as i32);
    let mut y = y_min;
    while y <= y_max + step / 2.0 {
        chart
            .draw_series(LineSeries::new([(x_min, y), (x_max, y)], GRID.stroke_width(1)))
            .map_err(plot_err)?;
        y += step;
    }

    for band in &layout.bands {
        for run in runs(&layout.xs, &band.upper, &band.lower) {
            chart
                .draw_series(std::iter::once(Polygon::new(run, band.color.filled())))
                .map_err(plot_err)?;
        }
    }

    chart
        .draw_series(LineSeries::new(
            layout.xs.iter().copied().zip(layout.sight.iter().copied()),
            SIGHT.stroke_width(1),
        ))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)
}

/// Splits a band into closed outlines over each stretch of samples
/// where both of its curves are defined.
fn runs(xs: &[f64], upper: &[Option<f64>], lower: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut outlines = Vec::new();
    let mut top: Vec<(f64, f64)> = Vec::new();
    let mut bottom: Vec<(f64, f64)> = Vec::new();
    for ((x, hi), lo) in xs.iter().zip(upper).zip(lower) {
        match (hi, lo) {
            (Some(hi), Some(lo)) => {
                top.push((*x, *hi));
                bottom.push((*x, *lo));
            }
            _ => close(&mut top, &mut bottom, &mut outlines),
        }
    }
    close(&mut top, &mut bottom, &mut outlines);
    outlines
}

fn close(
    top: &mut Vec<(f64, f64)>,
    bottom: &mut Vec<(f64, f64)>,
    outlines: &mut Vec<Vec<(f64, f64)>>,
) {
    if !top.is_empty() {
        let mut outline = std::mem::take(top);
        outline.extend(bottom.drain(..).rev());
        outlines.push(outline);
    }
}

/// Renders `profile` as an 800x280 PNG.
pub fn render_png(profile: &Profile, style: PlotStyle) -> Result<Vec<u8>, TerrainError> {
    let layout = Layout::new(profile, style);
    let mut rgb = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (WIDTH, HEIGHT)).into_drawing_area();
        draw(&root, &layout)?;
    }
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&rgb, WIDTH, HEIGHT, ColorType::Rgb8)
        .map_err(plot_err)?;
    Ok(png)
}
