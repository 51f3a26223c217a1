use crate::{
    constants::EARTH_RADIUS,
    math::{self, batch, linspace},
    sampler::{read_values_from_wgs84, Sample},
    TerrainError,
};
use dem::Raster;
use geo::geometry::Coord;
use log::debug;
use serde::{Deserialize, Serialize};

/// Number of samples in a profile unless requested otherwise.
pub const DEFAULT_SAMPLES: usize = 512;

/// Elevation and line of sight between two points.
///
/// Six order-aligned sequences, one element per sample from the start
/// point to the end point. Samples are evenly spaced in latitude and
/// longitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    sights: Vec<f64>,
    elevations: Vec<Sample>,
    distances: Vec<f64>,
    overheads: Vec<f64>,
}

/// One sample of a [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Great-circle distance from the start point in meters.
    pub distance: f64,
    /// Terrain elevation in meters.
    pub elevation: Sample,
    /// Height of the Earth's bulge above the start-end chord in meters.
    pub overhead: f64,
    /// Line of sight altitude in meters.
    pub sight: f64,
}

/// Altitude of one end of the line of sight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Altitude {
    /// Meters above the terrain sampled at the endpoint.
    AboveGround(f64),
    /// Meters above sea level.
    AboveSea(f64),
}

impl Default for Altitude {
    fn default() -> Self {
        Self::AboveGround(0.0)
    }
}

impl Profile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn sights(&self) -> &[f64] {
        &self.sights
    }

    pub fn elevations(&self) -> &[Sample] {
        &self.elevations
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn overheads(&self) -> &[f64] {
        &self.overheads
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    /// Always false for a built profile, which has at least one sample.
    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }

    /// Distance from the start to the last sample in meters.
    pub fn total_distance(&self) -> f64 {
        self.distances.last().copied().unwrap_or_default()
    }

    /// Largest Earth-curvature correction along the profile.
    pub fn max_overhead(&self) -> f64 {
        self.overheads.iter().copied().fold(0.0, f64::max)
    }

    pub fn points(&self) -> impl ExactSizeIterator<Item = ProfilePoint> + '_ {
        (0..self.len()).map(|i| ProfilePoint {
            latitude: self.latitudes[i],
            longitude: self.longitudes[i],
            distance: self.distances[i],
            elevation: self.elevations[i],
            overhead: self.overheads[i],
            sight: self.sights[i],
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileBuilder {
    start: Option<Coord<f64>>,

    end: Option<Coord<f64>>,

    /// Line of sight altitude at `start`.
    start_alt: Option<Altitude>,

    /// Line of sight altitude at `end`.
    end_alt: Option<Altitude>,

    /// Number of samples, endpoints included.
    samples: Option<usize>,

    /// Endpoint which was given both an above ground and an above sea
    /// altitude.
    conflict: Option<&'static str>,
}

impl ProfileBuilder {
    /// Start point, `x` being longitude and `y` latitude in degrees.
    #[must_use]
    pub fn start(mut self, coord: Coord<f64>) -> Self {
        self.start = Some(coord);
        self
    }

    /// End point, `x` being longitude and `y` latitude in degrees.
    #[must_use]
    pub fn end(mut self, coord: Coord<f64>) -> Self {
        self.end = Some(coord);
        self
    }

    #[must_use]
    pub fn start_altitude(mut self, altitude: Altitude) -> Self {
        set_altitude(&mut self.start_alt, altitude, "start", &mut self.conflict);
        self
    }

    #[must_use]
    pub fn end_altitude(mut self, altitude: Altitude) -> Self {
        set_altitude(&mut self.end_alt, altitude, "end", &mut self.conflict);
        self
    }

    #[must_use]
    pub fn start_above_ground(self, meters: f64) -> Self {
        self.start_altitude(Altitude::AboveGround(meters))
    }

    #[must_use]
    pub fn start_above_sea(self, meters: f64) -> Self {
        self.start_altitude(Altitude::AboveSea(meters))
    }

    #[must_use]
    pub fn end_above_ground(self, meters: f64) -> Self {
        self.end_altitude(Altitude::AboveGround(meters))
    }

    #[must_use]
    pub fn end_above_sea(self, meters: f64) -> Self {
        self.end_altitude(Altitude::AboveSea(meters))
    }

    #[must_use]
    pub fn samples(mut self, n: usize) -> Self {
        self.samples = Some(n);
        self
    }

    pub fn build<R>(&self, raster: &R) -> Result<Profile, TerrainError>
    where
        R: Raster + ?Sized,
    {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(TerrainError::Builder);
        };
        if let Some(endpoint) = self.conflict {
            return Err(TerrainError::InvalidRequest(format!(
                "{endpoint} point has both above ground and above sea altitudes"
            )));
        }
        let n = self.samples.unwrap_or(DEFAULT_SAMPLES);
        if n == 0 {
            return Err(TerrainError::InvalidRequest(
                "a profile needs at least one sample".to_owned(),
            ));
        }

        let (lat1, long1) = (start.y, start.x);
        let (lat2, long2) = (end.y, end.x);
        let half_angle = math::half_central_angle(
            lat1.to_radians(),
            long1.to_radians(),
            lat2.to_radians(),
            long2.to_radians(),
        );
        let max_overhead = math::overhead_height(half_angle, EARTH_RADIUS);

        let latitudes: Vec<f64> = linspace(lat1, lat2, n).collect();
        let longitudes: Vec<f64> = linspace(long1, long2, n).collect();

        let (elevations, terrain_runtime) = {
            let now = std::time::Instant::now();
            let elevations = read_values_from_wgs84(raster, &latitudes, &longitudes)?;
            (elevations, now.elapsed())
        };

        // The sample grid starts and ends exactly on the endpoints, so
        // their terrain is the first and last bulk sample.
        let start_sight = sight(self.start_alt.unwrap_or_default(), elevations[0], "start")?;
        let end_sight = if n == 1 {
            start_sight
        } else {
            sight(self.end_alt.unwrap_or_default(), elevations[n - 1], "end")?
        };
        let sights: Vec<f64> = linspace(start_sight, end_sight, n).collect();

        let (distances, overheads, math_runtime) = {
            let now = std::time::Instant::now();
            let distances =
                batch::distance_between_wgs84_coordinates(lat1, long1, &latitudes, &longitudes)?;
            let lat_rads: Vec<f64> = latitudes.iter().map(|lat| lat.to_radians()).collect();
            let long_rads: Vec<f64> = longitudes.iter().map(|long| long.to_radians()).collect();
            let remaining: Vec<f64> = batch::half_central_angle(
                lat1.to_radians(),
                long1.to_radians(),
                &lat_rads,
                &long_rads,
            )?
            .into_iter()
            .map(|local_half_angle| half_angle - 2.0 * local_half_angle)
            .collect();
            let overheads = batch::overhead_height(&remaining, EARTH_RADIUS)?
                .into_iter()
                .map(|h| max_overhead - h)
                .collect();
            (distances, overheads, now.elapsed())
        };

        debug!(
            "profile; len: {}, terrain_exec: {:?}, math_exec: {:?}",
            n, terrain_runtime, math_runtime
        );

        Ok(Profile {
            latitudes,
            longitudes,
            sights,
            elevations,
            distances,
            overheads,
        })
    }
}

fn set_altitude(
    slot: &mut Option<Altitude>,
    altitude: Altitude,
    endpoint: &'static str,
    conflict: &mut Option<&'static str>,
) {
    if let Some(previous) = slot.replace(altitude) {
        if std::mem::discriminant(&previous) != std::mem::discriminant(&altitude) {
            conflict.get_or_insert(endpoint);
        }
    }
}

fn sight(altitude: Altitude, terrain: Sample, endpoint: &'static str) -> Result<f64, TerrainError> {
    match (altitude, terrain) {
        (Altitude::AboveSea(meters), _) => Ok(meters),
        (Altitude::AboveGround(meters), Sample::Value(ground)) => Ok(ground + meters),
        (Altitude::AboveGround(_), Sample::NoData) => Err(TerrainError::NoDataAtEndpoint(endpoint)),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::excessive_precision)]

    use super::{Altitude, Profile, Sample};
    use crate::{math, TerrainError};
    use approx::assert_abs_diff_eq;
    use dem::{GeoTransform, Grid, WGS84_WKT};
    use geo::geometry::Coord;

    const START: Coord = Coord { x: 1.2, y: 43.2 };
    const END: Coord = Coord { x: 1.8, y: 43.8 };

    /// Terrain under each of the 10 samples between `START` and `END`.
    const ELEVATIONS: [f64; 10] = [
        280., 326., 228., 184., 241., 158., 224., 209., 190., 184.,
    ];

    /// 0.002° WGS 84 grid over 43°N..44°N, 1°E..2°E. The column holding
    /// the `i`th of 10 samples from `START` to `END` has elevation
    /// `ELEVATIONS[i]`, every other cell is 0.
    fn dem() -> Grid {
        let (origin_x, cell) = (1.000_5, 0.002);
        Grid::from_fn(
            WGS84_WKT,
            GeoTransform::north_up(origin_x, cell, 44.000_5, -cell),
            (501, 501),
            Some(-32768.0),
            |col, _| {
                let west = origin_x + col as f64 * cell;
                (0..10)
                    .find(|i| {
                        let long = 1.2 + *i as f64 / 15.0;
                        west <= long && long < west + cell
                    })
                    .map_or(0.0, |i| ELEVATIONS[i])
            },
        )
    }

    #[test]
    fn test_profile() {
        let profile = Profile::builder()
            .start(START)
            .end(END)
            .samples(10)
            .build(&dem())
            .unwrap();

        let expected_distances = [
            0.0,
            9_166.703_065_04,
            18_329.924_112_76,
            27_489.657_335_78,
            36_645.896_922_02,
            45_798.637_054_69,
            54_947.871_912_27,
            64_093.595_668_56,
            73_235.802_492_61,
            82_374.486_548_74,
        ];
        let expected_overheads = [
            0.0, 52.6953, 92.1818, 118.4743, 131.5879, 131.5375, 118.3384, 92.0056, 52.5544, 0.0,
        ];
        let expected_sights = [
            280.0, 269.3333, 258.6667, 248.0, 237.3333, 226.6667, 216.0, 205.3333, 194.6667, 184.0,
        ];

        assert_eq!(profile.len(), 10);
        for (actual, expected) in profile.distances().iter().zip(expected_distances) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 0.001);
        }
        for (actual, expected) in profile.overheads().iter().zip(expected_overheads) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 0.001);
        }
        for (actual, expected) in profile.sights().iter().zip(expected_sights) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 0.001);
        }
        for (actual, expected) in profile.elevations().iter().zip(ELEVATIONS) {
            assert_eq!(*actual, Sample::Value(expected));
        }
        for (i, lat) in profile.latitudes().iter().enumerate() {
            assert_abs_diff_eq!(*lat, 43.2 + i as f64 / 15.0, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(profile.max_overhead(), 131.5879, epsilon = 0.001);
    }

    #[test]
    fn test_endpoints() {
        let profile = Profile::builder()
            .start(START)
            .end(END)
            .samples(7)
            .build(&dem())
            .unwrap();
        let points: Vec<_> = profile.points().collect();
        let (first, last) = (points[0], points[6]);
        assert_eq!((first.latitude, first.longitude), (START.y, START.x));
        assert_eq!(first.distance, 0.0);
        assert_eq!(first.overhead, 0.0);
        assert_eq!((last.latitude, last.longitude), (END.y, END.x));
        assert_abs_diff_eq!(
            last.distance,
            math::distance_between_wgs84_coordinates(START.y, START.x, END.y, END.x),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(last.overhead, 0.0, epsilon = 1e-9);
        assert_eq!(profile.total_distance(), last.distance);
        assert!(profile.distances().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_altitudes() {
        let profile = Profile::builder()
            .start(START)
            .start_above_ground(10.0)
            .end(END)
            .end_above_sea(500.0)
            .samples(10)
            .build(&dem())
            .unwrap();
        assert_eq!(profile.sights()[0], 290.0);
        assert_eq!(profile.sights()[9], 500.0);

        let profile = Profile::builder()
            .start(START)
            .start_altitude(Altitude::AboveSea(100.0))
            .end(END)
            .end_above_ground(6.0)
            .samples(10)
            .build(&dem())
            .unwrap();
        assert_eq!(profile.sights()[0], 100.0);
        assert_eq!(profile.sights()[9], 190.0);
    }

    #[test]
    fn test_identical_endpoints() {
        let profile = Profile::builder()
            .start(START)
            .end(START)
            .samples(5)
            .build(&dem())
            .unwrap();
        assert!(profile.distances().iter().all(|d| *d == 0.0));
        assert!(profile.overheads().iter().all(|o| *o == 0.0));
        assert!(profile.sights().iter().all(|s| *s == 280.0));
    }

    #[test]
    fn test_single_sample() {
        // The end point is off the DEM and must not be read.
        let profile = Profile::builder()
            .start(START)
            .end(Coord { x: 50.0, y: 10.0 })
            .samples(1)
            .build(&dem())
            .unwrap();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile.latitudes(), &[43.2]);
        assert_eq!(profile.longitudes(), &[1.2]);
        assert_eq!(profile.distances(), &[0.0]);
        assert_eq!(profile.sights(), &[280.0]);
    }

    #[test]
    fn test_invalid_requests() {
        let dem = dem();
        assert!(matches!(
            Profile::builder().start(START).build(&dem),
            Err(TerrainError::Builder)
        ));
        assert!(matches!(
            Profile::builder().start(START).end(END).samples(0).build(&dem),
            Err(TerrainError::InvalidRequest(_))
        ));
        assert!(matches!(
            Profile::builder()
                .start(START)
                .end(END)
                .end_above_ground(2.0)
                .end_above_sea(200.0)
                .build(&dem),
            Err(TerrainError::InvalidRequest(msg)) if msg.starts_with("end")
        ));
        assert!(matches!(
            Profile::builder()
                .start(START)
                .end(Coord { x: 1.5, y: 45.0 })
                .samples(3)
                .build(&dem),
            Err(TerrainError::SampleOutOfRange { .. })
        ));
    }

    #[test]
    fn test_no_data() {
        let grid = Grid::from_fn(
            WGS84_WKT,
            GeoTransform::north_up(0.0, 1.0, 3.0, -1.0),
            (3, 3),
            Some(-1.0),
            |col, row| if (col, row) == (2, 2) { -1.0 } else { 5.0 },
        );
        let start = Coord { x: 0.5, y: 2.5 };
        let end = Coord { x: 2.5, y: 0.5 };

        assert!(matches!(
            Profile::builder().start(start).end(end).samples(3).build(&grid),
            Err(TerrainError::NoDataAtEndpoint("end"))
        ));

        let profile = Profile::builder()
            .start(start)
            .end(end)
            .end_above_sea(20.0)
            .samples(3)
            .build(&grid)
            .unwrap();
        assert_eq!(profile.elevations()[2], Sample::NoData);
        assert_eq!(profile.sights(), &[5.0, 12.5, 20.0]);

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["elevations"], serde_json::json!([5.0, 5.0, null]));
    }
}
