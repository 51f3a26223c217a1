//! SRTM/NASADEM elevation (`.hgt`) file format.
//!
//! A `.hgt` file is a square grid of big-endian `i16` samples covering
//! one degree of latitude and longitude, stored north row first. The
//! tile is named after the sample at its southwest corner, e.g.
//! `N44W072.hgt`.
//!
//! # References
//!
//! 1. [30-Meter SRTM Tile Downloader](https://dwtkns.com/srtm30m)
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

use crate::{DemError, GeoTransform, Raster, WGS84_WKT};
use byteorder::{BigEndian as BE, ByteOrder, ReadBytesExt};
use geo::geometry::Coord;
use memmap2::Mmap;
use std::{
    borrow::Cow,
    fs::File,
    io::BufReader,
    mem::size_of,
    path::{Path, PathBuf},
};

/// Sample value marking a data void.
pub const VOID: i16 = -32768;

const ARCSEC_PER_DEG: f64 = 3600.0;

/// How a [`Tile`] holds its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileMode {
    /// Read the whole file into memory up front.
    InMem,
    /// Memory-map the file.
    #[default]
    MemMap,
}

pub struct Tile {
    /// Southwest corner of the tile.
    ///
    /// Specifically, the _center_ of the SW most sample of the tile.
    sw_corner: Coord<i16>,

    /// Arcseconds per sample.
    resolution: u8,

    /// Number of samples along each side of this tile.
    side: usize,

    /// Elevation samples.
    samples: SampleStore,
}

enum SampleStore {
    Tombstone,
    InMem(Box<[i16]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> i16 {
        match self {
            Self::Tombstone => VOID,
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<i16>();
                BE::read_i16(&raw[start..start + size_of::<i16>()])
            }
        }
    }
}

impl Tile {
    /// Returns a Tile read into memory from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let path = path.as_ref();
        let (resolution, side) = extract_resolution(path)?;
        let sw_corner = parse_sw_corner(path)?;

        let mut file = BufReader::new(File::open(path)?);
        let mut samples = Vec::with_capacity(side * side);
        for _ in 0..(side * side) {
            samples.push(file.read_i16::<BE>()?);
        }

        Ok(Self {
            sw_corner,
            resolution,
            side,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Tile using the memory-mapped file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let path = path.as_ref();
        let (resolution, side) = extract_resolution(path)?;
        let sw_corner = parse_sw_corner(path)?;

        let file = File::open(path)?;
        // SAFETY: the file is opened read-only and DEM tiles are not
        // expected to change underneath a running process.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self {
            sw_corner,
            resolution,
            side,
            samples: SampleStore::MemMap(mmap),
        })
    }

    /// Opens the tile at `path` according to `mode`.
    pub fn open<P: AsRef<Path>>(path: P, mode: TileMode) -> Result<Self, DemError> {
        match mode {
            TileMode::InMem => Self::load(path),
            TileMode::MemMap => Self::memmap(path),
        }
    }

    /// Returns a tile of `resolution` where every sample is [`VOID`].
    ///
    /// Stands in for tiles missing from a mosaic, which are usually
    /// over the sea.
    pub fn tombstone(sw_corner: Coord<i16>, resolution: u8) -> Self {
        Self {
            sw_corner,
            resolution,
            side: side_len(resolution),
            samples: SampleStore::Tombstone,
        }
    }

    /// Returns this tile's resolution in arcseconds per sample.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Returns the southwest corner named by this tile.
    pub fn sw_corner(&self) -> Coord<i16> {
        self.sw_corner
    }

    /// Returns the raw sample at `(col, row)`, row 0 being the north
    /// edge.
    pub fn get(&self, col: usize, row: usize) -> Option<i16> {
        (col < self.side && row < self.side)
            .then(|| self.samples.get_unchecked(row * self.side + col))
    }
}

impl Raster for Tile {
    fn projection(&self) -> Cow<'_, str> {
        Cow::Borrowed(WGS84_WKT)
    }

    fn geo_transform(&self) -> GeoTransform {
        let px = f64::from(self.resolution) / ARCSEC_PER_DEG;
        GeoTransform::north_up(
            f64::from(self.sw_corner.x) - px / 2.0,
            px,
            f64::from(self.sw_corner.y) + 1.0 + px / 2.0,
            -px,
        )
    }

    fn size(&self) -> (usize, usize) {
        (self.side, self.side)
    }

    fn no_data(&self) -> Option<f64> {
        Some(f64::from(VOID))
    }

    fn read(&self, col: usize, row: usize) -> Result<f64, DemError> {
        self.get(col, row)
            .map(f64::from)
            .ok_or(DemError::OutOfBounds {
                col,
                row,
                cols: self.side,
                rows: self.side,
            })
    }
}

/// Number of samples along one side of a tile of `resolution`.
pub(crate) fn side_len(resolution: u8) -> usize {
    3600 / usize::from(resolution) + 1
}

pub(crate) fn extract_resolution(path: &Path) -> Result<(u8, usize), DemError> {
    const RES_1_ARCSECONDS_FILE_LEN: u64 = 3601 * 3601 * size_of::<i16>() as u64;
    const RES_3_ARCSECONDS_FILE_LEN: u64 = 1201 * 1201 * size_of::<i16>() as u64;
    match path.metadata().map(|m| m.len())? {
        RES_1_ARCSECONDS_FILE_LEN => Ok((1, 3601)),
        RES_3_ARCSECONDS_FILE_LEN => Ok((3, 1201)),
        invalid_len => Err(DemError::HgtLen(invalid_len, path.to_owned())),
    }
}

pub(crate) fn parse_sw_corner(path: &Path) -> Result<Coord<i16>, DemError> {
    let mk_err = || DemError::HgtName(path.to_owned());
    let name = path
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}

/// Returns the canonical file name for the tile whose southwest corner
/// is `sw_corner`.
pub(crate) fn file_name(sw_corner: Coord<i16>) -> PathBuf {
    let Coord { x, y } = sw_corner;
    let ns = if y < 0 { 'S' } else { 'N' };
    let ew = if x < 0 { 'W' } else { 'E' };
    PathBuf::from(format!("{ns}{:02}{ew}{:03}.hgt", y.abs(), x.abs()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{
        extract_resolution, file_name, parse_sw_corner, Coord, DemError, Raster, Tile, TileMode,
        VOID,
    };
    use approx::assert_relative_eq;
    use byteorder::{BigEndian as BE, WriteBytesExt};
    use std::{
        fs::File,
        io::{BufWriter, Write},
        path::{Path, PathBuf},
    };

    /// Writes a 3 arc-second tile named `name` into `dir` whose sample
    /// at `(col, row)` is `f(col, row)`.
    pub(crate) fn write_tile<F>(dir: &Path, name: &str, f: F) -> PathBuf
    where
        F: Fn(usize, usize) -> i16,
    {
        let path = dir.join(name);
        let mut out = BufWriter::new(File::create(&path).unwrap());
        for row in 0..1201 {
            for col in 0..1201 {
                out.write_i16::<BE>(f(col, row)).unwrap();
            }
        }
        out.flush().unwrap();
        path
    }

    fn ramp(col: usize, row: usize) -> i16 {
        (row + col) as i16
    }

    #[test]
    fn test_parse_hgt_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tile(dir.path(), "N44W072.hgt", ramp);
        assert_eq!(parse_sw_corner(&path).unwrap(), Coord { x: -72, y: 44 });
        assert_eq!(extract_resolution(&path).unwrap(), (3, 1201));
        assert_eq!(
            parse_sw_corner(Path::new("S01E120.hgt")).unwrap(),
            Coord { x: 120, y: -1 }
        );
        assert!(matches!(
            parse_sw_corner(Path::new("X44W072.hgt")),
            Err(DemError::HgtName(_))
        ));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name(Coord { x: -72, y: 44 }),
            PathBuf::from("N44W072.hgt")
        );
        assert_eq!(
            file_name(Coord { x: 1, y: -3 }),
            PathBuf::from("S03E001.hgt")
        );
    }

    #[test]
    fn test_bad_len() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("N44W072.hgt");
        std::fs::write(&path, [0_u8; 10]).unwrap();
        assert!(matches!(Tile::load(&path), Err(DemError::HgtLen(10, _))));
    }

    #[test]
    fn test_tile_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tile(dir.path(), "N44W072.hgt", ramp);
        let parsed_tile = Tile::open(&path, TileMode::InMem).unwrap();
        let mapped_tile = Tile::open(&path, TileMode::MemMap).unwrap();
        for (col, row) in [(0, 0), (1200, 0), (0, 1200), (17, 903), (1200, 1200)] {
            let expected = f64::from(ramp(col, row));
            assert_eq!(parsed_tile.read(col, row).unwrap(), expected);
            assert_eq!(mapped_tile.read(col, row).unwrap(), expected);
        }
        assert!(matches!(
            parsed_tile.read(1201, 0),
            Err(DemError::OutOfBounds { col: 1201, .. })
        ));
    }

    #[test]
    fn test_geo_transform() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tile(dir.path(), "N44W072.hgt", ramp);
        let tile = Tile::memmap(path).unwrap();
        let gt = tile.geo_transform();
        let half = 1.0 / 2400.0;
        assert_relative_eq!(gt.origin_x(), -72.0 - half);
        assert_relative_eq!(gt.origin_y(), 45.0 + half);
        assert_relative_eq!(gt.pixel_width(), 1.0 / 1200.0);
        assert_relative_eq!(gt.pixel_height(), -1.0 / 1200.0);
        assert_eq!(tile.size(), (1201, 1201));
        assert_eq!(tile.no_data(), Some(-32768.0));
    }

    #[test]
    fn test_tombstone_is_void() {
        let tile = Tile::tombstone(Coord { x: 3, y: 43 }, 3);
        assert_eq!(tile.size(), (1201, 1201));
        assert_eq!(tile.read(600, 600).unwrap(), f64::from(VOID));
    }
}
