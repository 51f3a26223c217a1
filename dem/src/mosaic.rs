//! A directory of `.hgt` tiles presented as one global raster.

use crate::{
    hgt::{extract_resolution, file_name, side_len},
    DemError, GeoTransform, Raster, Tile, TileMode, WGS84_WKT,
};
use dashmap::DashMap;
use geo::geometry::Coord;
use log::debug;
use std::{borrow::Cow, io::ErrorKind, path::PathBuf, sync::Arc};

/// Global WGS 84 raster backed by a directory of HGT tiles.
///
/// Column 0 is centered on 180°W and row 0 on 90°N. Adjacent tiles
/// share their edge samples, so each tile contributes `side - 1`
/// columns and rows; the shared edge is read from the tile to the
/// east (columns) or south (rows).
pub struct Mosaic {
    /// Directory containing HGT tile files.
    tile_dir: PathBuf,

    /// How to load tiles (in-memory or mapped).
    tile_mode: TileMode,

    /// Arcseconds per sample, shared by every tile in `tile_dir`.
    resolution: u8,

    /// Tiles which have been loaded on demand.
    tiles: DashMap<Coord<i16>, Arc<Tile>>,
}

impl Mosaic {
    pub fn new(tile_dir: PathBuf, tile_mode: TileMode) -> Result<Self, DemError> {
        // Fail early if tile_dir has no `hgt` file, and take the
        // mosaic's resolution from the first one found.
        let mut resolution = None;
        for entry in std::fs::read_dir(&tile_dir)? {
            let path = entry?.path();
            let is_hgt = path
                .extension()
                .and_then(std::ffi::OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case("hgt"));
            if is_hgt {
                resolution = Some(extract_resolution(&path)?.0);
                break;
            }
        }

        let resolution = resolution.ok_or_else(|| DemError::NoTiles(tile_dir.clone()))?;
        debug!("{tile_dir:?} holds {resolution} arc-second tiles");
        Ok(Self {
            tile_dir,
            tile_mode,
            resolution,
            tiles: DashMap::new(),
        })
    }

    /// Returns this mosaic's resolution in arcseconds per sample.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Returns the tile whose southwest corner is `sw_corner`.
    ///
    /// Tiles are read from disk on first use. A tile missing from disk
    /// is replaced by a tombstone of voids.
    pub fn tile(&self, sw_corner: Coord<i16>) -> Result<Arc<Tile>, DemError> {
        self.tiles
            .entry(sw_corner)
            .or_try_insert_with(|| match self.load_tile(sw_corner) {
                Ok(tile) => Ok(Arc::new(tile)),
                Err(DemError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    debug!("loading tombstone in lieu of missing tile for {sw_corner:?}");
                    Ok(Arc::new(Tile::tombstone(sw_corner, self.resolution)))
                }
                Err(e) => Err(e),
            })
            .map(|r| r.clone())
    }

    /// Samples per degree, i.e. tile side length less the shared edge.
    fn per_degree(&self) -> usize {
        side_len(self.resolution) - 1
    }

    fn load_tile(&self, sw_corner: Coord<i16>) -> Result<Tile, DemError> {
        let file_name = file_name(sw_corner);
        let mut tile_path = self.tile_dir.join(&file_name);
        if !tile_path.exists() {
            let lower = file_name.to_string_lossy().to_lowercase();
            tile_path = self.tile_dir.join(lower);
        }
        debug!("loading {tile_path:?}");
        Tile::open(tile_path, self.tile_mode)
    }
}

impl Raster for Mosaic {
    fn projection(&self) -> Cow<'_, str> {
        Cow::Borrowed(WGS84_WKT)
    }

    fn geo_transform(&self) -> GeoTransform {
        #[allow(clippy::cast_precision_loss)]
        let px = 1.0 / self.per_degree() as f64;
        GeoTransform::north_up(-180.0 - px / 2.0, px, 90.0 + px / 2.0, -px)
    }

    fn size(&self) -> (usize, usize) {
        let n = self.per_degree();
        (360 * n + 1, 180 * n + 1)
    }

    fn no_data(&self) -> Option<f64> {
        Some(f64::from(crate::VOID))
    }

    fn read(&self, col: usize, row: usize) -> Result<f64, DemError> {
        let (cols, rows) = self.size();
        if col >= cols || row >= rows {
            return Err(DemError::OutOfBounds {
                col,
                row,
                cols,
                rows,
            });
        }

        let n = self.per_degree();
        // The last column and row only exist as the east and south edges
        // of the final tiles.
        let (tile_x, tile_col) = match (col / n, col % n) {
            (360, _) => (359, n),
            split => split,
        };
        let (tile_y, tile_row) = match (row / n, row % n) {
            (180, _) => (179, n),
            split => split,
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let sw_corner = Coord {
            x: -180 + tile_x as i16,
            y: 90 - tile_y as i16 - 1,
        };
        self.tile(sw_corner)?.read(tile_col, tile_row)
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, DemError, Mosaic, Raster, TileMode};
    use crate::{hgt::tests::write_tile, VOID};
    use approx::assert_relative_eq;

    /// Pixel offset of `(lon, lat)` in a 3 arc-second mosaic.
    fn offset(lon: f64, lat: f64) -> (usize, usize) {
        let col = ((lon + 180.0) * 1200.0 + 0.5).floor() as usize;
        let row = ((90.0 - lat) * 1200.0 + 0.5).floor() as usize;
        (col, row)
    }

    #[test]
    fn test_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Mosaic::new(dir.path().to_owned(), TileMode::MemMap),
            Err(DemError::NoTiles(_))
        ));
    }

    #[test]
    fn test_geometry() {
        let dir = tempfile::tempdir().unwrap();
        write_tile(dir.path(), "N43E001.hgt", |_, _| 0);
        let mosaic = Mosaic::new(dir.path().to_owned(), TileMode::MemMap).unwrap();
        assert_eq!(mosaic.resolution(), 3);
        assert_eq!(mosaic.size(), (432_001, 216_001));
        let gt = mosaic.geo_transform();
        assert_relative_eq!(gt.origin_x(), -180.0 - 1.0 / 2400.0);
        assert_relative_eq!(gt.origin_y(), 90.0 + 1.0 / 2400.0);
    }

    #[test]
    fn test_read_through_tiles() {
        let dir = tempfile::tempdir().unwrap();
        write_tile(dir.path(), "N43E001.hgt", |col, row| (row * 2 + col) as i16);
        let mosaic = Mosaic::new(dir.path().to_owned(), TileMode::InMem).unwrap();

        // NW corner sample of the tile.
        let (col, row) = offset(1.0, 44.0);
        assert_eq!(mosaic.read(col, row).unwrap(), 0.0);

        // 10 samples east and 20 samples south of it.
        assert_eq!(mosaic.read(col + 10, row + 20).unwrap(), 50.0);

        // Its SW sample belongs to the missing tile to the south.
        let (col, row) = offset(1.0, 43.0);
        assert_eq!(mosaic.read(col, row).unwrap(), f64::from(VOID));
        assert!(mosaic.tiles.contains_key(&Coord { x: 1, y: 42 }));
    }

    #[test]
    fn test_read_global_edges() {
        let dir = tempfile::tempdir().unwrap();
        write_tile(dir.path(), "N43E001.hgt", |_, _| 0);
        let mosaic = Mosaic::new(dir.path().to_owned(), TileMode::MemMap).unwrap();
        let (cols, rows) = mosaic.size();
        assert_eq!(mosaic.read(cols - 1, rows - 1).unwrap(), f64::from(VOID));
        assert!(mosaic.tiles.contains_key(&Coord { x: 179, y: -90 }));
        assert!(matches!(
            mosaic.read(cols, 0),
            Err(DemError::OutOfBounds { .. })
        ));
    }
}
