//! On-disk configuration.
//!
//! ```toml
//! [dem]
//! location = "/data/eu_dem_v11_E30N20.TIF"
//! ```

use crate::TerrainError;
use home::home_dir;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default configuration file name.
pub const CONFIG: &str = "config.toml";

const BASEDIR: &str = ".config";

const APP: &str = "geoprofile";

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dem: DemConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DemConfig {
    /// Raster file, or directory of `.hgt` tiles.
    pub location: Option<PathBuf>,
}

impl Config {
    /// Load the specified config file.
    pub fn load<P: AsRef<Path>>(fname: P) -> Result<Self, TerrainError> {
        let fname = fname.as_ref();
        trace!("reading {:?}", fname);
        let content = fs::read_to_string(fname)?;
        Self::parse(&content).map_err(|e| TerrainError::Config(format!("{}: {e}", fname.display())))
    }

    pub fn parse(content: &str) -> Result<Self, TerrainError> {
        toml::from_str(content).map_err(|e| TerrainError::Config(e.to_string()))
    }

    /// Returns the per-user config file, `~/.config/geoprofile/config.toml`.
    pub fn default_file() -> Option<PathBuf> {
        home_dir().map(|home| [home, BASEDIR.into(), APP.into(), CONFIG.into()].iter().collect())
    }

    /// Candidate config files, in lookup order.
    pub fn search_paths() -> Vec<PathBuf> {
        std::iter::once(PathBuf::from(CONFIG))
            .chain(Self::default_file())
            .collect()
    }

    /// Loads the first existing file of `paths`, or the default
    /// (empty) configuration when none exists.
    pub fn discover_in<I>(paths: I) -> Result<Self, TerrainError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        match paths.into_iter().find(|path| path.is_file()) {
            Some(path) => {
                debug!("using config {:?}", path);
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn discover() -> Result<Self, TerrainError> {
        Self::discover_in(Self::search_paths())
    }

    /// Resolves the DEM to open: `explicit` when given, else the
    /// configured `[dem] location`.
    pub fn dem_location(&self, explicit: Option<PathBuf>) -> Result<PathBuf, TerrainError> {
        explicit
            .or_else(|| self.dem.location.clone())
            .ok_or_else(|| {
                TerrainError::Config(format!(
                    "no DEM given and no [dem] location in {}",
                    Self::search_paths()
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(" or ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::TerrainError;
    use std::path::PathBuf;

    #[test]
    fn test_parse() {
        let config = Config::parse("[dem]\nlocation = \"/data/dem.tif\"\n").unwrap();
        assert_eq!(config.dem.location, Some(PathBuf::from("/data/dem.tif")));
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert!(matches!(
            Config::parse("[dem]\nlocation = 3"),
            Err(TerrainError::Config(_))
        ));
    }

    #[test]
    fn test_discover_order() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("config.toml");
        let user = dir.path().join("user.toml");
        std::fs::write(&user, "[dem]\nlocation = \"user.tif\"\n").unwrap();

        let config = Config::discover_in([local.clone(), user.clone()]).unwrap();
        assert_eq!(config.dem.location, Some(PathBuf::from("user.tif")));

        std::fs::write(&local, "[dem]\nlocation = \"local.tif\"\n").unwrap();
        let config = Config::discover_in([local.clone(), user]).unwrap();
        assert_eq!(config.dem.location, Some(PathBuf::from("local.tif")));

        let config = Config::discover_in([dir.path().join("missing.toml")]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_dem_location() {
        let config = Config::parse("[dem]\nlocation = \"configured.tif\"").unwrap();
        assert_eq!(
            config.dem_location(Some("flag.tif".into())).unwrap(),
            PathBuf::from("flag.tif")
        );
        assert_eq!(
            config.dem_location(None).unwrap(),
            PathBuf::from("configured.tif")
        );
        assert!(matches!(
            Config::default().dem_location(None),
            Err(TerrainError::Config(_))
        ));
    }
}
