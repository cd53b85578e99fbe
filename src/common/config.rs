// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Import settings.
//!
//! Settings are plain data deserialized from RON. Every field has a default, so a settings file
//! only needs to name the values it changes:
//!
//! ```text
//! (
//!     bsp: (
//!         brush_geometry_cells: (cell_size: 1024),
//!         parse_visibility: true,
//!     ),
//! )
//! ```

use std::{fs, path::Path};

use failure::{Error, ResultExt};

pub const DEFAULT_CELL_SIZE: u32 = 2048;

/// Controls how a mesh is split into grid cells before emission.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct CellsConfig {
    pub use_cells: bool,
    /// Cell edge length in target units. Zero disables splitting.
    pub cell_size: u32,
    pub parallelize_cell_splitting: bool,
}

impl Default for CellsConfig {
    fn default() -> Self {
        CellsConfig {
            use_cells: true,
            cell_size: DEFAULT_CELL_SIZE,
            parallelize_cell_splitting: true,
        }
    }
}

impl CellsConfig {
    pub fn disabled() -> CellsConfig {
        CellsConfig {
            use_cells: false,
            ..CellsConfig::default()
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct BspImportConfig {
    pub brush_geometry_cells: CellsConfig,
    pub displacement_cells: CellsConfig,
    pub detail_prop_cells: CellsConfig,
    /// Passed through to mesh sinks which can produce self-contained output.
    pub portable: bool,
    pub import_detail_objects: bool,
    pub import_detail_props: bool,
    pub parse_visibility: bool,
}

impl Default for BspImportConfig {
    fn default() -> Self {
        BspImportConfig {
            brush_geometry_cells: CellsConfig::default(),
            displacement_cells: CellsConfig::disabled(),
            detail_prop_cells: CellsConfig::default(),
            portable: false,
            import_detail_objects: true,
            import_detail_props: true,
            parse_visibility: false,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ImportConfig {
    pub bsp: BspImportConfig,
}

impl ImportConfig {
    pub fn from_ron_str(text: &str) -> Result<ImportConfig, Error> {
        Ok(ron::de::from_str(text).context("Failed to parse import settings")?)
    }

    pub fn load<P>(path: P) -> Result<ImportConfig, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|_| format!("Failed to read {}", path.display()))?;
        let config = ImportConfig::from_ron_str(&text)?;
        debug!("Loaded import settings from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, Error> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert!(config.bsp.brush_geometry_cells.use_cells);
        assert_eq!(config.bsp.brush_geometry_cells.cell_size, 2048);
        assert!(config.bsp.brush_geometry_cells.parallelize_cell_splitting);
        assert!(!config.bsp.displacement_cells.use_cells);
        assert_eq!(config.bsp.displacement_cells.cell_size, 2048);
        assert!(config.bsp.detail_prop_cells.use_cells);
        assert!(!config.bsp.portable);
        assert!(config.bsp.import_detail_objects);
        assert!(config.bsp.import_detail_props);
        assert!(!config.bsp.parse_visibility);
    }

    #[test]
    fn test_partial_ron() {
        let config = ImportConfig::from_ron_str(
            "(bsp: (brush_geometry_cells: (cell_size: 1024), parse_visibility: true))",
        )
        .unwrap();
        assert_eq!(config.bsp.brush_geometry_cells.cell_size, 1024);
        assert!(config.bsp.brush_geometry_cells.use_cells);
        assert!(config.bsp.parse_visibility);
        assert_eq!(config.bsp.detail_prop_cells, CellsConfig::default());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = ImportConfig::default();
        config.bsp.portable = true;
        let text = config.to_ron_string().unwrap();
        assert_eq!(ImportConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_bad_ron() {
        assert!(ImportConfig::from_ron_str("(bsp: (portable: 7))").is_err());
    }
}
