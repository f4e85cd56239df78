//! Editor configuration, read from a JSON file.
//!
//! Every field has a default, so a missing file or a partial file both work.
//! The default location is `<config_dir>/rect-annotate/config.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::color::Rgba;
use crate::error::Result;

const APP_DIR: &str = "rect-annotate";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the local image store.
    pub store_dir: PathBuf,
    /// Canvas size used while no background image is loaded.
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Slack, in pixels, around each rectangle for hit-testing.
    pub hit_tolerance: i32,
    /// A draft must exceed this many pixels on both axes to be committed.
    pub min_draw_size: i32,
    pub nudge_step: i32,
    pub fast_nudge_step: i32,
    /// `None` keeps every undo step.
    pub history_limit: Option<usize>,
    /// Drop existing rectangles when a new background image is loaded.
    pub clear_on_load: bool,
    /// Initial draw colour, `#rrggbb` or `rgba(r, g, b, a)`.
    pub default_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            canvas_width: 800,
            canvas_height: 600,
            hit_tolerance: 1,
            min_draw_size: 5,
            nudge_step: 1,
            fast_nudge_step: 15,
            history_limit: None,
            clear_on_load: false,
            default_color: Rgba::default().to_string(),
        }
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The configured draw colour; an unparsable value falls back to the default.
    pub fn initial_color(&self) -> Rgba {
        self.default_color.parse().unwrap_or_else(|e| {
            log::warn!("{e}, using default draw color");
            Rgba::default()
        })
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fast_nudge_step, 15);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "canvas_width": 320, "clear_on_load": true }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.canvas_size(), (320, 600));
        assert!(config.clear_on_load);
        assert_eq!(config.min_draw_size, 5);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            history_limit: Some(20),
            default_color: "#3366ff".into(),
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn bad_color_falls_back() {
        let config = Config {
            default_color: "chartreuse".into(),
            ..Config::default()
        };
        assert_eq!(config.initial_color(), Rgba::default());
    }
}
