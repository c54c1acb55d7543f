//! On-disk settings.
//!
//! A single JSON document holding everything that used to live spread
//! across the teacher's multi-file YAML configuration directory. If the
//! file is absent, defaults are written to disk before being returned so
//! the next run (and the player) can see and edit them.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Mean/stddev pair used to sample a Gaussian count during genesis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpawnRate {
    pub mean: f64,
    pub stddev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRates {
    pub star: SpawnRate,
    pub rock: SpawnRate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnOffsets {
    pub star: f64,
    pub rock: f64,
}

/// Top-level settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub fps: f64,
    pub default_simrate: f64,
    pub aspect_ratio_x: f64,
    pub aspect_ratio_y: f64,
    pub crosshair_color: String,
    pub show_labels: u8,
    pub spawn_rate: SpawnRates,
    pub spawn_offset: SpawnOffsets,
    pub computer_players: u32,
    pub custom_commands: HashMap<String, String>,
    pub hotkey_commands: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: 20.0,
            default_simrate: -100.0,
            aspect_ratio_x: 29.0,
            aspect_ratio_y: 64.0,
            crosshair_color: "pink".to_string(),
            show_labels: 0,
            spawn_rate: SpawnRates {
                star: SpawnRate { mean: 10.0, stddev: 1.0 },
                rock: SpawnRate { mean: 30.0, stddev: 10.0 },
            },
            spawn_offset: SpawnOffsets {
                star: 1e6,
                rock: 1e4,
            },
            computer_players: 50,
            custom_commands: HashMap::new(),
            hotkey_commands: HashMap::new(),
        }
    }
}

impl Settings {
    /// The aspect ratio derived from `aspect_ratio_x / aspect_ratio_y`.
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio_x / self.aspect_ratio_y
    }

    /// Load settings from `path`, writing out the defaults first if the
    /// file does not exist.
    pub fn load_or_write_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no settings file at {}, writing defaults", path.display());
            let defaults = Settings::default();
            defaults.write(path)?;
            return Ok(defaults);
        }
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Serialize and write these settings to `path`, creating parent
    /// directories as needed.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// The default settings file path under the OS-appropriate config
    /// directory, falling back to `./settings.json` if no home directory
    /// can be resolved.
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("", "", "starhelm") {
            Some(dirs) => dirs.config_dir().join("settings.json"),
            None => PathBuf::from("settings.json"),
        }
    }
}
