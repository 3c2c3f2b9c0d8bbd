// SPDX-License-Identifier: GPL-3.0-only

//! Persistent settings
//!
//! Stored as JSON in `$XDG_CONFIG_HOME/smile-camera/config.json`. A missing
//! file yields the defaults; so does a malformed one, with a warning.

use crate::backends::camera::CameraSource;
use crate::backends::location::LocationProvider;
use crate::constants::{APP_ID, services};
use crate::errors::{AppError, AppResult};
use crate::filters::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which camera to open
    pub camera: CameraSource,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Filter selected when the booth starts
    pub default_filter: FilterType,
    /// Where the position for the weather overlay comes from
    pub location: LocationProvider,
    /// Open-Meteo forecast endpoint
    pub weather_url: String,
    /// WAQI feed endpoint
    pub air_quality_url: String,
    /// WAQI API token
    pub air_quality_token: String,
    /// Directory for saved photos (downloads directory when unset)
    pub save_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraSource::default(),
            mirror_preview: true, // Default to mirrored (selfie mode)
            default_filter: FilterType::default(),
            location: LocationProvider::default(),
            weather_url: services::WEATHER_URL.to_string(),
            air_quality_url: services::AIR_QUALITY_URL.to_string(),
            air_quality_token: services::AIR_QUALITY_DEMO_TOKEN.to_string(),
            save_dir: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory on this system, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
                Self::default()
            }
        }
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Directory photos are saved into
    pub fn save_directory(&self) -> PathBuf {
        self.save_dir
            .clone()
            .unwrap_or_else(crate::storage::default_save_dir)
    }
}
