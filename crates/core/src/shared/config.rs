use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BLUR_RADIUS, DEFAULT_BLUR_RADIUS_INCREMENT,
    DEFAULT_MAX_ITER,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("blur_radius must be a positive finite number, got {0}")]
    InvalidRadius(f32),
    #[error("blur_radius_increment must be a non-negative finite number, got {0}")]
    InvalidIncrement(f32),
}

/// Behaviour of the convergence loop. Immutable for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurConfig {
    #[serde(default = "default_blur_radius")]
    pub blur_radius: f32,
    #[serde(default = "default_blur_radius_increment")]
    pub blur_radius_increment: f32,
    #[serde(default = "default_max_iter")]
    pub max_iter: u32,
    #[serde(default)]
    pub add_outline: bool,
}

fn default_blur_radius() -> f32 {
    DEFAULT_BLUR_RADIUS
}

fn default_blur_radius_increment() -> f32 {
    DEFAULT_BLUR_RADIUS_INCREMENT
}

fn default_max_iter() -> u32 {
    DEFAULT_MAX_ITER
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            blur_radius: DEFAULT_BLUR_RADIUS,
            blur_radius_increment: DEFAULT_BLUR_RADIUS_INCREMENT,
            max_iter: DEFAULT_MAX_ITER,
            add_outline: false,
        }
    }
}

impl BlurConfig {
    /// Checked once at startup; the compositor assumes a valid radius.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.blur_radius.is_finite() || self.blur_radius <= 0.0 {
            return Err(ConfigError::InvalidRadius(self.blur_radius));
        }
        if !self.blur_radius_increment.is_finite() || self.blur_radius_increment < 0.0 {
            return Err(ConfigError::InvalidIncrement(self.blur_radius_increment));
        }
        Ok(())
    }

    /// Radius used at iteration `k` (0-indexed).
    pub fn radius_at(&self, iteration: u32) -> f32 {
        self.blur_radius + iteration as f32 * self.blur_radius_increment
    }
}

/// Whole configuration document.
///
/// The `ALPR` section belongs to the detection engine and is forwarded
/// untouched; `BLURRER` drives the convergence loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "ALPR", default = "empty_object")]
    pub alpr: serde_json::Value,
    #[serde(rename = "BLURRER", default)]
    pub blurrer: BlurConfig,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            alpr: empty_object(),
            blurrer: BlurConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads the user config if present, otherwise built-in defaults.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                log::info!("Using config {}", path.display());
                Self::load(&path)
            }
            _ => {
                log::debug!("No user config found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Points the engine at `dir` for its assets unless the config already does.
    pub fn ensure_assets_folder(&mut self, dir: &Path) {
        if !self.alpr.is_object() {
            self.alpr = empty_object();
        }
        if let Some(map) = self.alpr.as_object_mut() {
            map.entry("assets_folder")
                .or_insert_with(|| serde_json::Value::String(dir.display().to_string()));
        }
    }

    /// Serialized engine section, as handed to the engine's init call.
    pub fn engine_settings_json(&self) -> String {
        self.alpr.to_string()
    }
}
