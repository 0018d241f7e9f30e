use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vectorloop_core::logo;
use vectorloop_tick::DEFAULT_FPS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for one animation run. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Tick rate at start.
    pub fps: f64,
    /// Canvas size in pixels.
    pub width: f64,
    pub height: f64,
    /// Rotation added per frame.
    pub degrees_per_frame: f64,
    /// Total run time.
    pub duration_ms: u64,
    /// Shapes to enable, in paint order.
    pub shapes: Vec<String>,
    /// If set, switch to this rate halfway through and reset the loop.
    pub fps_after_reset: Option<f64>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            width: 180.0,
            height: 180.0,
            degrees_per_frame: 1.0,
            duration_ms: 2000,
            shapes: logo::DEFAULT_ENABLED.iter().map(|s| s.to_string()).collect(),
            fps_after_reset: None,
        }
    }
}

impl AnimationConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Self::from_json(&json)
    }

    /// Canvas dimensions must be positive. Frame rates are passed through
    /// to the loop unchecked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
