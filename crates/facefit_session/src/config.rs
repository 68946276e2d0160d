//! Session configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. File named by the `FACEFIT_CONFIG` environment variable
//! 2. `facefit.toml` in the working directory
//! 3. Built-in defaults
//!
//! Every field is optional; missing ones take their default. An inverted
//! `[calibration]` scale range is reordered on load.
//!
//! # Example Config File
//!
//! ```toml
//! auto_adjust_interval = 3.0
//! adjustment_path = "adjustment.json"
//!
//! [frame]
//! width = 1280.0
//! height = 720.0
//!
//! [camera]
//! fov_y_degrees = 55.0
//!
//! [calibration]
//! depth = 4.0
//! scale_mode = "manual"
//! base_scale = 1.1
//! ```

use std::path::{Path, PathBuf};

use facefit_pose::{AutoAdjustConfig, CalibrationParams, FrameSize, ViewProjection};
use facefit_render::Camera;
use serde::{Deserialize, Serialize};

use crate::controls::ControlSteps;
use crate::error::Result;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "FACEFIT_CONFIG";

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "facefit.toml";

/// Camera intrinsics for the overlay view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Complete session configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Video frame size in pixels
    pub frame: FrameSize,
    pub camera: CameraConfig,
    pub calibration: CalibrationParams,
    pub auto_adjust: AutoAdjustConfig,
    /// Seconds between auto-adjust passes, 0 disables auto-adjust
    pub auto_adjust_interval: f64,
    /// Minimum seconds between face measurements
    pub measurement_interval: f64,
    /// Step sizes for keyed adjustments
    pub controls: ControlSteps,
    /// Where manual adjustments are saved
    pub adjustment_path: PathBuf,
    /// Config file this was loaded from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameSize::default(),
            camera: CameraConfig::default(),
            calibration: CalibrationParams::default(),
            auto_adjust: AutoAdjustConfig::default(),
            auto_adjust_interval: 3.0,
            measurement_interval: 1.0,
            controls: ControlSteps::default(),
            adjustment_path: PathBuf::from("facefit_adjustment.json"),
            config_path: None,
        }
    }
}

impl SessionConfig {
    /// Load from the first available source, falling back to defaults
    ///
    /// A file that exists but fails to parse is logged and skipped.
    pub fn load() -> Self {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                candidates.push(PathBuf::from(path));
            }
        }
        candidates.push(PathBuf::from(DEFAULT_CONFIG_FILE));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => {
                    log::info!("Loaded session config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring config {}: {}", path.display(), e),
            }
        }

        log::info!("Using default session config");
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.calibration = config.calibration.normalized();
        Ok(config)
    }

    /// Camera matching the frame aspect ratio
    pub fn build_camera(&self) -> Camera {
        Camera::perspective(
            self.camera.fov_y_degrees.to_radians(),
            self.frame.aspect(),
            self.camera.near,
            self.camera.far,
        )
    }
}

/// Unprojection matrices for a camera
pub fn view_projection(camera: &Camera) -> ViewProjection {
    ViewProjection::new(camera.inverse_projection_matrix(), camera.world_matrix())
}
