//! Calibration parameters
//!
//! Every empirically tuned number in the pose pipeline lives here so it can
//! be loaded from configuration instead of being baked into the math.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How the overlay scale is chosen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Fixed `base_scale`
    Manual,
    /// Derived from the measured eye distance
    #[default]
    Automatic,
}

/// Pose pipeline calibration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Pixel offset from the nose bridge landmark to the mesh bridge
    pub mount_offset: Vec2,

    /// Distance of the unprojection plane in front of the camera
    pub depth: f32,

    /// Radians of yaw per unit of ear-to-ear depth difference
    pub yaw_multiplier: f32,

    /// Radians of pitch per unit of forehead-to-nose-tip depth difference
    pub pitch_multiplier: f32,

    /// Sign applied to the image-space roll angle (image Y points down)
    pub roll_sign: f32,

    /// Scale selection
    pub scale_mode: ScaleMode,

    /// Scale used in [`ScaleMode::Manual`]
    pub base_scale: f32,

    /// Scale per pixel of eye distance in [`ScaleMode::Automatic`]
    pub auto_scale_factor: f32,

    /// Lower scale clamp
    pub min_scale: f32,

    /// Upper scale clamp
    pub max_scale: f32,

    /// Weight of the previous transform when smoothing, in [0, 1)
    pub smoothing: f32,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            mount_offset: Vec2::new(0.0, 5.0),
            depth: 5.0,
            yaw_multiplier: 4.0,
            pitch_multiplier: 3.0,
            roll_sign: -1.0,
            scale_mode: ScaleMode::Automatic,
            base_scale: 1.0,
            auto_scale_factor: 0.01,
            min_scale: 0.5,
            max_scale: 2.0,
            smoothing: 0.25,
        }
    }
}

impl CalibrationParams {
    /// Narrower clamp and stronger rotation response for close-up webcams
    pub fn tight_fit() -> Self {
        Self {
            yaw_multiplier: 5.0,
            pitch_multiplier: 4.0,
            min_scale: 0.75,
            max_scale: 1.5,
            smoothing: 0.5,
            ..Default::default()
        }
    }

    /// Set the mount offset
    pub fn with_mount_offset(mut self, x: f32, y: f32) -> Self {
        self.mount_offset = Vec2::new(x, y);
        self
    }

    /// Set the unprojection depth
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the scale clamp range
    pub fn with_scale_range(mut self, min: f32, max: f32) -> Self {
        self.min_scale = min.min(max);
        self.max_scale = max.max(min);
        self
    }

    /// Use a fixed scale
    pub fn with_manual_scale(mut self, scale: f32) -> Self {
        self.scale_mode = ScaleMode::Manual;
        self.base_scale = scale;
        self
    }

    /// Order the scale range; deserialized params may arrive inverted
    pub fn normalized(self) -> Self {
        let (min, max) = (self.min_scale, self.max_scale);
        self.with_scale_range(min, max)
    }

    /// Clamp a scale into the configured range
    ///
    /// An inverted range is treated as if its bounds were swapped.
    #[inline]
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        let lo = self.min_scale.min(self.max_scale);
        let hi = self.max_scale.max(self.min_scale);
        if scale.is_finite() {
            scale.max(lo).min(hi)
        } else {
            lo
        }
    }
}
