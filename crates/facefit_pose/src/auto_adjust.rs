//! Measurement-driven scale adjustment
//!
//! Converts an averaged [`FaceMeasurement`] into a size multiplier on the
//! base scale and stores the difference as the manual scale offset.
//! Low-confidence snapshots are refused outright.

use serde::{Deserialize, Serialize};

use crate::adjustment::ManualAdjustment;
use crate::measurement::FaceMeasurement;

/// Lowest confidence an adjustment is ever allowed to act on
pub const MIN_CONFIDENCE: f32 = 0.5;

/// Auto-adjust tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoAdjustConfig {
    /// Snapshots below this confidence are rejected
    pub min_confidence: f32,
    /// Face width in pixels that maps to a scale multiplier of 1.0
    pub reference_face_width: f32,
    pub min_multiplier: f32,
    pub max_multiplier: f32,
}

impl Default for AutoAdjustConfig {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE,
            reference_face_width: 200.0,
            min_multiplier: 0.7,
            max_multiplier: 1.5,
        }
    }
}

/// Result of one auto-adjust attempt
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AutoAdjustOutcome {
    /// Scale offset was written
    Applied { multiplier: f32, offset: f32 },
    /// Confidence too low, adjustment untouched
    Rejected { confidence: f32 },
}

impl AutoAdjustOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Applies measurement snapshots to a [`ManualAdjustment`]
#[derive(Clone, Debug, Default)]
pub struct AutoAdjuster {
    config: AutoAdjustConfig,
}

impl AutoAdjuster {
    /// Build from config; the confidence threshold never drops below
    /// [`MIN_CONFIDENCE`] and the multiplier range is ordered
    pub fn new(mut config: AutoAdjustConfig) -> Self {
        config.min_confidence = config.min_confidence.max(MIN_CONFIDENCE);
        let (lo, hi) = (config.min_multiplier, config.max_multiplier);
        config.min_multiplier = lo.min(hi);
        config.max_multiplier = hi.max(lo);
        Self { config }
    }

    pub fn config(&self) -> &AutoAdjustConfig {
        &self.config
    }

    /// Size the overlay to `base_scale * multiplier`
    ///
    /// `base_scale` is the scale the estimator produces with a zero offset.
    pub fn apply(
        &self,
        snapshot: &FaceMeasurement,
        base_scale: f32,
        adjustment: &mut ManualAdjustment,
    ) -> AutoAdjustOutcome {
        if snapshot.confidence.is_nan() || snapshot.confidence < self.config.min_confidence {
            log::debug!(
                "Auto-adjust rejected: confidence {:.2} < {:.2}",
                snapshot.confidence,
                self.config.min_confidence
            );
            return AutoAdjustOutcome::Rejected {
                confidence: snapshot.confidence,
            };
        }

        let ratio = snapshot.face_width / self.config.reference_face_width;
        let multiplier = if ratio.is_finite() {
            ratio.max(self.config.min_multiplier).min(self.config.max_multiplier)
        } else {
            1.0
        };
        let offset = base_scale * (multiplier - 1.0);

        adjustment.set_scale(offset);
        log::info!("Auto-adjust applied multiplier {:.3}, offset {:+.3}", multiplier, offset);
        AutoAdjustOutcome::Applied {
            multiplier,
            offset: adjustment.scale,
        }
    }
}
