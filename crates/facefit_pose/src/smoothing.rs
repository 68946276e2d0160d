//! Exponential transform smoothing
//!
//! Blends each new transform with the previously smoothed one. Landmark
//! jitter is mostly high frequency, so a single weight is enough here.

use crate::estimator::OverlayTransform;

/// Largest accepted smoothing weight; 1.0 would freeze the overlay
pub const MAX_SMOOTHING: f32 = 0.99;

/// Exponential moving average over transforms
#[derive(Clone, Debug)]
pub struct TransformSmoother {
    /// Weight of the previous value, 0 = off
    factor: f32,
    last: Option<OverlayTransform>,
}

impl TransformSmoother {
    pub fn new(factor: f32) -> Self {
        Self {
            factor: Self::sanitize(factor),
            last: None,
        }
    }

    fn sanitize(factor: f32) -> f32 {
        if factor.is_finite() {
            factor.clamp(0.0, MAX_SMOOTHING)
        } else {
            0.0
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn set_factor(&mut self, factor: f32) {
        self.factor = Self::sanitize(factor);
    }

    /// Feed a target transform and get the smoothed output
    ///
    /// The first value after construction or [`reset`](Self::reset) passes
    /// through unchanged.
    pub fn smooth(&mut self, target: OverlayTransform) -> OverlayTransform {
        let out = match self.last {
            Some(prev) => prev.lerp(&target, 1.0 - self.factor),
            None => target,
        };
        self.last = Some(out);
        out
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for TransformSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}
