//! # facefit_pose - Head Pose to Overlay Transform
//!
//! Turns one frame of face landmarks into a world-space placement for a
//! rigid overlay, and samples face measurements for automatic sizing.
//!
//! # Pipeline
//!
//! ```text
//! FaceLandmarkSet ──► PoseEstimator ──► TransformSmoother ──► OverlayTransform
//!        │                 ▲
//!        │                 └── CalibrationParams + ManualAdjustment
//!        ▼
//! MeasurementSampler ──► average() ──► AutoAdjuster ──► ManualAdjustment.scale
//! ```
//!
//! Nothing here returns errors. Missing landmarks either fall back to
//! proportional estimates or hold the previous transform.
//!
//! # Example
//!
//! ```ignore
//! use facefit_pose::prelude::*;
//!
//! let mut estimator = PoseEstimator::new(CalibrationParams::default());
//! let view = ViewProjection::perspective(1.0, 4.0 / 3.0, 0.1, 100.0);
//! let transform = estimator.estimate(&landmarks, FrameSize::default(), &view, &ManualAdjustment::default());
//! ```

pub mod adjustment;
pub mod auto_adjust;
pub mod calibration;
pub mod estimator;
pub mod landmarks;
pub mod measurement;
pub mod projection;
pub mod smoothing;

pub mod prelude {
    //! Common imports for pose estimation
    pub use crate::adjustment::ManualAdjustment;
    pub use crate::auto_adjust::{AutoAdjustConfig, AutoAdjustOutcome, AutoAdjuster};
    pub use crate::calibration::{CalibrationParams, ScaleMode};
    pub use crate::estimator::{OverlayTransform, PoseEstimator, PoseMetrics};
    pub use crate::landmarks::{index, FaceLandmarkSet, FrameSize, LandmarkPoint};
    pub use crate::measurement::{FaceMeasurement, MeasurementSampler};
    pub use crate::projection::{pixel_to_ndc, ViewProjection};
    pub use crate::smoothing::TransformSmoother;
}

pub use prelude::*;
