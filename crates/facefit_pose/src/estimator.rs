//! Landmarks to overlay transform
//!
//! [`PoseEstimator`] turns one frame of landmarks into an [`OverlayTransform`].
//! It keeps the last good transform and returns it untouched whenever the
//! frame cannot produce a trustworthy one.

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::adjustment::ManualAdjustment;
use crate::calibration::{CalibrationParams, ScaleMode};
use crate::landmarks::{index, FaceLandmarkSet, FrameSize};
use crate::projection::{pixel_to_ndc, ViewProjection};

/// Landmarks without which no transform is produced
pub const REQUIRED_ANCHORS: [usize; 5] = [
    index::LEFT_EYE_OUTER,
    index::RIGHT_EYE_OUTER,
    index::NOSE_BRIDGE,
    index::LEFT_TEMPLE,
    index::RIGHT_TEMPLE,
];

/// World-space placement of the overlay
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayTransform {
    pub position: Vec3,
    /// Euler angles in radians: x = pitch, y = yaw, z = roll
    pub rotation: Vec3,
    pub scale: f32,
}

impl OverlayTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: 1.0,
    };

    pub fn yaw(&self) -> f32 {
        self.rotation.y
    }

    pub fn pitch(&self) -> f32 {
        self.rotation.x
    }

    pub fn roll(&self) -> f32 {
        self.rotation.z
    }

    /// Orientation applied yaw first, then pitch, then roll
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.quat(), self.position)
    }

    /// Component-wise interpolation towards `other`
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.lerp(other.rotation, t),
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

impl Default for OverlayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Intermediate values of the last successful estimate
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseMetrics {
    /// Distance between eye centres in pixels
    pub eye_distance: f32,
    /// Mount point in pixels after offsets
    pub mount_pixel: Vec2,
    /// Mount point in NDC
    pub ndc: Vec2,
}

/// Anchor positions for one frame, pixels plus raw depth where it matters
struct Anchors {
    left_eye_center: Vec2,
    right_eye_center: Vec2,
    nose_bridge: Vec2,
    left_temple: Vec2,
    right_temple: Vec2,
    left_temple_z: f32,
    right_temple_z: f32,
    /// `nose_tip.z - forehead.z` when both are present
    pitch_depth: Option<f32>,
}

impl Anchors {
    fn resolve(landmarks: &FaceLandmarkSet, frame: FrameSize) -> Option<Self> {
        let left_outer = landmarks.get(index::LEFT_EYE_OUTER)?;
        let right_outer = landmarks.get(index::RIGHT_EYE_OUTER)?;
        let nose_bridge = landmarks.get(index::NOSE_BRIDGE)?;
        let left_temple = landmarks.get(index::LEFT_TEMPLE)?;
        let right_temple = landmarks.get(index::RIGHT_TEMPLE)?;

        // Without the inner corner the outer corner stands in for the centre
        let eye_center = |outer: Vec2, inner: usize| match landmarks.pixel(inner, frame) {
            Some(inner) => (outer + inner) * 0.5,
            None => outer,
        };

        let pitch_depth = match (landmarks.get(index::NOSE_TIP), landmarks.get(index::FOREHEAD)) {
            (Some(tip), Some(forehead)) => Some(tip.z - forehead.z),
            _ => None,
        };

        Some(Self {
            left_eye_center: eye_center(left_outer.to_pixels(frame), index::LEFT_EYE_INNER),
            right_eye_center: eye_center(right_outer.to_pixels(frame), index::RIGHT_EYE_INNER),
            nose_bridge: nose_bridge.to_pixels(frame),
            left_temple: left_temple.to_pixels(frame),
            right_temple: right_temple.to_pixels(frame),
            left_temple_z: left_temple.z,
            right_temple_z: right_temple.z,
            pitch_depth,
        })
    }
}

/// Per-frame pose pipeline
///
/// Holds the calibration and the previous output. The same landmarks,
/// calibration and adjustment always give the same transform.
#[derive(Clone, Debug)]
pub struct PoseEstimator {
    calibration: CalibrationParams,
    previous: OverlayTransform,
    metrics: Option<PoseMetrics>,
}

impl PoseEstimator {
    pub fn new(calibration: CalibrationParams) -> Self {
        Self {
            calibration,
            previous: OverlayTransform::IDENTITY,
            metrics: None,
        }
    }

    pub fn calibration(&self) -> &CalibrationParams {
        &self.calibration
    }

    pub fn set_calibration(&mut self, calibration: CalibrationParams) {
        self.calibration = calibration;
    }

    /// Last transform returned by [`estimate`](Self::estimate)
    pub fn previous(&self) -> OverlayTransform {
        self.previous
    }

    /// Metrics of the last frame that produced a new transform
    pub fn metrics(&self) -> Option<PoseMetrics> {
        self.metrics
    }

    pub fn reset(&mut self) {
        self.previous = OverlayTransform::IDENTITY;
        self.metrics = None;
    }

    /// Compute the overlay transform for one frame
    ///
    /// A missing required anchor, or any non-finite intermediate, returns the
    /// previous transform unchanged.
    pub fn estimate(
        &mut self,
        landmarks: &FaceLandmarkSet,
        frame: FrameSize,
        view: &ViewProjection,
        adjustment: &ManualAdjustment,
    ) -> OverlayTransform {
        self.try_estimate(landmarks, frame, view, adjustment)
            .unwrap_or(self.previous)
    }

    /// Like [`estimate`](Self::estimate), but `None` when the frame holds
    ///
    /// Callers that post-process fresh transforms (smoothing) use this to
    /// leave held frames untouched.
    pub fn try_estimate(
        &mut self,
        landmarks: &FaceLandmarkSet,
        frame: FrameSize,
        view: &ViewProjection,
        adjustment: &ManualAdjustment,
    ) -> Option<OverlayTransform> {
        let Some(anchors) = Anchors::resolve(landmarks, frame) else {
            log::trace!("Required pose anchor missing, holding previous transform");
            return None;
        };

        let cal = &self.calibration;

        let eye_distance = anchors.right_eye_center.distance(anchors.left_eye_center);

        let mount_pixel = anchors.nose_bridge
            + cal.mount_offset
            + Vec2::new(adjustment.position_x, adjustment.position_y);
        let ndc = pixel_to_ndc(mount_pixel, frame);

        let Some(world) = view.unproject_at_depth(ndc, cal.depth) else {
            log::debug!("Mount point {:?} did not unproject in front of the camera", ndc);
            return None;
        };
        let position = world + Vec3::new(0.0, 0.0, adjustment.position_z);

        let base_scale = match cal.scale_mode {
            ScaleMode::Manual => cal.base_scale,
            ScaleMode::Automatic => eye_distance * cal.auto_scale_factor,
        };
        let scale = cal.clamp_scale(base_scale + adjustment.scale);

        let yaw = (anchors.right_temple_z - anchors.left_temple_z) * cal.yaw_multiplier;
        let pitch = anchors.pitch_depth.map_or(0.0, |d| d * cal.pitch_multiplier);
        let ear_line = anchors.right_temple - anchors.left_temple;
        let roll = ear_line.y.atan2(ear_line.x) * cal.roll_sign;

        let transform = OverlayTransform {
            position,
            rotation: Vec3::new(pitch, yaw, roll) + adjustment.rotation_offset(),
            scale,
        };

        if !transform.is_finite() {
            log::debug!("Non-finite pose computed, holding previous transform");
            return None;
        }

        self.previous = transform;
        self.metrics = Some(PoseMetrics {
            eye_distance,
            mount_pixel,
            ndc,
        });
        Some(transform)
    }
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self::new(CalibrationParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkPoint;
    use approx::assert_relative_eq;

    fn frame() -> FrameSize {
        FrameSize::new(640.0, 480.0)
    }

    fn view() -> ViewProjection {
        ViewProjection::perspective(60f32.to_radians(), 4.0 / 3.0, 0.1, 100.0)
    }

    fn px(x: f32, y: f32, z: f32) -> LandmarkPoint {
        LandmarkPoint::new(x / 640.0, y / 480.0, z)
    }

    fn face() -> FaceLandmarkSet {
        FaceLandmarkSet::empty()
            .with(index::LEFT_EYE_OUTER, px(100.0, 200.0, 0.0))
            .with(index::RIGHT_EYE_OUTER, px(200.0, 200.0, 0.0))
            .with(index::NOSE_BRIDGE, px(150.0, 210.0, 0.0))
            .with(index::LEFT_TEMPLE, px(80.0, 205.0, 0.0))
            .with(index::RIGHT_TEMPLE, px(220.0, 205.0, 0.0))
    }

    #[test]
    fn test_quat_uses_yaw_pitch_roll_order() {
        let t = OverlayTransform {
            rotation: Vec3::new(0.1, 0.2, 0.3),
            ..OverlayTransform::IDENTITY
        };
        let expected = Quat::from_rotation_y(0.2) * Quat::from_rotation_x(0.1) * Quat::from_rotation_z(0.3);
        assert!(t.quat().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_inner_corners_shift_eye_centres() {
        let landmarks = face()
            .with(index::LEFT_EYE_INNER, px(130.0, 200.0, 0.0))
            .with(index::RIGHT_EYE_INNER, px(170.0, 200.0, 0.0));
        let mut estimator = PoseEstimator::default();
        estimator.estimate(&landmarks, frame(), &view(), &ManualAdjustment::default());

        // Centres at 115 and 185
        assert_relative_eq!(estimator.metrics().unwrap().eye_distance, 70.0, epsilon = 1e-3);
    }

    #[test]
    fn test_pitch_defaults_to_zero_without_forehead() {
        let mut estimator = PoseEstimator::default();
        let landmarks = face().with(index::NOSE_TIP, px(150.0, 240.0, -0.1));
        let t = estimator.estimate(&landmarks, frame(), &view(), &ManualAdjustment::default());
        assert_eq!(t.pitch(), 0.0);

        let landmarks = landmarks.with(index::FOREHEAD, px(150.0, 100.0, -0.2));
        let t = estimator.estimate(&landmarks, frame(), &view(), &ManualAdjustment::default());
        let expected = 0.1 * CalibrationParams::default().pitch_multiplier;
        assert_relative_eq!(t.pitch(), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_yaw_follows_temple_depth() {
        let landmarks = face()
            .with(index::LEFT_TEMPLE, px(80.0, 205.0, -0.05))
            .with(index::RIGHT_TEMPLE, px(220.0, 205.0, 0.05));
        let mut estimator = PoseEstimator::default();
        let t = estimator.estimate(&landmarks, frame(), &view(), &ManualAdjustment::default());
        assert!(t.yaw() > 0.0);
        assert_relative_eq!(t.yaw(), 0.1 * CalibrationParams::default().yaw_multiplier, epsilon = 1e-5);
    }

    #[test]
    fn test_roll_from_temple_line() {
        // Right temple 140 px right and 140 px lower: 45 degrees in image space
        let landmarks = face().with(index::RIGHT_TEMPLE, px(220.0, 345.0, 0.0));
        let mut estimator = PoseEstimator::default();
        let t = estimator.estimate(&landmarks, frame(), &view(), &ManualAdjustment::default());
        let expected = std::f32::consts::FRAC_PI_4 * CalibrationParams::default().roll_sign;
        assert_relative_eq!(t.roll(), expected, epsilon = 1e-4);
    }

    #[test]
    fn test_manual_scale_mode_ignores_eye_distance() {
        let cal = CalibrationParams::default().with_manual_scale(1.3);
        let mut estimator = PoseEstimator::new(cal);
        let t = estimator.estimate(&face(), frame(), &view(), &ManualAdjustment::default());
        assert_relative_eq!(t.scale, 1.3);
    }

    #[test]
    fn test_adjustment_rotation_is_additive() {
        let mut estimator = PoseEstimator::default();
        let base = estimator.estimate(&face(), frame(), &view(), &ManualAdjustment::default());

        let mut adj = ManualAdjustment::default();
        adj.nudge_rotation(Vec3::new(0.05, -0.1, 0.2));
        let nudged = estimator.estimate(&face(), frame(), &view(), &adj);

        assert!((nudged.rotation - base.rotation).abs_diff_eq(Vec3::new(0.05, -0.1, 0.2), 1e-6));
        assert_eq!(nudged.position, base.position);
    }

    #[test]
    fn test_adjustment_scale_is_additive() {
        let cal = CalibrationParams::default().with_manual_scale(1.0);
        let mut estimator = PoseEstimator::new(cal);

        let mut adj = ManualAdjustment::default();
        adj.nudge_scale(0.05);
        adj.nudge_scale(0.05);
        let t = estimator.estimate(&face(), frame(), &view(), &adj);
        assert_relative_eq!(t.scale, 1.1, epsilon = 1e-6);

        // Offsets past the clamp saturate
        adj.nudge_scale(5.0);
        let t = estimator.estimate(&face(), frame(), &view(), &adj);
        assert_eq!(t.scale, CalibrationParams::default().max_scale);
    }

    #[test]
    fn test_try_estimate_signals_hold() {
        let mut estimator = PoseEstimator::default();
        let adj = ManualAdjustment::default();
        let fresh = estimator.try_estimate(&face(), frame(), &view(), &adj).unwrap();

        let mut partial = face();
        partial.clear(index::NOSE_BRIDGE);
        assert!(estimator.try_estimate(&partial, frame(), &view(), &adj).is_none());
        assert_eq!(estimator.estimate(&partial, frame(), &view(), &adj), fresh);
    }

    #[test]
    fn test_inverted_scale_range_does_not_panic() {
        let cal: CalibrationParams = serde_json::from_str(r#"{ "min_scale": 3.0 }"#).unwrap();
        let mut estimator = PoseEstimator::new(cal);
        let t = estimator.estimate(&face(), frame(), &view(), &ManualAdjustment::default());
        // Eye distance 100 px maps to 1.0, lifted into [2, 3]
        assert_eq!(t.scale, 2.0);
    }

    #[test]
    fn test_reset_forgets_previous() {
        let mut estimator = PoseEstimator::default();
        estimator.estimate(&face(), frame(), &view(), &ManualAdjustment::default());
        assert_ne!(estimator.previous(), OverlayTransform::IDENTITY);

        estimator.reset();
        assert_eq!(estimator.previous(), OverlayTransform::IDENTITY);
        assert!(estimator.metrics().is_none());
    }
}
