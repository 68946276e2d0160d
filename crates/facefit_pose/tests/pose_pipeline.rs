//! Integration tests for the pose pipeline
//!
//! Covers the frame-to-transform path end to end:
//! - Holding the previous transform on missing anchors
//! - Determinism and scale clamping
//! - Yaw, pitch, roll application order
//! - Measurement confidence, history bound and auto-adjust gating

use approx::assert_relative_eq;
use facefit_pose::prelude::*;
use glam::{Vec2, Vec3};

const WIDTH: f32 = 640.0;
const HEIGHT: f32 = 480.0;
const FOV: f32 = std::f32::consts::FRAC_PI_3;

fn frame() -> FrameSize {
    FrameSize::new(WIDTH, HEIGHT)
}

fn view() -> ViewProjection {
    ViewProjection::perspective(FOV, WIDTH / HEIGHT, 0.1, 100.0)
}

fn px(x: f32, y: f32) -> LandmarkPoint {
    LandmarkPoint::new(x / WIDTH, y / HEIGHT, 0.0)
}

/// Eye corners 100 px apart at y = 200, bridge at (150, 210)
fn reference_face() -> FaceLandmarkSet {
    FaceLandmarkSet::empty()
        .with(index::LEFT_EYE_OUTER, px(100.0, 200.0))
        .with(index::RIGHT_EYE_OUTER, px(200.0, 200.0))
        .with(index::NOSE_BRIDGE, px(150.0, 210.0))
        .with(index::LEFT_TEMPLE, px(70.0, 205.0))
        .with(index::RIGHT_TEMPLE, px(230.0, 205.0))
}

fn zero_offset_calibration() -> CalibrationParams {
    CalibrationParams::default().with_mount_offset(0.0, 0.0)
}

#[test]
fn test_end_to_end_reference_face() {
    let depth = 5.0;
    let mut estimator = PoseEstimator::new(zero_offset_calibration().with_depth(depth));
    let transform = estimator.estimate(&reference_face(), frame(), &view(), &ManualAdjustment::default());

    let metrics = estimator.metrics().expect("estimate should succeed");
    assert_relative_eq!(metrics.eye_distance, 100.0, epsilon = 1e-3);

    let ndc_x = (150.0 / WIDTH) * 2.0 - 1.0;
    let ndc_y = -(210.0 / HEIGHT) * 2.0 + 1.0;
    assert!(metrics.ndc.abs_diff_eq(Vec2::new(ndc_x, ndc_y), 1e-5));

    let half_height = depth * (FOV / 2.0).tan();
    let expected = Vec3::new(ndc_x * half_height * (WIDTH / HEIGHT), ndc_y * half_height, -depth);
    assert!(
        transform.position.abs_diff_eq(expected, 1e-3),
        "position {:?} != {:?}",
        transform.position,
        expected
    );

    // 100 px * 0.01 per px
    assert_relative_eq!(transform.scale, 1.0, epsilon = 1e-4);
}

#[test]
fn test_missing_required_anchor_holds_previous() {
    let mut estimator = PoseEstimator::new(zero_offset_calibration());
    let adj = ManualAdjustment::default();
    let first = estimator.estimate(&reference_face(), frame(), &view(), &adj);

    for anchor in [
        index::LEFT_EYE_OUTER,
        index::RIGHT_EYE_OUTER,
        index::NOSE_BRIDGE,
        index::LEFT_TEMPLE,
        index::RIGHT_TEMPLE,
    ] {
        // Move the face so a real estimate would differ
        let mut partial = reference_face()
            .with(index::NOSE_BRIDGE, px(300.0, 300.0))
            .with(index::LEFT_TEMPLE, px(10.0, 300.0));
        partial.clear(anchor);

        let held = estimator.estimate(&partial, frame(), &view(), &adj);
        assert_eq!(held, first, "anchor {} should hold the transform", anchor);
    }
}

#[test]
fn test_missing_anchor_on_first_frame_returns_identity() {
    let mut estimator = PoseEstimator::default();
    let out = estimator.estimate(&FaceLandmarkSet::empty(), frame(), &view(), &ManualAdjustment::default());
    assert_eq!(out, OverlayTransform::IDENTITY);
}

#[test]
fn test_estimate_is_deterministic() {
    let mut adj = ManualAdjustment::default();
    adj.nudge_position(Vec3::new(3.0, -2.0, 0.1));
    adj.nudge_rotation(Vec3::new(0.01, 0.02, 0.03));

    let face = reference_face().with(index::NOSE_TIP, px(150.0, 240.0)).with(index::FOREHEAD, px(150.0, 120.0));

    let mut a = PoseEstimator::default();
    let mut b = PoseEstimator::default();
    let first = a.estimate(&face, frame(), &view(), &adj);
    let again = a.estimate(&face, frame(), &view(), &adj);
    let fresh = b.estimate(&face, frame(), &view(), &adj);

    assert_eq!(first, again);
    assert_eq!(first, fresh);
}

#[test]
fn test_scale_is_clamped_for_extreme_eye_distance() {
    let cal = zero_offset_calibration();
    let (min, max) = (cal.min_scale, cal.max_scale);
    let wide = FrameSize::new(4000.0, 3000.0);
    let view = ViewProjection::perspective(FOV, 4.0 / 3.0, 0.1, 100.0);

    let face_with_eyes = |left: f32, right: f32| {
        FaceLandmarkSet::empty()
            .with(index::LEFT_EYE_OUTER, LandmarkPoint::new(left, 0.5, 0.0))
            .with(index::RIGHT_EYE_OUTER, LandmarkPoint::new(right, 0.5, 0.0))
            .with(index::NOSE_BRIDGE, LandmarkPoint::new(0.5, 0.5, 0.0))
            .with(index::LEFT_TEMPLE, LandmarkPoint::new(0.1, 0.5, 0.0))
            .with(index::RIGHT_TEMPLE, LandmarkPoint::new(0.9, 0.5, 0.0))
    };

    let mut estimator = PoseEstimator::new(cal);

    // Zero eye distance
    let t = estimator.estimate(&face_with_eyes(0.5, 0.5), wide, &view, &ManualAdjustment::default());
    assert_eq!(estimator.metrics().map(|m| m.eye_distance), Some(0.0));
    assert!(t.scale >= min && t.scale <= max);
    assert_eq!(t.scale, min);

    // 10x the 100 px reference distance
    let t = estimator.estimate(&face_with_eyes(0.25, 0.5), wide, &view, &ManualAdjustment::default());
    assert_relative_eq!(estimator.metrics().map(|m| m.eye_distance).unwrap_or(0.0), 1000.0, epsilon = 1e-2);
    assert_eq!(t.scale, max);

    // A huge manual offset is clamped as well
    let mut adj = ManualAdjustment::default();
    adj.set_scale(50.0);
    let t = estimator.estimate(&face_with_eyes(0.45, 0.5), wide, &view, &adj);
    assert_eq!(t.scale, max);
}

#[test]
fn test_rotation_order_yaw_pitch_roll() {
    let transform = OverlayTransform {
        position: Vec3::ZERO,
        rotation: Vec3::new(0.1, 0.2, 0.3),
        scale: 1.0,
    };
    let q = transform.quat();

    // Columns of Ry(0.2) * Rx(0.1) * Rz(0.3)
    let x_axis = q * Vec3::X;
    let y_axis = q * Vec3::Y;
    let z_axis = q * Vec3::Z;
    assert!(x_axis.abs_diff_eq(Vec3::new(0.942_154_7, 0.294_043_8, -0.160_881_4), 1e-5));
    assert!(y_axis.abs_diff_eq(Vec3::new(-0.270_681_5, 0.950_563_8, 0.152_184_2), 1e-5));
    assert!(z_axis.abs_diff_eq(Vec3::new(0.197_676_8, -0.099_833_4, 0.975_170_3), 1e-5));

    // Roll-first and pitch-first orders land elsewhere
    let zxy = glam::Quat::from_rotation_z(0.3) * glam::Quat::from_rotation_x(0.1) * glam::Quat::from_rotation_y(0.2);
    let xyz = glam::Quat::from_rotation_x(0.1) * glam::Quat::from_rotation_y(0.2) * glam::Quat::from_rotation_z(0.3);
    assert!(!(zxy * Vec3::X).abs_diff_eq(x_axis, 1e-3));
    assert!(!(xyz * Vec3::X).abs_diff_eq(x_axis, 1e-3));
}

#[test]
fn test_confidence_is_resolved_over_nine() {
    let full = FaceLandmarkSet::empty()
        .with(index::LEFT_TEMPLE, px(70.0, 205.0))
        .with(index::RIGHT_TEMPLE, px(230.0, 205.0))
        .with(index::LEFT_EYE_OUTER, px(100.0, 200.0))
        .with(index::RIGHT_EYE_OUTER, px(200.0, 200.0))
        .with(index::LEFT_EYE_INNER_MEASURE, px(120.0, 200.0))
        .with(index::RIGHT_EYE_INNER_MEASURE, px(180.0, 200.0))
        .with(index::NOSE_BRIDGE, px(150.0, 210.0))
        .with(index::FOREHEAD, px(150.0, 100.0))
        .with(index::CHIN, px(150.0, 360.0));

    let m = FaceMeasurement::from_landmarks(&full, frame(), 0.0).expect("temples present");
    assert_eq!(m.confidence, 1.0);

    let mut partial = full.clone();
    for dropped in [index::FOREHEAD, index::CHIN, index::NOSE_BRIDGE, index::LEFT_EYE_INNER_MEASURE, index::RIGHT_EYE_OUTER] {
        partial.clear(dropped);
    }
    let m = FaceMeasurement::from_landmarks(&partial, frame(), 0.0).expect("temples present");
    assert_eq!(m.confidence, 4.0 / 9.0);

    // Below threshold: adjustment untouched
    let mut adj = ManualAdjustment::default();
    let outcome = AutoAdjuster::default().apply(&m, 1.0, &mut adj);
    assert!(!outcome.is_applied());
    assert!(adj.is_default());
}

#[test]
fn test_history_is_bounded_and_rate_limited() {
    let mut sampler = MeasurementSampler::default();

    let face_at = |width: f32| {
        FaceLandmarkSet::empty()
            .with(index::LEFT_TEMPLE, px(100.0, 200.0))
            .with(index::RIGHT_TEMPLE, px(100.0 + width, 200.0))
    };

    for i in 0..11 {
        let now = i as f64;
        assert!(sampler.sample(&face_at(100.0 + i as f32), frame(), now).is_some());
        // Second call in the same second is a no-op
        assert!(sampler.sample(&face_at(999.0), frame(), now + 0.5).is_none());
        assert!(sampler.len() <= 10);
    }

    assert_eq!(sampler.len(), 10);
    let oldest = sampler.history().next().expect("history not empty");
    assert_relative_eq!(oldest.face_width, 101.0, epsilon = 1e-3);
    assert_eq!(oldest.timestamp, 1.0);
}
