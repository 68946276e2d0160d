//! Integration tests for the try-on frame loop
//!
//! Drives `TryOnSession` with a scripted landmark source and the headless
//! backend:
//! - Face dropout and detector errors hold the overlay and keep rendering
//! - Detector start-up failure is fatal
//! - Render failures propagate out of `tick`
//! - Auto-adjust interval and confidence gating
//! - Default cadence: smoothed hold, measurement and auto-adjust intervals
//! - Additive commands and adjustment persistence

use std::collections::VecDeque;

use approx::assert_relative_eq;
use facefit_pose::{index, AutoAdjustOutcome, FaceLandmarkSet, ManualAdjustment, OverlayTransform, ScaleMode};
use facefit_render::{HeadlessBackend, RenderError};
use facefit_session::prelude::*;
use facefit_session::SessionError;

enum Step {
    Face(FaceLandmarkSet),
    NoFace,
    Fail,
}

/// Plays back a fixed script, then keeps repeating the last full face
struct ScriptedSource {
    steps: VecDeque<Step>,
    fallback: FaceLandmarkSet,
    fail_init: bool,
}

impl ScriptedSource {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            fallback: full_face(),
            fail_init: false,
        }
    }

    fn broken() -> Self {
        Self {
            fail_init: true,
            ..Self::new(Vec::new())
        }
    }
}

impl LandmarkSource for ScriptedSource {
    fn initialize(&mut self) -> facefit_session::Result<()> {
        if self.fail_init {
            return Err(SessionError::DetectorInit("camera unavailable".into()));
        }
        Ok(())
    }

    fn detect(&mut self, _frame_index: u64) -> facefit_session::Result<Option<FaceLandmarkSet>> {
        match self.steps.pop_front() {
            Some(Step::Face(face)) => Ok(Some(face)),
            Some(Step::NoFace) => Ok(None),
            Some(Step::Fail) => Err(SessionError::DetectorInit("inference failed".into())),
            None => Ok(Some(self.fallback.clone())),
        }
    }
}

fn full_face() -> FaceLandmarkSet {
    SyntheticFaceSource::new().face_at(0.0)
}

/// Temples and outer eye corners only: 4 of 9 measurement landmarks
fn sparse_face() -> FaceLandmarkSet {
    let full = full_face();
    [
        index::LEFT_TEMPLE,
        index::RIGHT_TEMPLE,
        index::LEFT_EYE_OUTER,
        index::RIGHT_EYE_OUTER,
    ]
    .into_iter()
    .fold(FaceLandmarkSet::empty(), |set, i| match full.get(i) {
        Some(point) => set.with(i, point),
        None => set,
    })
}

fn config(dir: &tempfile::TempDir) -> SessionConfig {
    let mut config = SessionConfig::default();
    config.adjustment_path = dir.path().join("adjustment.json");
    config.calibration.smoothing = 0.0;
    config.measurement_interval = 0.0;
    config.auto_adjust_interval = 0.0;
    config
}

/// Fixed base scale of 1.0, which auto-adjust sizes relative to
fn manual_config(dir: &tempfile::TempDir) -> SessionConfig {
    let mut config = config(dir);
    config.calibration.scale_mode = ScaleMode::Manual;
    config
}

fn start(config: SessionConfig, source: ScriptedSource) -> TryOnSession<ScriptedSource, HeadlessBackend> {
    match TryOnSession::start(config, source, HeadlessBackend::default()) {
        Ok(session) => session,
        Err(e) => panic!("session failed to start: {}", e),
    }
}

#[test]
fn test_dropout_holds_transform() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = start(
        config(&dir),
        ScriptedSource::new(vec![Step::Face(full_face()), Step::NoFace, Step::NoFace]),
    );

    let first = session.tick(0.0).unwrap();
    assert!(first.face_detected);
    assert_ne!(first.transform, OverlayTransform::IDENTITY);

    for t in [1.0 / 30.0, 2.0 / 30.0] {
        let report = session.tick(t).unwrap();
        assert!(!report.face_detected);
        assert!(report.measurement.is_none());
        assert_eq!(report.transform, first.transform);
    }

    let backend = session.renderer().backend();
    assert_eq!(backend.frames().len(), 3);
    // Parts sit at the overlay root's origin
    for item in &backend.last_frame().items {
        assert!(item.world.abs_diff_eq(first.transform.matrix(), 1e-5));
    }
}

#[test]
fn test_detector_error_keeps_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = start(
        config(&dir),
        ScriptedSource::new(vec![Step::Fail, Step::Face(full_face()), Step::Fail]),
    );

    let report = session.tick(0.0).unwrap();
    assert!(!report.face_detected);
    assert_eq!(report.transform, OverlayTransform::IDENTITY);

    let tracked = session.tick(0.1).unwrap();
    assert!(tracked.face_detected);

    let held = session.tick(0.2).unwrap();
    assert!(!held.face_detected);
    assert_eq!(held.transform, tracked.transform);

    assert_eq!(session.renderer().backend().frames().len(), 3);
    assert_eq!(session.frame_index(), 3);
}

#[test]
fn test_detector_init_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let result = TryOnSession::start(config(&dir), ScriptedSource::broken(), HeadlessBackend::default());
    assert!(matches!(result, Err(SessionError::DetectorInit(_))));
}

#[test]
fn test_render_error_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = HeadlessBackend::default();
    backend.fail_next_draw("device lost");

    let mut session = match TryOnSession::start(config(&dir), ScriptedSource::new(Vec::new()), backend) {
        Ok(session) => session,
        Err(e) => panic!("session failed to start: {}", e),
    };

    let err = session.tick(0.0).unwrap_err();
    assert!(matches!(err, SessionError::Render(RenderError::Backend(_))));

    // Next frame draws again
    assert!(session.tick(0.1).is_ok());
}

#[test]
fn test_auto_adjust_on_interval() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = manual_config(&dir);
    cfg.auto_adjust_interval = 1.0;
    let mut session = start(cfg, ScriptedSource::new(Vec::new()));

    // Timer starts on the first tick
    assert!(session.tick(0.0).unwrap().auto_adjust.is_none());
    assert!(session.tick(0.5).unwrap().auto_adjust.is_none());

    let report = session.tick(1.0).unwrap();
    match report.auto_adjust {
        Some(AutoAdjustOutcome::Applied { multiplier, offset }) => {
            // 0.3 of a 640 px frame against the 200 px reference
            assert_relative_eq!(multiplier, 0.96, epsilon = 1e-4);
            assert_relative_eq!(offset, -0.04, epsilon = 1e-4);
        }
        other => panic!("expected auto-adjust to apply, got {:?}", other),
    }
    assert_relative_eq!(session.adjustment().scale, -0.04, epsilon = 1e-4);

    // The offset shows up in the next frame's scale
    let sized = session.tick(1.25).unwrap();
    assert_relative_eq!(sized.transform.scale, 0.96, epsilon = 1e-4);

    assert!(session.tick(1.5).unwrap().auto_adjust.is_none());
    assert!(session.tick(2.0).unwrap().auto_adjust.is_some());
}

#[test]
fn test_auto_adjust_rejects_low_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = manual_config(&dir);
    cfg.auto_adjust_interval = 1.0;
    let mut session = start(
        cfg,
        ScriptedSource::new(vec![Step::Face(sparse_face()), Step::Face(sparse_face())]),
    );

    let first = session.tick(0.0).unwrap();
    let measurement = first.measurement.unwrap();
    assert_relative_eq!(measurement.confidence, 4.0 / 9.0, epsilon = 1e-6);

    let report = session.tick(1.0).unwrap();
    assert!(matches!(report.auto_adjust, Some(AutoAdjustOutcome::Rejected { .. })));
    assert_eq!(session.adjustment().scale, 0.0);
}

#[test]
fn test_automatic_scale_skips_auto_adjust() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.auto_adjust_interval = 1.0;
    assert_eq!(cfg.calibration.scale_mode, ScaleMode::Automatic);
    let mut session = start(cfg, ScriptedSource::new(Vec::new()));

    for t in [0.0, 1.0, 2.0] {
        assert!(session.tick(t).unwrap().auto_adjust.is_none());
    }
    assert!(session.adjustment().is_default());
}

#[test]
fn test_default_cadence() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = SessionConfig::default();
    cfg.adjustment_path = dir.path().join("adjustment.json");
    cfg.calibration.scale_mode = ScaleMode::Manual;

    let faces = SyntheticFaceSource::new();
    let mut no_bridge = faces.face_at(0.5);
    no_bridge.clear(index::NOSE_BRIDGE);
    let mut session = start(
        cfg,
        ScriptedSource::new(vec![
            Step::Face(faces.face_at(0.0)),
            Step::Face(faces.face_at(0.25)),
            Step::Face(no_bridge),
        ]),
    );

    let reports: Vec<_> = (0..=6).map(|i| session.tick(i as f64 * 0.5).unwrap()).collect();

    // Smoothed motion, then a held frame that stays put
    assert!(reports.iter().all(|r| r.face_detected));
    assert_ne!(reports[1].transform, reports[0].transform);
    assert_eq!(reports[2].transform, reports[1].transform);

    // One measurement per second
    let measured: Vec<f64> = reports
        .iter()
        .filter_map(|r| r.measurement.map(|m| m.timestamp))
        .collect();
    assert_eq!(measured, vec![0.0, 1.0, 2.0, 3.0]);

    // First auto-adjust three seconds after the first frame
    assert!(reports[..6].iter().all(|r| r.auto_adjust.is_none()));
    match reports[6].auto_adjust {
        Some(AutoAdjustOutcome::Applied { offset, .. }) => assert_relative_eq!(offset, -0.04, epsilon = 1e-4),
        other => panic!("expected auto-adjust at 3s, got {:?}", other),
    }
}

#[test]
fn test_commands_are_additive() {
    let dir = tempfile::tempdir().unwrap();
    let mut baseline = start(config(&dir), ScriptedSource::new(Vec::new()));
    let mut session = start(config(&dir), ScriptedSource::new(Vec::new()));

    for _ in 0..3 {
        session.handle_command(Command::MoveRight).unwrap();
    }
    session.handle_command(Command::MoveCloser).unwrap();
    session.handle_command(Command::ScaleUp).unwrap();

    let adj = *session.adjustment();
    assert_eq!(adj.position_x, 6.0);
    assert_relative_eq!(adj.position_z, 0.1, epsilon = 1e-6);
    assert_relative_eq!(adj.scale, 0.05, epsilon = 1e-6);

    let moved = session.tick(0.0).unwrap().transform;
    let base = baseline.tick(0.0).unwrap().transform;
    assert!(moved.position.x > base.position.x);
    assert_relative_eq!(moved.position.z, base.position.z + 0.1, epsilon = 1e-4);
    assert_relative_eq!(moved.scale, base.scale + 0.05, epsilon = 1e-4);
}

#[test]
fn test_save_and_load_adjustment() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = start(config(&dir), ScriptedSource::new(Vec::new()));

    session.handle_command(Command::MoveLeft).unwrap();
    session.handle_command(Command::RollLeft).unwrap();
    session.handle_command(Command::Save).unwrap();
    let saved = *session.adjustment();

    session.handle_command(Command::Reset).unwrap();
    assert!(session.adjustment().is_default());

    session.handle_command(Command::Load).unwrap();
    assert_eq!(*session.adjustment(), saved);

    // A fresh session picks the saved adjustment up at start
    let restarted = start(config(&dir), ScriptedSource::new(Vec::new()));
    assert_eq!(*restarted.adjustment(), saved);
    assert_ne!(saved, ManualAdjustment::default());
}

#[test]
fn test_reset_clears_tracking() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = start(config(&dir), ScriptedSource::new(Vec::new()));

    session.handle_command(Command::ScaleUp).unwrap();
    session.tick(0.0).unwrap();
    assert!(!session.sampler().is_empty());

    session.reset();
    assert!(session.sampler().is_empty());
    assert!(session.adjustment().is_default());
    assert_eq!(session.transform(), OverlayTransform::IDENTITY);
}
