//! Landmark sources
//!
//! The face detector is an external collaborator. Sessions only see the
//! [`LandmarkSource`] trait: zero or one landmark set per frame.

use facefit_pose::{index, FaceLandmarkSet, LandmarkPoint};

use crate::error::{Result, SessionError};

/// Per-frame face landmark provider
pub trait LandmarkSource {
    /// Start the detector; failure is fatal to session start-up
    fn initialize(&mut self) -> Result<()>;

    /// Landmarks for a frame, `None` when no face was found
    ///
    /// Errors are per-frame; the session logs them and keeps running.
    fn detect(&mut self, frame_index: u64) -> Result<Option<FaceLandmarkSet>>;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn initialize(&mut self) -> Result<()> {
        (**self).initialize()
    }

    fn detect(&mut self, frame_index: u64) -> Result<Option<FaceLandmarkSet>> {
        (**self).detect(frame_index)
    }
}

/// Procedural face that sways slowly in front of the camera
///
/// Positions are normalized image coordinates laid out around a centre
/// point; yaw is expressed as a temple depth difference.
#[derive(Clone, Debug)]
pub struct SyntheticFaceSource {
    /// Face centre (normalized)
    pub center: (f32, f32),
    /// Temple-to-temple width (normalized to frame width)
    pub face_width: f32,
    /// Peak temple depth difference
    pub yaw_depth: f32,
    /// Frames per full sway cycle
    pub period: u64,
    /// Report no face on every n-th frame
    pub dropout_every: Option<u64>,
    initialized: bool,
}

impl SyntheticFaceSource {
    pub fn new() -> Self {
        Self {
            center: (0.5, 0.45),
            face_width: 0.3,
            yaw_depth: 0.04,
            period: 120,
            dropout_every: None,
            initialized: false,
        }
    }

    pub fn with_dropout(mut self, every: u64) -> Self {
        self.dropout_every = Some(every.max(1));
        self
    }

    /// Landmarks for a given sway phase in [0, 1)
    pub fn face_at(&self, phase: f32) -> FaceLandmarkSet {
        let angle = phase * std::f32::consts::TAU;
        let sway = angle.sin();
        let (cx, cy) = (self.center.0 + sway * 0.02, self.center.1);
        let w = self.face_width;
        let yaw = sway * self.yaw_depth;

        let at = |dx: f32, dy: f32, z: f32| LandmarkPoint::new(cx + dx * w, cy + dy * w, z);

        FaceLandmarkSet::empty()
            .with(index::LEFT_TEMPLE, at(-0.5, 0.0, -yaw / 2.0))
            .with(index::RIGHT_TEMPLE, at(0.5, 0.0, yaw / 2.0))
            .with(index::LEFT_EYE_OUTER, at(-0.3, -0.02, 0.0))
            .with(index::LEFT_EYE_INNER, at(-0.1, -0.02, 0.0))
            .with(index::LEFT_EYE_INNER_MEASURE, at(-0.12, -0.02, 0.0))
            .with(index::RIGHT_EYE_INNER, at(0.1, -0.02, 0.0))
            .with(index::RIGHT_EYE_INNER_MEASURE, at(0.12, -0.02, 0.0))
            .with(index::RIGHT_EYE_OUTER, at(0.3, -0.02, 0.0))
            .with(index::NOSE_BRIDGE, at(0.0, 0.0, -0.02))
            .with(index::NOSE_TIP, at(0.0, 0.25, -0.05))
            .with(index::FOREHEAD, at(0.0, -0.45, -0.03))
            .with(index::CHIN, at(0.0, 0.65, -0.01))
    }
}

impl Default for SyntheticFaceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkSource for SyntheticFaceSource {
    fn initialize(&mut self) -> Result<()> {
        if self.face_width <= 0.0 || self.period == 0 {
            return Err(SessionError::DetectorInit(
                "synthetic face needs a positive width and period".into(),
            ));
        }
        self.initialized = true;
        log::info!("Synthetic landmark source ready");
        Ok(())
    }

    fn detect(&mut self, frame_index: u64) -> Result<Option<FaceLandmarkSet>> {
        if !self.initialized {
            return Err(SessionError::DetectorInit("source not initialized".into()));
        }
        if self.dropout_every.map_or(false, |n| frame_index % n == n - 1) {
            return Ok(None);
        }

        let phase = (frame_index % self.period) as f32 / self.period as f32;
        Ok(Some(self.face_at(phase)))
    }
}
