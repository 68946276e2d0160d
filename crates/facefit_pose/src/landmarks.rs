//! Face landmark snapshots
//!
//! A [`FaceLandmarkSet`] is one detector result for one frame. Slots are
//! addressed by the face-mesh topology index; any slot may be missing when
//! the detector could not resolve it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of points in the face-mesh topology (468 mesh + 10 iris)
pub const FACE_MESH_LANDMARKS: usize = 478;

/// Anatomical landmark indices (image-left / image-right, not subject-left)
pub mod index {
    pub const NOSE_TIP: usize = 4;
    pub const FOREHEAD: usize = 10;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER_MEASURE: usize = 130;
    pub const LEFT_EYE_INNER: usize = 133;
    pub const CHIN: usize = 152;
    pub const NOSE_BRIDGE: usize = 168;
    pub const LEFT_TEMPLE: usize = 234;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_INNER_MEASURE: usize = 359;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_TEMPLE: usize = 454;
}

/// One landmark in normalized image coordinates
///
/// `x`/`y` are fractions of frame width/height. `z` is relative depth,
/// smaller values are closer to the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Position in pixels for a frame of the given size
    #[inline]
    pub fn to_pixels(&self, frame: FrameSize) -> Vec2 {
        Vec2::new(self.x * frame.width, self.y * frame.height)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Video frame dimensions in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

impl FrameSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::new(640.0, 480.0)
    }
}

/// Landmarks for a single detected face
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarkSet {
    points: Vec<Option<LandmarkPoint>>,
}

impl FaceLandmarkSet {
    /// Empty set with every slot missing
    pub fn empty() -> Self {
        Self {
            points: vec![None; FACE_MESH_LANDMARKS],
        }
    }

    /// Build from a dense detector output. Short outputs leave the tail
    /// missing; extra points are ignored.
    pub fn from_points(points: impl IntoIterator<Item = LandmarkPoint>) -> Self {
        let mut set = Self::empty();
        for (i, point) in points.into_iter().take(FACE_MESH_LANDMARKS).enumerate() {
            set.set(i, point);
        }
        set
    }

    /// Store a point. Out-of-range indices and non-finite points are dropped.
    pub fn set(&mut self, index: usize, point: LandmarkPoint) {
        if let Some(slot) = self.points.get_mut(index) {
            *slot = point.is_finite().then_some(point);
        }
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, index: usize, point: LandmarkPoint) -> Self {
        self.set(index, point);
        self
    }

    pub fn clear(&mut self, index: usize) {
        if let Some(slot) = self.points.get_mut(index) {
            *slot = None;
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied().flatten()
    }

    /// Pixel-space position of a landmark
    #[inline]
    pub fn pixel(&self, index: usize, frame: FrameSize) -> Option<Vec2> {
        self.get(index).map(|p| p.to_pixels(frame))
    }

    /// Number of resolved landmarks among `indices`
    pub fn count_present(&self, indices: &[usize]) -> usize {
        indices.iter().filter(|&&i| self.get(i).is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }
}

impl Default for FaceLandmarkSet {
    fn default() -> Self {
        Self::empty()
    }
}
