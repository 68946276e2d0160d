//! Manual adjustment offsets
//!
//! User nudges (keyboard, sliders, auto-adjust) accumulate here and are
//! added on top of the computed pose every frame. This is the only state
//! that is persisted between runs.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Flat record of manual offsets
///
/// Every field falls back to its default independently when missing from a
/// stored record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualAdjustment {
    /// Horizontal mount offset in pixels
    pub position_x: f32,
    /// Vertical mount offset in pixels
    pub position_y: f32,
    /// Depth offset in world units
    pub position_z: f32,
    /// Pitch offset in radians
    pub rotation_x: f32,
    /// Yaw offset in radians
    pub rotation_y: f32,
    /// Roll offset in radians
    pub rotation_z: f32,
    /// Scale offset added to the computed scale before clamping
    pub scale: f32,
}

impl Default for ManualAdjustment {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            position_z: 0.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            scale: 0.0,
        }
    }
}

impl ManualAdjustment {
    pub fn position_offset(&self) -> Vec3 {
        Vec3::new(self.position_x, self.position_y, self.position_z)
    }

    /// Rotation offset as (pitch, yaw, roll) in x/y/z
    pub fn rotation_offset(&self) -> Vec3 {
        Vec3::new(self.rotation_x, self.rotation_y, self.rotation_z)
    }

    pub fn nudge_position(&mut self, delta: Vec3) {
        self.position_x += delta.x;
        self.position_y += delta.y;
        self.position_z += delta.z;
    }

    pub fn nudge_rotation(&mut self, delta: Vec3) {
        self.rotation_x += delta.x;
        self.rotation_y += delta.y;
        self.rotation_z += delta.z;
    }

    pub fn nudge_scale(&mut self, delta: f32) {
        self.set_scale(self.scale + delta);
    }

    /// Non-finite offsets reset to zero
    pub fn set_scale(&mut self, offset: f32) {
        self.scale = if offset.is_finite() { offset } else { 0.0 };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nudges_accumulate() {
        let mut adj = ManualAdjustment::default();
        adj.nudge_position(Vec3::new(1.0, -2.0, 0.0));
        adj.nudge_position(Vec3::new(1.0, 0.0, 0.5));
        adj.nudge_rotation(Vec3::new(0.0, 0.1, 0.0));

        assert_eq!(adj.position_offset(), Vec3::new(2.0, -2.0, 0.5));
        assert_eq!(adj.rotation_y, 0.1);
        assert!(!adj.is_default());

        adj.reset();
        assert!(adj.is_default());
    }

    #[test]
    fn test_scale_offset_accumulates() {
        let mut adj = ManualAdjustment::default();
        adj.nudge_scale(0.25);
        adj.nudge_scale(0.25);
        adj.nudge_scale(-0.75);
        assert_eq!(adj.scale, -0.25);

        adj.set_scale(f32::INFINITY);
        assert_eq!(adj.scale, 0.0);
    }

    #[test]
    fn test_missing_fields_default_individually() {
        let adj: ManualAdjustment =
            serde_json::from_str(r#"{ "position_x": 3.0, "scale": 0.2 }"#).unwrap();
        assert_eq!(adj.position_x, 3.0);
        assert_eq!(adj.scale, 0.2);
        assert_eq!(adj.position_y, 0.0);
        assert_eq!(adj.rotation_z, 0.0);
    }
}
