//! Pixel to world conversion
//!
//! The overlay is placed on a plane a fixed distance in front of the camera.
//! A pixel is mapped to NDC, unprojected into a view-space ray through the
//! inverse projection, and the ray is cut at that plane before moving to
//! world space with the camera's world matrix.

use glam::{Mat4, Vec2, Vec3};

use crate::landmarks::FrameSize;

/// Convert a pixel position to normalized device coordinates
///
/// `x` maps [0, width] to [-1, 1]; `y` is flipped so image-down is NDC-down.
#[inline]
pub fn pixel_to_ndc(pixel: Vec2, frame: FrameSize) -> Vec2 {
    Vec2::new(
        (pixel.x / frame.width) * 2.0 - 1.0,
        -(pixel.y / frame.height) * 2.0 + 1.0,
    )
}

/// Camera matrices needed to unproject a screen point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewProjection {
    pub inverse_projection: Mat4,
    pub camera_world: Mat4,
}

impl ViewProjection {
    pub fn new(inverse_projection: Mat4, camera_world: Mat4) -> Self {
        Self {
            inverse_projection,
            camera_world,
        }
    }

    /// Build from a projection matrix and a camera world matrix
    pub fn from_projection(projection: Mat4, camera_world: Mat4) -> Self {
        Self::new(projection.inverse(), camera_world)
    }

    /// Right-handed perspective camera at the origin looking down -Z
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::from_projection(
            Mat4::perspective_rh(fov_y, aspect, near, far),
            Mat4::IDENTITY,
        )
    }

    /// World-space point on the NDC ray, `depth` units along the view axis
    ///
    /// Returns `None` when the ray does not point in front of the camera.
    pub fn unproject_at_depth(&self, ndc: Vec2, depth: f32) -> Option<Vec3> {
        let on_ray = self
            .inverse_projection
            .project_point3(Vec3::new(ndc.x, ndc.y, 0.5));

        if !on_ray.is_finite() || on_ray.z >= 0.0 {
            return None;
        }

        let view_point = on_ray * (depth / -on_ray.z);
        Some(self.camera_world.transform_point3(view_point))
    }
}
