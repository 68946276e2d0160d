//! Materials and the material library
//!
//! Materials are registered once into a [`MaterialLibrary`] and referenced by
//! [`MaterialHandle`] from then on. Meshes sharing a handle share the
//! material, and the render cache keys on the handle.

use facefit_core::{Arena, Key};
use serde::{Deserialize, Serialize};

use crate::blend::BlendMode;

/// Which faces are rasterized
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CullMode {
    /// Front faces only, back faces culled
    #[default]
    FrontOnly,
    /// Both faces
    DoubleSided,
}

/// Surface description for one mesh group
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Linear RGBA
    pub color: [f32; 4],
    pub transparent: bool,
    /// Opacity in [0, 1]
    pub opacity: f32,
    pub depth_write: bool,
    pub depth_test: bool,
    pub cull_mode: CullMode,
    /// Fragments with alpha at or below this are discarded, 0 = off
    pub alpha_discard_threshold: f32,
    pub alpha_to_coverage: bool,
    pub blend_mode: BlendMode,
}

impl Material {
    /// Fully opaque material with renderer defaults
    pub fn new(name: impl Into<String>, color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            color,
            transparent: false,
            opacity: 1.0,
            depth_write: true,
            depth_test: true,
            cull_mode: CullMode::FrontOnly,
            alpha_discard_threshold: 0.0,
            alpha_to_coverage: false,
            blend_mode: BlendMode::Opaque,
        }
    }

    /// Transparent material with the given opacity
    pub fn transparent(name: impl Into<String>, color: [f32; 4], opacity: f32) -> Self {
        Self {
            transparent: true,
            opacity: opacity.clamp(0.0, 1.0),
            ..Self::new(name, color)
        }
    }

    /// Whether this material belongs in the transparent bucket
    pub fn is_transparent(&self) -> bool {
        self.transparent || self.opacity < 1.0
    }

    /// Pack into the GPU layout
    pub fn to_gpu(&self) -> GpuMaterial {
        let mut flags = 0;
        if self.is_transparent() {
            flags |= GpuMaterial::FLAG_TRANSPARENT;
        }
        if self.cull_mode == CullMode::DoubleSided {
            flags |= GpuMaterial::FLAG_DOUBLE_SIDED;
        }
        if self.alpha_to_coverage {
            flags |= GpuMaterial::FLAG_ALPHA_TO_COVERAGE;
        }

        GpuMaterial {
            color: self.color,
            opacity: self.opacity,
            alpha_discard: self.alpha_discard_threshold,
            flags,
            _pad: 0,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [1.0, 1.0, 1.0, 1.0])
    }
}

/// Material uniform block, 16-byte aligned for direct upload
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuMaterial {
    /// Base color (RGBA)
    pub color: [f32; 4],
    pub opacity: f32,
    pub alpha_discard: f32,
    /// Packed feature flags
    pub flags: u32,
    pub _pad: u32,
}

impl GpuMaterial {
    pub const FLAG_TRANSPARENT: u32 = 1 << 0;
    pub const FLAG_DOUBLE_SIDED: u32 = 1 << 1;
    pub const FLAG_ALPHA_TO_COVERAGE: u32 = 1 << 2;

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Stable reference to a registered material
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialHandle(Key<Material>);

impl MaterialHandle {
    pub fn key(&self) -> Key<Material> {
        self.0
    }
}

/// Owner of every registered material
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    materials: Arena<Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, material: Material) -> MaterialHandle {
        log::trace!("Registering material '{}'", material.name);
        MaterialHandle(self.materials.insert(material))
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle.0)
    }

    pub fn contains(&self, handle: MaterialHandle) -> bool {
        self.materials.contains(handle.0)
    }

    pub fn handles(&self) -> impl Iterator<Item = MaterialHandle> + '_ {
        self.materials.iter().map(|(key, _)| MaterialHandle(key))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn clear(&mut self) {
        self.materials.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_opacity_is_transparent() {
        let mut material = Material::new("lens", [0.2, 0.2, 0.2, 1.0]);
        assert!(!material.is_transparent());

        material.opacity = 0.99;
        assert!(material.is_transparent());

        let flagged = Material::transparent("glass", [1.0; 4], 1.0);
        assert!(flagged.is_transparent());
    }

    #[test]
    fn test_gpu_layout() {
        assert_eq!(std::mem::size_of::<GpuMaterial>(), 32);

        let mut material = Material::transparent("lens", [0.1, 0.2, 0.3, 1.0], 0.3);
        material.cull_mode = CullMode::DoubleSided;
        let gpu = material.to_gpu();

        assert!(gpu.has_flag(GpuMaterial::FLAG_TRANSPARENT));
        assert!(gpu.has_flag(GpuMaterial::FLAG_DOUBLE_SIDED));
        assert!(!gpu.has_flag(GpuMaterial::FLAG_ALPHA_TO_COVERAGE));
        assert_eq!(bytemuck::bytes_of(&gpu).len(), 32);
    }

    #[test]
    fn test_handles_are_distinct_for_equal_materials() {
        let mut library = MaterialLibrary::new();
        let a = library.register(Material::default());
        let b = library.register(Material::default());

        assert_ne!(a, b);
        assert_eq!(library.get(a), library.get(b));
        assert_eq!(library.len(), 2);
    }
}
