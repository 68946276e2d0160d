//! Per-material render settings cache
//!
//! The first time a material is seen its bucket and pipeline settings are
//! derived and written onto it. Later lookups return the stored settings and
//! leave the material alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::blend::BlendMode;
use crate::material::{CullMode, Material, MaterialHandle};

/// Alpha discard threshold for transparent materials
pub const TRANSPARENT_ALPHA_DISCARD: f32 = 0.01;

/// Render order of meshes in the opaque bucket
pub const OPAQUE_RENDER_ORDER: i32 = 0;

/// Render order of meshes in the transparent bucket
pub const TRANSPARENT_RENDER_ORDER: i32 = 1;

/// Draw bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderBucket {
    Opaque,
    Transparent,
}

impl RenderBucket {
    pub fn render_order(&self) -> i32 {
        match self {
            RenderBucket::Opaque => OPAQUE_RENDER_ORDER,
            RenderBucket::Transparent => TRANSPARENT_RENDER_ORDER,
        }
    }
}

/// Pipeline settings derived for a material
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizedSettings {
    pub bucket: RenderBucket,
    pub depth_write: bool,
    pub depth_test: bool,
    pub cull_mode: CullMode,
    pub alpha_discard_threshold: f32,
    pub alpha_to_coverage: bool,
    pub blend_mode: BlendMode,
}

impl OptimizedSettings {
    pub fn opaque() -> Self {
        Self {
            bucket: RenderBucket::Opaque,
            depth_write: true,
            depth_test: true,
            cull_mode: CullMode::FrontOnly,
            alpha_discard_threshold: 0.0,
            alpha_to_coverage: false,
            blend_mode: BlendMode::Opaque,
        }
    }

    /// Transparent fragments test depth but never write it
    pub fn transparent() -> Self {
        Self {
            bucket: RenderBucket::Transparent,
            depth_write: false,
            depth_test: true,
            cull_mode: CullMode::DoubleSided,
            alpha_discard_threshold: TRANSPARENT_ALPHA_DISCARD,
            alpha_to_coverage: true,
            blend_mode: BlendMode::Normal,
        }
    }

    pub fn derive(material: &Material) -> Self {
        if material.is_transparent() {
            Self::transparent()
        } else {
            Self::opaque()
        }
    }

    pub fn apply_to(&self, material: &mut Material) {
        material.depth_write = self.depth_write;
        material.depth_test = self.depth_test;
        material.cull_mode = self.cull_mode;
        material.alpha_discard_threshold = self.alpha_discard_threshold;
        material.alpha_to_coverage = self.alpha_to_coverage;
        material.blend_mode = self.blend_mode;
    }
}

/// Whether a lookup derived new settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
}

/// Handle-keyed settings cache
#[derive(Debug, Default)]
pub struct RenderCache {
    settings: HashMap<MaterialHandle, OptimizedSettings>,
    hits: u64,
    misses: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for `handle`, deriving and applying them on first sight
    pub fn optimize(&mut self, handle: MaterialHandle, material: &mut Material) -> (OptimizedSettings, CacheLookup) {
        if let Some(settings) = self.settings.get(&handle) {
            self.hits += 1;
            return (*settings, CacheLookup::Hit);
        }

        let settings = OptimizedSettings::derive(material);
        settings.apply_to(material);
        self.settings.insert(handle, settings);
        self.misses += 1;

        log::debug!("Material '{}' classified as {:?}", material.name, settings.bucket);
        (settings, CacheLookup::Miss)
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&OptimizedSettings> {
        self.settings.get(&handle)
    }

    pub fn contains(&self, handle: MaterialHandle) -> bool {
        self.settings.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.settings.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
