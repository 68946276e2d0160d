//! Render backend abstraction
//!
//! [`LayeredRenderer`](crate::LayeredRenderer) builds a sorted [`DrawList`]
//! and hands it to a [`RenderBackend`]. Backends own the surface and the GPU
//! copies of meshes and materials.
//!
//! [`HeadlessBackend`] records everything it is asked to do. It backs the
//! tests and the offscreen demo.

use glam::Mat4;

use crate::blend::BlendState;
use crate::cache::OptimizedSettings;
use crate::camera::Camera;
use crate::error::{RenderError, Result};
use crate::material::{GpuMaterial, MaterialHandle};
use crate::scene::NodeKey;

/// Buffers to clear at the start of a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearFlags {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl ClearFlags {
    pub const ALL: Self = Self {
        color: true,
        depth: true,
        stencil: true,
    };
}

/// One material group of a draw
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawMaterial {
    pub handle: MaterialHandle,
    pub settings: OptimizedSettings,
    pub uniforms: GpuMaterial,
    /// Blend equation for this group, `None` draws with blending off
    pub blend: Option<BlendState>,
}

impl DrawMaterial {
    /// Fragment color with material opacity folded into alpha
    pub fn fragment(&self) -> [f32; 4] {
        let [r, g, b, a] = self.uniforms.color;
        [r, g, b, a * self.uniforms.opacity]
    }
}

/// One mesh ready for submission
#[derive(Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub node: NodeKey,
    pub world: Mat4,
    pub triangles: u32,
    pub render_order: i32,
    pub materials: Vec<DrawMaterial>,
}

impl DrawItem {
    /// Draw calls this item costs: one per material group, at least one
    pub fn draw_calls(&self) -> u32 {
        self.materials.len().max(1) as u32
    }
}

/// Draw items in submission order
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    pub items: Vec<DrawItem>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DrawItem) {
        self.items.push(item);
    }

    /// Stable sort by render order
    pub fn sort(&mut self) {
        self.items.sort_by_key(|item| item.render_order);
    }

    pub fn total_triangles(&self) -> u64 {
        self.items.iter().map(|i| i.triangles as u64).sum()
    }

    pub fn total_draw_calls(&self) -> u32 {
        self.items.iter().map(DrawItem::draw_calls).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Counters reported by the backend for the last frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackendInfo {
    pub triangles: u64,
    pub draw_calls: u32,
}

/// Graphics backend driven by the layered renderer
pub trait RenderBackend {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Clear the selected buffers of the surface
    fn clear(&mut self, flags: ClearFlags) -> Result<()>;

    /// Draw the scene through `camera`
    fn draw(&mut self, list: &DrawList, camera: &Camera) -> Result<()>;

    /// Counters for the last submitted frame
    fn info(&self) -> BackendInfo;

    /// Free GPU geometry of a mesh node
    fn release_mesh(&mut self, node: NodeKey);

    /// Free GPU state of a material
    fn release_material(&mut self, material: MaterialHandle);

    /// Destroy the render surface
    fn dispose_surface(&mut self);

    /// Resize the render surface
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
}

/// Backend that records calls instead of rasterizing
///
/// A single sample pixel stands in for the framebuffer: every material
/// group of every draw covers it, so its final value shows how the
/// opaque and transparent passes composite.
#[derive(Debug)]
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    info: BackendInfo,
    clears: Vec<ClearFlags>,
    frames: Vec<Vec<NodeKey>>,
    last_frame: DrawList,
    released_meshes: Vec<NodeKey>,
    released_materials: Vec<MaterialHandle>,
    surface_disposed: bool,
    fail_next_draw: Option<String>,
    clear_color: [f32; 4],
    pixel: [f32; 4],
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            info: BackendInfo::default(),
            clears: Vec::new(),
            frames: Vec::new(),
            last_frame: DrawList::new(),
            released_meshes: Vec::new(),
            released_materials: Vec::new(),
            surface_disposed: false,
            fail_next_draw: None,
            clear_color: [0.0; 4],
            pixel: [0.0; 4],
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn clears(&self) -> &[ClearFlags] {
        &self.clears
    }

    /// Submission order of every frame drawn so far
    pub fn frames(&self) -> &[Vec<NodeKey>] {
        &self.frames
    }

    pub fn last_frame(&self) -> &DrawList {
        &self.last_frame
    }

    pub fn released_meshes(&self) -> &[NodeKey] {
        &self.released_meshes
    }

    pub fn released_materials(&self) -> &[MaterialHandle] {
        &self.released_materials
    }

    pub fn is_surface_disposed(&self) -> bool {
        self.surface_disposed
    }

    /// Color written by a color clear, transparent black by default
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Sample pixel after the last frame
    pub fn pixel(&self) -> [f32; 4] {
        self.pixel
    }

    /// Make the next draw fail with `message`
    pub fn fail_next_draw(&mut self, message: impl Into<String>) {
        self.fail_next_draw = Some(message.into());
    }

    fn check_surface(&self) -> Result<()> {
        if self.surface_disposed {
            return Err(RenderError::Backend("surface disposed".into()));
        }
        Ok(())
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn clear(&mut self, flags: ClearFlags) -> Result<()> {
        self.check_surface()?;
        if flags.color {
            self.pixel = self.clear_color;
        }
        self.clears.push(flags);
        Ok(())
    }

    fn draw(&mut self, list: &DrawList, _camera: &Camera) -> Result<()> {
        self.check_surface()?;
        if let Some(message) = self.fail_next_draw.take() {
            return Err(RenderError::Backend(message));
        }

        for material in list.items.iter().flat_map(|item| &item.materials) {
            let fragment = material.fragment();
            if fragment[3] < material.uniforms.alpha_discard {
                continue;
            }
            self.pixel = match material.blend {
                Some(state) => state.composite(fragment, self.pixel),
                None => fragment,
            };
        }

        self.info = BackendInfo {
            triangles: list.total_triangles(),
            draw_calls: list.total_draw_calls(),
        };
        self.frames.push(list.items.iter().map(|i| i.node).collect());
        self.last_frame = list.clone();
        Ok(())
    }

    fn info(&self) -> BackendInfo {
        self.info
    }

    fn release_mesh(&mut self, node: NodeKey) {
        self.released_meshes.push(node);
    }

    fn release_material(&mut self, material: MaterialHandle) {
        self.released_materials.push(material);
    }

    fn dispose_surface(&mut self) {
        self.surface_disposed = true;
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.check_surface()?;
        if width == 0 || height == 0 {
            return Err(RenderError::Backend(format!("invalid surface size {}x{}", width, height)));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }
}
