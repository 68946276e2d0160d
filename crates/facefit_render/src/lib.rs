//! # facefit_render - Layered Opaque/Transparent Renderer
//!
//! Draws a small scene of rigid meshes so that transparent surfaces (lenses)
//! composite correctly over opaque ones (frames) and over a transparent
//! surface.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               LayeredRenderer<B>              │
//! │  ┌────────────┐ ┌───────────────┐ ┌────────┐ │
//! │  │ SceneGraph │ │MaterialLibrary│ │ Camera │ │
//! │  └────────────┘ └───────────────┘ └────────┘ │
//! │  ┌────────────┐ ┌───────────────────────────┐│
//! │  │RenderCache │ │ opaque / transparent sets ││
//! │  └────────────┘ └───────────────────────────┘│
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//!                 RenderBackend (B)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use facefit_render::prelude::*;
//!
//! let mut renderer = LayeredRenderer::new(HeadlessBackend::default(), Camera::default());
//! let frame = renderer.register_material(Material::new("frame", [0.1, 0.1, 0.1, 1.0]))?;
//! let lens = renderer.register_material(Material::transparent("lens", [0.6, 0.7, 0.8, 1.0], 0.3))?;
//!
//! let scene = renderer.scene_mut()?;
//! let root = scene.spawn(Node::new("glasses"));
//! scene.spawn_child(root, Node::new("frame").with_mesh(Mesh::with_material(1200, frame)));
//! scene.spawn_child(root, Node::new("lens").with_mesh(Mesh::with_material(200, lens)));
//!
//! renderer.add_object(root)?;
//! renderer.render()?;
//! ```

pub mod backend;
pub mod blend;
pub mod cache;
pub mod camera;
pub mod error;
pub mod material;
pub mod renderer;
pub mod scene;
pub mod stats;

pub use backend::{BackendInfo, ClearFlags, DrawItem, DrawList, DrawMaterial, HeadlessBackend, RenderBackend};
pub use blend::{BlendFactor, BlendMode, BlendState};
pub use cache::{
    CacheLookup, OptimizedSettings, RenderBucket, RenderCache, OPAQUE_RENDER_ORDER, TRANSPARENT_ALPHA_DISCARD,
    TRANSPARENT_RENDER_ORDER,
};
pub use camera::Camera;
pub use error::{RenderError, Result};
pub use material::{CullMode, GpuMaterial, Material, MaterialHandle, MaterialLibrary};
pub use renderer::LayeredRenderer;
pub use scene::{Mesh, Node, NodeKey, SceneGraph};
pub use stats::{FrameTimer, RenderStats};

pub mod prelude {
    //! Common imports for rendering
    pub use crate::backend::{HeadlessBackend, RenderBackend};
    pub use crate::blend::BlendMode;
    pub use crate::cache::{RenderBucket, TRANSPARENT_RENDER_ORDER};
    pub use crate::camera::Camera;
    pub use crate::error::{RenderError, Result};
    pub use crate::material::{CullMode, Material, MaterialHandle};
    pub use crate::renderer::LayeredRenderer;
    pub use crate::scene::{Mesh, Node, NodeKey};
    pub use crate::stats::RenderStats;
}
