//! Layered renderer
//!
//! Owns the backend, camera, scene and material state. Every mesh added to
//! the scene lands in exactly one bucket:
//!
//! ```text
//! add_object(root) ──► for each mesh in subtree
//!                        for each material ──► RenderCache (derive once)
//!                        any transparent?  ──► transparent bucket, order 1
//!                        otherwise          ──► opaque bucket, order 0
//!
//! render() ──► clear(color|depth|stencil) ──► draw(sorted by order)
//! ```
//!
//! Opaque geometry is always submitted before transparent geometry, so
//! blended fragments land on a finished opaque backdrop.

use std::time::Instant;

use facefit_core::IndexSet;
use glam::Mat4;

use crate::backend::{ClearFlags, DrawItem, DrawList, DrawMaterial, RenderBackend};
use crate::cache::{CacheLookup, RenderBucket, RenderCache};
use crate::camera::Camera;
use crate::error::{RenderError, Result};
use crate::material::{Material, MaterialHandle, MaterialLibrary};
use crate::scene::{NodeKey, SceneGraph};
use crate::stats::{FrameTimer, RenderStats};

/// Renderer that draws opaque meshes before transparent ones
pub struct LayeredRenderer<B: RenderBackend> {
    backend: B,
    camera: Camera,
    scene: SceneGraph,
    materials: MaterialLibrary,
    cache: RenderCache,
    objects: IndexSet<NodeKey>,
    opaque: IndexSet<NodeKey>,
    transparent: IndexSet<NodeKey>,
    timer: FrameTimer,
    disposed: bool,
}

impl<B: RenderBackend> LayeredRenderer<B> {
    pub fn new(backend: B, camera: Camera) -> Self {
        log::info!("Layered renderer created on '{}' backend", backend.name());
        Self {
            backend,
            camera,
            scene: SceneGraph::new(),
            materials: MaterialLibrary::new(),
            cache: RenderCache::new(),
            objects: IndexSet::new(),
            opaque: IndexSet::new(),
            transparent: IndexSet::new(),
            timer: FrameTimer::new(),
            disposed: false,
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed {
            Err(RenderError::Disposed)
        } else {
            Ok(())
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> Result<&mut Camera> {
        self.ensure_live()?;
        Ok(&mut self.camera)
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable scene access for building subtrees before `add_object`
    pub fn scene_mut(&mut self) -> Result<&mut SceneGraph> {
        self.ensure_live()?;
        Ok(&mut self.scene)
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> Result<&mut MaterialLibrary> {
        self.ensure_live()?;
        Ok(&mut self.materials)
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn register_material(&mut self, material: Material) -> Result<MaterialHandle> {
        self.ensure_live()?;
        Ok(self.materials.register(material))
    }

    /// Mesh nodes in the opaque bucket
    pub fn opaque_meshes(&self) -> &[NodeKey] {
        self.opaque.as_slice()
    }

    /// Mesh nodes in the transparent bucket
    pub fn transparent_meshes(&self) -> &[NodeKey] {
        self.transparent.as_slice()
    }

    pub fn bucket_of(&self, node: NodeKey) -> Option<RenderBucket> {
        if self.opaque.contains(node) {
            Some(RenderBucket::Opaque)
        } else if self.transparent.contains(node) {
            Some(RenderBucket::Transparent)
        } else {
            None
        }
    }

    /// Roots registered through [`add_object`](Self::add_object)
    pub fn objects(&self) -> &[NodeKey] {
        self.objects.as_slice()
    }

    /// Register `root` and every mesh below it
    ///
    /// Only the given subtree is walked. Unknown material handles fail the
    /// whole call before anything is classified.
    pub fn add_object(&mut self, root: NodeKey) -> Result<()> {
        self.ensure_live()?;
        if !self.scene.contains(root) {
            return Err(RenderError::UnknownNode(root));
        }

        let subtree = self.scene.subtree(root);

        for &key in &subtree {
            let Some(mesh) = self.scene.get(key).and_then(|n| n.mesh.as_ref()) else {
                continue;
            };
            if let Some(&missing) = mesh.materials.iter().find(|h| !self.materials.contains(**h)) {
                return Err(RenderError::UnknownMaterial(missing));
            }
        }

        let mut meshes = 0usize;
        for key in subtree {
            let Some(mesh) = self.scene.get_mut(key).and_then(|n| n.mesh.as_mut()) else {
                continue;
            };

            let mut bucket = RenderBucket::Opaque;
            for &handle in &mesh.materials {
                let Some(material) = self.materials.get_mut(handle) else {
                    continue;
                };
                let (settings, lookup) = self.cache.optimize(handle, material);
                if lookup == CacheLookup::Hit {
                    log::trace!("Render cache hit for '{}'", material.name);
                }
                if settings.bucket == RenderBucket::Transparent {
                    bucket = RenderBucket::Transparent;
                }
            }

            mesh.render_order = bucket.render_order();
            match bucket {
                RenderBucket::Opaque => {
                    self.transparent.remove(key);
                    self.opaque.insert(key);
                }
                RenderBucket::Transparent => {
                    self.opaque.remove(key);
                    self.transparent.insert(key);
                }
            }
            meshes += 1;
        }

        self.objects.insert(root);
        log::debug!(
            "Added object with {} meshes ({} opaque, {} transparent total)",
            meshes,
            self.opaque.len(),
            self.transparent.len()
        );
        Ok(())
    }

    /// Detach and free `root` with its subtree, purging its meshes from both
    /// buckets
    pub fn remove_object(&mut self, root: NodeKey) -> Result<()> {
        self.ensure_live()?;
        if !self.scene.contains(root) {
            return Err(RenderError::UnknownNode(root));
        }

        for (key, node) in self.scene.remove_subtree(root) {
            self.objects.remove(key);
            self.opaque.remove(key);
            self.transparent.remove(key);
            if node.mesh.is_some() {
                self.backend.release_mesh(key);
            }
        }

        log::debug!("Removed object {:?}", root);
        Ok(())
    }

    /// Set the local transform of a node
    pub fn set_transform(&mut self, node: NodeKey, transform: Mat4) -> Result<()> {
        self.ensure_live()?;
        let entry = self.scene.get_mut(node).ok_or(RenderError::UnknownNode(node))?;
        entry.transform = transform;
        Ok(())
    }

    pub fn set_visible(&mut self, node: NodeKey, visible: bool) -> Result<()> {
        self.ensure_live()?;
        let entry = self.scene.get_mut(node).ok_or(RenderError::UnknownNode(node))?;
        entry.visible = visible;
        Ok(())
    }

    fn build_draw_list(&self) -> DrawList {
        let mut list = DrawList::new();

        for key in self.opaque.iter().chain(self.transparent.iter()) {
            if !self.scene.is_visible(key) {
                continue;
            }
            let Some(node) = self.scene.get(key) else {
                continue;
            };
            let Some(mesh) = node.mesh.as_ref() else {
                continue;
            };

            let materials = mesh
                .materials
                .iter()
                .filter_map(|&handle| {
                    let material = self.materials.get(handle)?;
                    let settings = *self.cache.get(handle)?;
                    Some(DrawMaterial {
                        handle,
                        settings,
                        uniforms: material.to_gpu(),
                        blend: settings.blend_mode.blend_state(),
                    })
                })
                .collect();

            list.push(DrawItem {
                node: key,
                world: self.scene.world_transform(key).unwrap_or(Mat4::IDENTITY),
                triangles: mesh.triangles,
                render_order: mesh.render_order,
                materials,
            });
        }

        list.sort();
        list
    }

    /// Draw one frame
    pub fn render(&mut self) -> Result<()> {
        self.render_at(Instant::now())
    }

    /// Draw one frame, timing it against `now`
    pub fn render_at(&mut self, now: Instant) -> Result<()> {
        self.ensure_live()?;

        self.backend.clear(ClearFlags::ALL)?;
        let list = self.build_draw_list();
        self.backend.draw(&list, &self.camera)?;
        self.timer.tick(now);
        Ok(())
    }

    pub fn stats(&self) -> Result<RenderStats> {
        self.ensure_live()?;
        let info = self.backend.info();
        Ok(RenderStats {
            fps: self.timer.fps(),
            frame_time: self.timer.frame_time().as_secs_f64(),
            triangles: info.triangles,
            draw_calls: info.draw_calls,
            opaque_count: self.opaque.len(),
            transparent_count: self.transparent.len(),
        })
    }

    /// Resize the surface and match the camera aspect
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.ensure_live()?;
        self.backend.resize(width, height)?;
        self.camera.resize(width, height);
        Ok(())
    }

    /// Release every mesh, material and the surface
    ///
    /// Safe to call more than once; only the first call does anything.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        let meshes: Vec<NodeKey> = self
            .scene
            .iter()
            .filter(|(_, node)| node.mesh.is_some())
            .map(|(key, _)| key)
            .collect();
        for key in meshes {
            self.backend.release_mesh(key);
        }

        let materials: Vec<MaterialHandle> = self.materials.handles().collect();
        for handle in materials {
            self.backend.release_material(handle);
        }

        self.backend.dispose_surface();

        self.scene.clear();
        self.materials.clear();
        self.cache.clear();
        self.objects.clear();
        self.opaque.clear();
        self.transparent.clear();
        self.timer.reset();
        self.disposed = true;

        log::info!("Layered renderer disposed");
    }
}

impl<B: RenderBackend> Drop for LayeredRenderer<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
