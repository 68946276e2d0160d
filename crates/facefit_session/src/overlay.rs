//! Glasses overlay model
//!
//! An [`OverlayModel`] is the imported asset: a hierarchy of named parts,
//! each naming its material. Material names decide the initial transparency
//! intent before the renderer classifies anything.

use std::collections::HashMap;

use facefit_render::{LayeredRenderer, Material, MaterialHandle, Mesh, Node, NodeKey, RenderBackend, RenderError};

use crate::error::Result;

/// Opacity given to tinted lens materials
pub const LENS_OPACITY: f32 = 0.3;

const FRAME_COLOR: [f32; 4] = [0.08, 0.08, 0.09, 1.0];
const LENS_COLOR: [f32; 4] = [0.55, 0.65, 0.75, 1.0];
const DEFAULT_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// Material chosen from an asset material name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialIntent {
    /// Frames and stems
    OpaqueDark,
    /// Lenses
    TransparentTinted,
    DefaultOpaque,
}

impl MaterialIntent {
    pub fn material(&self, name: &str) -> Material {
        match self {
            MaterialIntent::OpaqueDark => Material::new(name, FRAME_COLOR),
            MaterialIntent::TransparentTinted => Material::transparent(name, LENS_COLOR, LENS_OPACITY),
            MaterialIntent::DefaultOpaque => Material::new(name, DEFAULT_COLOR),
        }
    }
}

/// Case-insensitive substring match on the material name
pub fn material_intent(name: &str) -> MaterialIntent {
    let name = name.to_lowercase();
    if name.contains("frame") || name.contains("stem") {
        MaterialIntent::OpaqueDark
    } else if name.contains("lens") || name.contains("glass") {
        MaterialIntent::TransparentTinted
    } else {
        MaterialIntent::DefaultOpaque
    }
}

/// One part of the overlay asset
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayPart {
    pub name: String,
    /// `None` for pure grouping nodes
    pub material_name: Option<String>,
    pub triangles: u32,
    pub children: Vec<OverlayPart>,
}

impl OverlayPart {
    pub fn group(name: impl Into<String>, children: Vec<OverlayPart>) -> Self {
        Self {
            name: name.into(),
            material_name: None,
            triangles: 0,
            children,
        }
    }

    pub fn mesh(name: impl Into<String>, material_name: impl Into<String>, triangles: u32) -> Self {
        Self {
            name: name.into(),
            material_name: Some(material_name.into()),
            triangles,
            children: Vec::new(),
        }
    }
}

/// Hierarchical overlay asset
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayModel {
    pub root: OverlayPart,
}

impl OverlayModel {
    pub fn new(root: OverlayPart) -> Self {
        Self { root }
    }

    /// Generic glasses: front frame, two lenses sharing one material, two stems
    pub fn glasses() -> Self {
        Self::new(OverlayPart::group(
            "glasses",
            vec![
                OverlayPart::mesh("front", "Frame_Black", 2400),
                OverlayPart::mesh("lens_left", "Lens_Tint", 320),
                OverlayPart::mesh("lens_right", "Lens_Tint", 320),
                OverlayPart::mesh("stem_left", "Stem", 600),
                OverlayPart::mesh("stem_right", "Stem", 600),
            ],
        ))
    }

    /// Build the node tree in `renderer` and register it
    ///
    /// Parts naming the same material share one handle.
    pub fn install<B: RenderBackend>(&self, renderer: &mut LayeredRenderer<B>) -> Result<NodeKey> {
        let mut handles = HashMap::new();
        let root = self.spawn_part(renderer, &self.root, None, &mut handles)?;
        renderer.add_object(root)?;
        log::info!(
            "Installed overlay '{}' with {} materials",
            self.root.name,
            handles.len()
        );
        Ok(root)
    }

    fn spawn_part<B: RenderBackend>(
        &self,
        renderer: &mut LayeredRenderer<B>,
        part: &OverlayPart,
        parent: Option<NodeKey>,
        handles: &mut HashMap<String, MaterialHandle>,
    ) -> Result<NodeKey> {
        let mut node = Node::new(part.name.clone());

        if let Some(material_name) = &part.material_name {
            let handle = match handles.get(material_name) {
                Some(&handle) => handle,
                None => {
                    let intent = material_intent(material_name);
                    log::debug!("Material '{}' -> {:?}", material_name, intent);
                    let handle = renderer.register_material(intent.material(material_name))?;
                    handles.insert(material_name.clone(), handle);
                    handle
                }
            };
            node = node.with_mesh(Mesh::with_material(part.triangles, handle));
        }

        let scene = renderer.scene_mut()?;
        let key = match parent {
            Some(parent) => scene
                .spawn_child(parent, node)
                .ok_or(RenderError::UnknownNode(parent))?,
            None => scene.spawn(node),
        };

        for child in &part.children {
            self.spawn_part(renderer, child, Some(key), handles)?;
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facefit_render::{Camera, HeadlessBackend, RenderBucket};

    #[test]
    fn test_material_intent() {
        assert_eq!(material_intent("Frame_Black"), MaterialIntent::OpaqueDark);
        assert_eq!(material_intent("LEFT_STEM"), MaterialIntent::OpaqueDark);
        assert_eq!(material_intent("lens.001"), MaterialIntent::TransparentTinted);
        assert_eq!(material_intent("SunGlass"), MaterialIntent::TransparentTinted);
        assert_eq!(material_intent("hinge"), MaterialIntent::DefaultOpaque);
    }

    #[test]
    fn test_install_glasses() {
        let mut renderer = LayeredRenderer::new(HeadlessBackend::default(), Camera::default());
        let root = OverlayModel::glasses().install(&mut renderer).unwrap();

        assert_eq!(renderer.objects(), &[root]);
        assert_eq!(renderer.opaque_meshes().len(), 3);
        assert_eq!(renderer.transparent_meshes().len(), 2);
        // Frame, lens and stem materials; lenses share one
        assert_eq!(renderer.materials().len(), 3);
        assert_eq!(renderer.cache().hits(), 2);

        for &lens in renderer.transparent_meshes() {
            let node = renderer.scene().get(lens).unwrap();
            assert!(node.name.starts_with("lens"));
            assert_eq!(renderer.bucket_of(lens), Some(RenderBucket::Transparent));
        }
    }
}
