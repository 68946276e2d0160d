//! Scene graph arena
//!
//! Nodes live in a generational [`Arena`] and point at each other by
//! [`NodeKey`]. A node may carry a [`Mesh`]; transforms are local and
//! composed with the parent chain on demand.

use facefit_core::{Arena, Key};
use glam::Mat4;

use crate::cache::OPAQUE_RENDER_ORDER;
use crate::material::MaterialHandle;

/// Key of a scene node
pub type NodeKey = Key<Node>;

/// Geometry reference drawn with one or more materials
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub triangles: u32,
    /// One entry per geometry group
    pub materials: Vec<MaterialHandle>,
    /// Draw priority, lower first
    pub render_order: i32,
}

impl Mesh {
    pub fn new(triangles: u32, materials: Vec<MaterialHandle>) -> Self {
        Self {
            triangles,
            materials,
            render_order: OPAQUE_RENDER_ORDER,
        }
    }

    /// Single-material mesh
    pub fn with_material(triangles: u32, material: MaterialHandle) -> Self {
        Self::new(triangles, vec![material])
    }
}

/// One scene node
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub transform: Mat4,
    pub visible: bool,
    pub mesh: Option<Mesh>,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            visible: true,
            mesh: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

/// Arena of scene nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Arena<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached node
    pub fn spawn(&mut self, node: Node) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Insert a node as the last child of `parent`
    ///
    /// Returns `None` if `parent` is not in the graph.
    pub fn spawn_child(&mut self, parent: NodeKey, mut node: Node) -> Option<NodeKey> {
        if !self.nodes.contains(parent) {
            return None;
        }
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        self.nodes.get_mut(parent)?.children.push(key);
        Some(key)
    }

    /// Reparent `child` under `parent`, detaching it from any previous parent
    ///
    /// Refuses unknown keys and moves that would create a cycle.
    pub fn attach(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.ancestors(parent).any(|a| a == child) {
            return false;
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Unlink `child` from its parent, keeping its subtree intact
    pub fn detach(&mut self, child: NodeKey) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&c| c != child);
        }
    }

    /// `root` followed by all of its descendants, depth first
    pub fn subtree(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            out.push(key);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Detach and free `root` and everything below it
    ///
    /// Returns the removed keys paired with their nodes.
    pub fn remove_subtree(&mut self, root: NodeKey) -> Vec<(NodeKey, Node)> {
        self.detach(root);
        self.subtree(root)
            .into_iter()
            .filter_map(|key| self.nodes.remove(key).map(|node| (key, node)))
            .collect()
    }

    /// Parent chain of `key`, nearest first
    pub fn ancestors(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        let mut current = self.nodes.get(key).and_then(|n| n.parent);
        std::iter::from_fn(move || {
            let key = current?;
            current = self.nodes.get(key).and_then(|n| n.parent);
            Some(key)
        })
    }

    /// Local transform composed with every ancestor
    pub fn world_transform(&self, key: NodeKey) -> Option<Mat4> {
        let mut matrix = self.nodes.get(key)?.transform;
        for ancestor in self.ancestors(key) {
            if let Some(node) = self.nodes.get(ancestor) {
                matrix = node.transform * matrix;
            }
        }
        Some(matrix)
    }

    /// Visible if the node and all of its ancestors are
    pub fn is_visible(&self, key: NodeKey) -> bool {
        let Some(node) = self.nodes.get(key) else {
            return false;
        };
        node.visible
            && self
                .ancestors(key)
                .all(|a| self.nodes.get(a).map_or(false, |n| n.visible))
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
