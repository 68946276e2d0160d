//! Error types for the layered renderer

use thiserror::Error;

use crate::material::MaterialHandle;
use crate::scene::NodeKey;

/// Renderer errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer was disposed and cannot be used again
    #[error("Renderer has been disposed")]
    Disposed,

    /// Node is not in the scene graph
    #[error("Scene node not found: {0:?}")]
    UnknownNode(NodeKey),

    /// Mesh references a material that was never registered
    #[error("Material not registered: {0:?}")]
    UnknownMaterial(MaterialHandle),

    /// Backend rejected a clear, draw or resize
    #[error("Render backend failure: {0}")]
    Backend(String),
}

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;
